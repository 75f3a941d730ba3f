//! Persona consistency check.
//!
//! Scans candidate reply text for explicit contradictions of the persona's
//! static facts. Only literal claim patterns are recognised; paraphrases are
//! out of reach by construction. The check is advisory: it never edits text.

use super::model::{Gender, Persona, PersonaFacts, RelationKind};
use once_cell::sync::Lazy;
use regex::Regex;
use strum::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FactKind {
    Family,
    Gender,
    Age,
    Location,
    Occupation,
}

/// The first contradiction found in a candidate reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{fact}: {detail}")]
pub struct ConsistencyViolation {
    pub fact: FactKind,
    pub detail: String,
}

impl ConsistencyViolation {
    fn new(fact: FactKind, detail: impl Into<String>) -> Self {
        Self {
            fact,
            detail: detail.into(),
        }
    }

    /// Human-readable description of the violated fact.
    pub fn violated_fact(&self) -> &str {
        &self.detail
    }
}

static RELATION_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bmy\s+(?:(late|dear|elder|younger|eldest|youngest|beloved)\s+)?([a-z]+)\b")
        .unwrap()
});

static DEATH_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:passed\s+away|died|late|expired|no\s+more|demise|death)\b").unwrap()
});

static GENDER_CLAIM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:i\s+am|i'm|im|as)\s+an?\s+(man|woman|boy|girl|guy|lady|gentleman)\b")
        .unwrap()
});

static AGE_CLAIMS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:i\s+am|i'm|im)\s+(\d{1,3})\s*(?:years?|yrs?)\b").unwrap(),
        Regex::new(r"(?i)\bmy\s+age\s+is\s+(\d{1,3})\b").unwrap(),
    ]
});

static LOCATION_CLAIMS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bi\s+(?:live|stay|reside)\s+in\s+([a-z]+)").unwrap(),
        Regex::new(r"(?i)\b(?:i\s+am|i'm|im)\s+from\s+([a-z]+)").unwrap(),
    ]
});

static OCCUPATION_CLAIM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bi\s+(?:work|worked|am\s+working)\s+as\s+(?:an?\s+)?([a-z]+)").unwrap()
});

/// Words after "live in" / "from" that do not name a place.
const PLACE_STOPWORDS: &[&str] = &[
    "a", "an", "the", "my", "this", "that", "our", "same", "here", "there", "india", "city",
    "village", "town", "home", "house",
];

/// Checks candidate text against the persona's static facts.
///
/// Returns the first contradiction found, scanning family, gender, age,
/// location and occupation claims in that order.
pub fn validate_consistency(candidate: &str, persona: &Persona) -> Result<(), ConsistencyViolation> {
    let facts = persona.facts();
    check_family(candidate, facts)?;
    check_gender(candidate, facts)?;
    check_age(candidate, facts)?;
    check_location(candidate, facts)?;
    check_occupation(candidate, facts)?;
    Ok(())
}

fn check_family(text: &str, facts: &PersonaFacts) -> Result<(), ConsistencyViolation> {
    for caps in RELATION_MENTION.captures_iter(text) {
        let word = caps[2].to_lowercase();
        let Some(kind) = RelationKind::from_term(&word) else {
            continue;
        };
        match facts.relation(kind) {
            None => {
                return Err(ConsistencyViolation::new(
                    FactKind::Family,
                    format!("mentions 'my {word}' but {} has no {kind}", facts.name),
                ));
            }
            Some(relation) if !relation.living => {
                let marked_late = caps
                    .get(1)
                    .is_some_and(|m| m.as_str().eq_ignore_ascii_case("late"));
                let Some(mention) = caps.get(0) else {
                    continue;
                };
                let clause = clause_around(text, mention.start(), mention.end());
                if !marked_late && !DEATH_MARKERS.is_match(clause) {
                    return Err(ConsistencyViolation::new(
                        FactKind::Family,
                        format!("speaks of {kind} as alive but {}", relation.description),
                    ));
                }
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Clause delimiters bounding where a death marker may qualify a relation.
const CLAUSE_BREAKS: &[char] = &['.', ',', ';', ':', '!', '?', '\n'];

/// The clause of `text` containing the byte range `start..end`.
fn clause_around(text: &str, start: usize, end: usize) -> &str {
    let from = text[..start]
        .rfind(CLAUSE_BREAKS)
        .map_or(0, |i| i + 1);
    let to = text[end..]
        .find(CLAUSE_BREAKS)
        .map_or(text.len(), |i| end + i);
    &text[from..to]
}

fn check_gender(text: &str, facts: &PersonaFacts) -> Result<(), ConsistencyViolation> {
    for caps in GENDER_CLAIM.captures_iter(text) {
        let word = caps[1].to_lowercase();
        let claimed = match word.as_str() {
            "woman" | "girl" | "lady" => Gender::Female,
            _ => Gender::Male,
        };
        if claimed != facts.gender {
            return Err(ConsistencyViolation::new(
                FactKind::Gender,
                format!("claims to be a {word} but persona is {}", facts.gender),
            ));
        }
    }
    Ok(())
}

fn check_age(text: &str, facts: &PersonaFacts) -> Result<(), ConsistencyViolation> {
    for pattern in AGE_CLAIMS.iter() {
        for caps in pattern.captures_iter(text) {
            let Ok(claimed) = caps[1].parse::<u16>() else {
                continue;
            };
            if claimed != u16::from(facts.age) {
                return Err(ConsistencyViolation::new(
                    FactKind::Age,
                    format!("claims age {claimed} but persona is {}", facts.age),
                ));
            }
        }
    }
    Ok(())
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn check_location(text: &str, facts: &PersonaFacts) -> Result<(), ConsistencyViolation> {
    let known = tokens(&facts.location);
    for pattern in LOCATION_CLAIMS.iter() {
        for caps in pattern.captures_iter(text) {
            let place = caps[1].to_lowercase();
            if PLACE_STOPWORDS.contains(&place.as_str()) || known.contains(&place) {
                continue;
            }
            return Err(ConsistencyViolation::new(
                FactKind::Location,
                format!("claims to live in '{place}' but persona lives in {}", facts.location),
            ));
        }
    }
    Ok(())
}

fn check_occupation(text: &str, facts: &PersonaFacts) -> Result<(), ConsistencyViolation> {
    let known = tokens(&facts.occupation);
    for caps in OCCUPATION_CLAIM.captures_iter(text) {
        let role = caps[1].to_lowercase();
        if !known.contains(&role) {
            return Err(ConsistencyViolation::new(
                FactKind::Occupation,
                format!("claims to work as '{role}' but persona is a {}", facts.occupation),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{PersonaTemplate, build_persona};
    use strum::IntoEnumIterator;

    fn elderly() -> Persona {
        build_persona(PersonaTemplate::ElderlyRetired)
    }

    #[test]
    fn test_plain_reply_is_consistent() {
        let persona = elderly();
        assert!(validate_consistency("Arre beta, mujhe samajh nahi aaya. Kaun bol raha hai?", &persona).is_ok());
        assert!(validate_consistency("My son will call you back tomorrow", &persona).is_ok());
    }

    #[test]
    fn test_every_absent_relation_is_rejected() {
        for template in PersonaTemplate::iter() {
            let persona = build_persona(template);
            for kind in persona.facts().absent_relations() {
                for term in kind.terms() {
                    let text = format!("Let me ask my {term} first.");
                    let err = validate_consistency(&text, &persona)
                        .expect_err("absent relation should be rejected");
                    assert_eq!(err.fact, FactKind::Family, "{template} / {term}");
                }
            }
        }
    }

    #[test]
    fn test_deceased_spouse_spoken_of_as_alive() {
        let persona = elderly();
        let err = validate_consistency("My husband handles the bank work", &persona).unwrap_err();
        assert_eq!(err.fact, FactKind::Family);
        assert!(err.violated_fact().contains("passed away"));

        assert!(validate_consistency("My late husband handled the bank work", &persona).is_ok());
        assert!(validate_consistency("My husband passed away, I do it alone now", &persona).is_ok());
    }

    #[test]
    fn test_unrelated_death_word_does_not_excuse_living_mention() {
        let persona = elderly();
        for text in [
            "Sorry for the late reply, my husband will send the money",
            "My OTP expired, my husband will send the money",
            "My husband will send it. The offer expired anyway",
        ] {
            let err = validate_consistency(text, &persona).expect_err(text);
            assert_eq!(err.fact, FactKind::Family, "{text}");
        }
        assert!(validate_consistency("Beta, my husband died in 2019; I manage alone", &persona).is_ok());
    }

    #[test]
    fn test_clause_around_match() {
        let text = "Sorry for the late reply, my husband will send it. Ok?";
        let start = text.find("my husband").unwrap();
        let clause = clause_around(text, start, start + "my husband".len());
        assert_eq!(clause, " my husband will send it");
    }

    #[test]
    fn test_gender_claim() {
        let persona = elderly();
        let err = validate_consistency("I am a man of my word", &persona).unwrap_err();
        assert_eq!(err.fact, FactKind::Gender);
        assert!(validate_consistency("I am a woman living alone", &persona).is_ok());
    }

    #[test]
    fn test_age_claim() {
        let persona = elderly();
        let err = validate_consistency("I'm 30 years old, I know these apps", &persona).unwrap_err();
        assert_eq!(err.fact, FactKind::Age);
        assert!(validate_consistency("I am 68 years old beta", &persona).is_ok());
        assert!(validate_consistency("my age is 41", &persona).is_err());
    }

    #[test]
    fn test_location_claim() {
        let persona = elderly();
        let err = validate_consistency("I live in Mumbai near the station", &persona).unwrap_err();
        assert_eq!(err.fact, FactKind::Location);
        assert!(validate_consistency("I live in Varanasi only", &persona).is_ok());
        assert!(validate_consistency("I live in a small house", &persona).is_ok());
    }

    #[test]
    fn test_occupation_claim() {
        let persona = elderly();
        assert!(validate_consistency("I worked as a teacher for 30 years", &persona).is_ok());
        let err = validate_consistency("I work as an engineer", &persona).unwrap_err();
        assert_eq!(err.fact, FactKind::Occupation);
    }
}
