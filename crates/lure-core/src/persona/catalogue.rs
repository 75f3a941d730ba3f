//! Built-in persona templates.
//!
//! Provides the read-only catalogue shared by every session and the rule that
//! picks a template from the upstream scam-type tag.

use super::model::{
    AvailabilityProfile, BehaviorPolicy, FamilyRelation, Gender, LinguisticStyle, Persona,
    PersonaFacts, RelationKind, TechSavviness,
};
use crate::temporal::TimeWindow;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// India Standard Time, UTC+05:30.
const IST_OFFSET_MINUTES: i32 = 330;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PersonaTemplate {
    ElderlyRetired,
    MiddleAgedBusiness,
    YoungProfessional,
}

/// Template used for tags missing from `SCAM_TYPE_TEMPLATES`.
const DEFAULT_TEMPLATE: PersonaTemplate = PersonaTemplate::MiddleAgedBusiness;

/// Scam-type tag to template lookup.
const SCAM_TYPE_TEMPLATES: &[(&str, PersonaTemplate)] = &[
    ("bank_fraud", PersonaTemplate::ElderlyRetired),
    ("authority_scam", PersonaTemplate::ElderlyRetired),
    ("government_impersonation_scam", PersonaTemplate::ElderlyRetired),
    ("payment_scam", PersonaTemplate::MiddleAgedBusiness),
    ("credential_phishing", PersonaTemplate::MiddleAgedBusiness),
    ("generic_scam", PersonaTemplate::MiddleAgedBusiness),
    ("investment_scam", PersonaTemplate::YoungProfessional),
    ("job_scam", PersonaTemplate::YoungProfessional),
];

/// Resolves a scam-type tag to a template. Never fails.
///
/// Tags are compared case-insensitively with `-` and spaces treated as `_`.
pub fn template_for_scam_type(scam_type: &str) -> PersonaTemplate {
    let key: String = scam_type
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect();

    SCAM_TYPE_TEMPLATES
        .iter()
        .find(|(tag, _)| *tag == key)
        .map(|(_, template)| *template)
        .unwrap_or(DEFAULT_TEMPLATE)
}

/// Builds the persona for a scam-type tag.
pub fn select_persona(scam_type: &str) -> Persona {
    build_persona(template_for_scam_type(scam_type))
}

/// Returns every catalogue persona, one per template.
pub fn catalogue() -> Vec<Persona> {
    PersonaTemplate::iter().map(build_persona).collect()
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn window(start: (u32, u32), end: (u32, u32)) -> TimeWindow {
    TimeWindow::new(at(start.0, start.1), at(end.0, end.1))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Builds a fresh persona for the given template.
pub fn build_persona(template: PersonaTemplate) -> Persona {
    match template {
        PersonaTemplate::ElderlyRetired => Persona::new(
            template,
            PersonaFacts {
                name: "Shanti Devi".to_string(),
                age: 68,
                gender: Gender::Female,
                location: "Varanasi, Uttar Pradesh".to_string(),
                family: vec![
                    FamilyRelation::deceased(RelationKind::Husband, "husband passed away 5 years ago"),
                    FamilyRelation::living(RelationKind::Son, "2 sons, both work in cities"),
                    FamilyRelation::living(RelationKind::Grandchild, "3 grandchildren"),
                ],
                occupation: "retired school teacher".to_string(),
                backstory: "Lives alone in the family home on a modest pension. Has a smartphone to talk to her grandchildren.".to_string(),
                language_preference: "Hindi-English mix (Hinglish)".to_string(),
            },
            BehaviorPolicy {
                personality: strings(&["trusting", "lonely", "religious", "traditional"]),
                emotional_triggers: strings(&["family concern", "respect for authority", "fear of government"]),
                linguistic_style: LinguisticStyle {
                    formality: "polite, uses 'ji' suffix".to_string(),
                    sentence_structure: "simple, short sentences".to_string(),
                    common_phrases: strings(&["beta", "arre", "kya baat hai", "mujhe samajh nahi aaya"]),
                },
                tech_savviness: TechSavviness::Low,
                response_pattern: "asks many questions, needs step-by-step guidance".to_string(),
                availability: AvailabilityProfile {
                    utc_offset_minutes: IST_OFFSET_MINUTES,
                    wake: at(5, 30),
                    sleep: at(21, 30),
                    meal_windows: vec![window((12, 0), (13, 0))],
                    busy_windows: vec![window((18, 0), (19, 0))],
                },
            },
        ),
        PersonaTemplate::MiddleAgedBusiness => Persona::new(
            template,
            PersonaFacts {
                name: "Rajesh Kumar Sharma".to_string(),
                age: 48,
                gender: Gender::Male,
                location: "Jaipur, Rajasthan".to_string(),
                family: vec![
                    FamilyRelation::living(RelationKind::Wife, "wife Sunita"),
                    FamilyRelation::living(RelationKind::Daughter, "1 daughter in college"),
                    FamilyRelation::living(RelationKind::Son, "1 son in school"),
                ],
                occupation: "small garment shop owner".to_string(),
                backstory: "Has run the family business for 20 years. Keeps several bank accounts for the shop and worries about online fraud.".to_string(),
                language_preference: "Hindi with some English terms".to_string(),
            },
            BehaviorPolicy {
                personality: strings(&["cautious", "busy", "practical", "slightly suspicious"]),
                emotional_triggers: strings(&["business threat", "bank issues", "family safety"]),
                linguistic_style: LinguisticStyle {
                    formality: "semi-formal".to_string(),
                    sentence_structure: "direct, to the point".to_string(),
                    common_phrases: strings(&["dekhiye", "bataiye", "ye kaise hoga", "time nahi hai"]),
                },
                tech_savviness: TechSavviness::Medium,
                response_pattern: "asks for verification, wants quick resolution".to_string(),
                availability: AvailabilityProfile {
                    utc_offset_minutes: IST_OFFSET_MINUTES,
                    wake: at(6, 30),
                    sleep: at(23, 0),
                    meal_windows: vec![window((13, 0), (14, 0))],
                    busy_windows: vec![window((10, 0), (12, 0)), window((15, 0), (18, 0))],
                },
            },
        ),
        PersonaTemplate::YoungProfessional => Persona::new(
            template,
            PersonaFacts {
                name: "Priya Nair".to_string(),
                age: 27,
                gender: Gender::Female,
                location: "Bangalore, Karnataka".to_string(),
                family: vec![FamilyRelation::living(RelationKind::Parent, "parents live in Kerala")],
                occupation: "IT professional at a startup".to_string(),
                backstory: "Works from home, uses UPI daily and has investment accounts. Aware of scams but can be tricked by sophisticated approaches.".to_string(),
                language_preference: "English with occasional Hindi".to_string(),
            },
            BehaviorPolicy {
                personality: strings(&["tech-aware", "busy", "impatient", "somewhat skeptical"]),
                emotional_triggers: strings(&["investment fraud", "job offers", "credit card issues"]),
                linguistic_style: LinguisticStyle {
                    formality: "casual professional".to_string(),
                    sentence_structure: "quick, uses abbreviations".to_string(),
                    common_phrases: strings(&["what's this about?", "can you verify?", "send official email"]),
                },
                tech_savviness: TechSavviness::High,
                response_pattern: "demands proof, checks links carefully".to_string(),
                availability: AvailabilityProfile {
                    utc_offset_minutes: IST_OFFSET_MINUTES,
                    wake: at(7, 30),
                    sleep: at(0, 30),
                    meal_windows: vec![window((13, 0), (14, 0))],
                    busy_windows: vec![window((10, 0), (11, 0)), window((14, 0), (15, 0))],
                },
            },
        ),
    }
}
