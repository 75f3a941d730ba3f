//! Persona domain model.
//!
//! A persona is two composed value objects: the static facts, shared behind an
//! `Arc` and never handed out mutably, and the behaviour policy, which can be
//! swapped wholesale by building a new `Persona`.

use super::catalogue::PersonaTemplate;
use crate::temporal::TimeWindow;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use strum::{Display, EnumIter};

/// Lower bound of the tech-savviness delay multiplier.
pub const MIN_TECH_MULTIPLIER: f64 = 0.7;
/// Upper bound of the tech-savviness delay multiplier.
pub const MAX_TECH_MULTIPLIER: f64 = 1.5;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

/// Family relations a persona may or may not have.
///
/// The set is closed so that every relation missing from a persona's family
/// is an enumerable contradiction source.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RelationKind {
    Husband,
    Wife,
    Son,
    Daughter,
    Grandchild,
    Parent,
    Sibling,
}

impl RelationKind {
    /// Words that refer to this relation when preceded by "my".
    pub fn terms(self) -> &'static [&'static str] {
        match self {
            RelationKind::Husband => &["husband"],
            RelationKind::Wife => &["wife"],
            RelationKind::Son => &["son", "sons"],
            RelationKind::Daughter => &["daughter", "daughters"],
            RelationKind::Grandchild => &[
                "grandson",
                "grandsons",
                "granddaughter",
                "granddaughters",
                "grandchild",
                "grandchildren",
            ],
            RelationKind::Parent => &["mother", "father", "parents", "mom", "dad", "mummy", "papa"],
            RelationKind::Sibling => &["brother", "brothers", "sister", "sisters", "siblings"],
        }
    }

    /// Maps a lower-cased word back to its relation.
    pub fn from_term(word: &str) -> Option<Self> {
        use strum::IntoEnumIterator;
        RelationKind::iter().find(|kind| kind.terms().contains(&word))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FamilyRelation {
    pub kind: RelationKind,
    /// Free-form description handed to the reply generator
    pub description: String,
    pub living: bool,
}

impl FamilyRelation {
    pub fn living(kind: RelationKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            living: true,
        }
    }

    pub fn deceased(kind: RelationKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            living: false,
        }
    }
}

/// Immutable facts about a persona.
///
/// Only ever reachable through `Persona::facts`, which hands out a shared
/// reference; the consistency check scans exactly these fields.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PersonaFacts {
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    pub location: String,
    pub family: Vec<FamilyRelation>,
    pub occupation: String,
    pub backstory: String,
    pub language_preference: String,
}

impl PersonaFacts {
    /// Looks up the persona's relation of the given kind, if any.
    pub fn relation(&self, kind: RelationKind) -> Option<&FamilyRelation> {
        self.family.iter().find(|relation| relation.kind == kind)
    }

    /// Relations this persona does not have.
    pub fn absent_relations(&self) -> Vec<RelationKind> {
        use strum::IntoEnumIterator;
        RelationKind::iter()
            .filter(|kind| self.relation(*kind).is_none())
            .collect()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TechSavviness {
    Low,
    Medium,
    High,
}

impl TechSavviness {
    /// Reply delay multiplier, within `[MIN_TECH_MULTIPLIER, MAX_TECH_MULTIPLIER]`.
    pub fn multiplier(self) -> f64 {
        match self {
            TechSavviness::Low => MAX_TECH_MULTIPLIER,
            TechSavviness::Medium => 1.0,
            TechSavviness::High => MIN_TECH_MULTIPLIER,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LinguisticStyle {
    pub formality: String,
    pub sentence_structure: String,
    pub common_phrases: Vec<String>,
}

/// Daily routine of a persona, in the persona's local time.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityProfile {
    /// Offset of the persona's local time from UTC
    pub utc_offset_minutes: i32,
    pub wake: NaiveTime,
    pub sleep: NaiveTime,
    #[serde(default)]
    pub meal_windows: Vec<TimeWindow>,
    #[serde(default)]
    pub busy_windows: Vec<TimeWindow>,
}

impl AvailabilityProfile {
    /// The sleep window runs from `sleep` until `wake`, wrapping midnight.
    pub fn sleep_window(&self) -> TimeWindow {
        TimeWindow::new(self.sleep, self.wake)
    }
}

/// Replaceable behaviour of a persona.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BehaviorPolicy {
    pub personality: Vec<String>,
    pub emotional_triggers: Vec<String>,
    pub linguistic_style: LinguisticStyle,
    pub tech_savviness: TechSavviness,
    pub response_pattern: String,
    pub availability: AvailabilityProfile,
}

/// A synthetic identity: immutable facts plus a behaviour policy.
#[derive(Debug, Clone)]
pub struct Persona {
    template: PersonaTemplate,
    facts: Arc<PersonaFacts>,
    policy: BehaviorPolicy,
}

impl Persona {
    pub fn new(template: PersonaTemplate, facts: PersonaFacts, policy: BehaviorPolicy) -> Self {
        Self {
            template,
            facts: Arc::new(facts),
            policy,
        }
    }

    pub fn template(&self) -> PersonaTemplate {
        self.template
    }

    pub fn facts(&self) -> &PersonaFacts {
        &self.facts
    }

    pub fn policy(&self) -> &BehaviorPolicy {
        &self.policy
    }

    pub fn name(&self) -> &str {
        &self.facts.name
    }

    pub fn tech_multiplier(&self) -> f64 {
        self.policy.tech_savviness.multiplier()
    }

    /// Returns a persona with the same facts and a different behaviour policy.
    ///
    /// The facts are shared, not copied; two personas produced this way compare
    /// equal on `same_identity`.
    pub fn with_policy(&self, policy: BehaviorPolicy) -> Self {
        Self {
            template: self.template,
            facts: Arc::clone(&self.facts),
            policy,
        }
    }

    pub fn same_identity(&self, other: &Persona) -> bool {
        Arc::ptr_eq(&self.facts, &other.facts)
    }

    /// Renders the persona profile handed to the reply generator.
    pub fn render_profile(&self) -> String {
        let facts = &self.facts;
        let policy = &self.policy;
        let family = facts
            .family
            .iter()
            .map(|relation| format!("{}: {}", relation.kind, relation.description))
            .collect::<Vec<_>>()
            .join("; ");

        let mut out = String::new();
        let _ = writeln!(out, "PERSONA PROFILE:");
        let _ = writeln!(out, "- Name: {}", facts.name);
        let _ = writeln!(out, "- Age: {} years old", facts.age);
        let _ = writeln!(out, "- Gender: {}", facts.gender);
        let _ = writeln!(out, "- Location: {}", facts.location);
        let _ = writeln!(out, "- Occupation: {}", facts.occupation);
        let _ = writeln!(out, "- Family: {}", if family.is_empty() { "none" } else { &family });
        let _ = writeln!(out, "- Background: {}", facts.backstory);
        let _ = writeln!(out, "- Language: {}", facts.language_preference);
        let _ = writeln!(out);
        let _ = writeln!(out, "BEHAVIORAL TRAITS:");
        let _ = writeln!(out, "- Personality: {}", policy.personality.join(", "));
        let _ = writeln!(out, "- Tech savviness: {}", policy.tech_savviness);
        let _ = writeln!(out, "- Emotional triggers: {}", policy.emotional_triggers.join(", "));
        let _ = writeln!(out, "- Speaking style: {}", policy.linguistic_style.formality);
        let _ = writeln!(
            out,
            "- Common phrases: {}",
            policy.linguistic_style.common_phrases.join(", ")
        );
        let _ = write!(out, "- Response pattern: {}", policy.response_pattern);
        out
    }
}
