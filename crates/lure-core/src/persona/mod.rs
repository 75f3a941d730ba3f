//! Persona domain module.
//!
//! This module contains the synthetic identities the engagement speaks as,
//! the static catalogue they are drawn from, and the consistency check applied
//! to every candidate reply.
//!
//! # Module Structure
//!
//! - `model`: Immutable fact set (`PersonaFacts`), replaceable behaviour policy
//!   (`BehaviorPolicy`), and the composed `Persona`
//! - `catalogue`: Built-in templates and the scam-type selection rule
//! - `consistency`: Contradiction scan of candidate text against persona facts
//!
//! # Usage
//!
//! ```ignore
//! use lure_core::persona::{select_persona, validate_consistency};
//! ```

mod catalogue;
mod consistency;
mod model;

// Re-export public API
pub use catalogue::{PersonaTemplate, build_persona, catalogue, select_persona, template_for_scam_type};
pub use consistency::{ConsistencyViolation, FactKind, validate_consistency};
pub use model::{
    AvailabilityProfile, BehaviorPolicy, FamilyRelation, Gender, LinguisticStyle,
    MAX_TECH_MULTIPLIER, MIN_TECH_MULTIPLIER, Persona, PersonaFacts, RelationKind, TechSavviness,
};
