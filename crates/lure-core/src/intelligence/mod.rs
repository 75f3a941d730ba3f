//! Intelligence extraction and per-session evidence store.
//!
//! # Module Structure
//!
//! - `category`: Evidence categories and their fixed confidence weights
//! - `extractor`: Pattern matchers over adversary text and key normalization
//! - `store`: Append-only, deduplicated per-session collection
//! - `cues`: Behaviour cue tallies used for the report's narrative summary

mod category;
mod cues;
mod extractor;
mod store;

pub use category::{COMPLETENESS_CATEGORIES, HIGH_VALUE_CATEGORIES, IntelCategory};
pub use cues::{BehaviorCue, CueTally, tally_cues};
pub use extractor::{ExtractedItem, extract, normalize};
pub use store::{IntelligenceItem, IntelligenceStore};
