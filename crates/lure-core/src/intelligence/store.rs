use super::category::{COMPLETENESS_CATEGORIES, IntelCategory};
use super::extractor::ExtractedItem;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A stored piece of evidence.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntelligenceItem {
    pub category: IntelCategory,
    /// Normalized value, the deduplication key within the category
    pub value: String,
    pub raw: String,
    pub confidence: f64,
    pub first_seen_turn: u32,
}

/// Append-only evidence collection for one session.
///
/// Items are keyed by `(category, normalized value)`. A repeated key is
/// discarded without touching the stored item, and nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct IntelligenceStore {
    items: Vec<IntelligenceItem>,
    keys: HashSet<(IntelCategory, String)>,
}

impl IntelligenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts unseen items and returns the ones that were new.
    pub fn add<I>(&mut self, extracted: I, turn: u32) -> Vec<IntelligenceItem>
    where
        I: IntoIterator<Item = ExtractedItem>,
    {
        let mut inserted = Vec::new();
        for item in extracted {
            let value = item.key();
            if !self.keys.insert((item.category, value.clone())) {
                continue;
            }
            let stored = IntelligenceItem {
                category: item.category,
                value,
                raw: item.raw,
                confidence: item.category.confidence(),
                first_seen_turn: turn,
            };
            self.items.push(stored.clone());
            inserted.push(stored);
        }
        inserted
    }

    pub fn items(&self) -> &[IntelligenceItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_category(&self, category: IntelCategory) -> bool {
        self.items.iter().any(|item| item.category == category)
    }

    pub fn has_high_value(&self) -> bool {
        self.items.iter().any(|item| item.category.is_high_value())
    }

    /// Fraction of the completeness categories holding at least one item.
    pub fn completeness_score(&self) -> f64 {
        let populated = COMPLETENESS_CATEGORIES
            .iter()
            .filter(|category| self.has_category(**category))
            .count();
        populated as f64 / COMPLETENESS_CATEGORIES.len() as f64
    }

    /// Mean confidence over every stored item, `0.0` when empty.
    pub fn average_confidence(&self) -> f64 {
        if self.items.is_empty() {
            return 0.0;
        }
        self.items.iter().map(|item| item.confidence).sum::<f64>() / self.items.len() as f64
    }

    /// Items grouped by category, each group in insertion order.
    pub fn by_category(&self) -> BTreeMap<IntelCategory, Vec<IntelligenceItem>> {
        let mut grouped: BTreeMap<IntelCategory, Vec<IntelligenceItem>> = BTreeMap::new();
        for item in &self.items {
            grouped.entry(item.category).or_default().push(item.clone());
        }
        grouped
    }
}
