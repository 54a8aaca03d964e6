// src/classify.rs
//! Classifier: assigns each surviving item exactly one presentation bucket.
//!
//! Priority order, first match wins:
//! 1. `lab-pulse` for lab-account posts, even when long-form;
//! 2. `deep-dive` for long-form content;
//! 3. `general` otherwise.

use crate::config::QualityFilters;
use crate::item::{Category, ContentItem};
use crate::scoring::QualityScorer;

#[derive(Debug)]
pub struct Classifier<'a> {
    filters: &'a QualityFilters,
}

impl<'a> Classifier<'a> {
    pub fn new(filters: &'a QualityFilters) -> Self {
        Self { filters }
    }

    pub fn category(&self, item: &ContentItem) -> Category {
        if item.is_lab_account {
            return Category::LabPulse;
        }
        if QualityScorer::new(self.filters).is_long_form(item) {
            return Category::DeepDive;
        }
        Category::General
    }

    /// Decorated copy with the category attached.
    pub fn classify(&self, item: ContentItem) -> ContentItem {
        let cat = self.category(&item);
        item.with_category(cat)
    }
}
