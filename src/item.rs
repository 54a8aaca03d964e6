// src/item.rs
//! Core item types flowing through the pipeline.
//!
//! A `RawItem` is whatever a fetch provider hands back. The orchestrator turns
//! it into a `ContentItem`, which is then *decorated* through the stages:
//! spam check, scoring and classification each produce a new copy instead of
//! mutating in place.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an item was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Reddit,
    X,
    Web,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Reddit => "reddit",
            Source::X => "x",
            Source::Web => "web",
        }
    }
}

/// Engagement metrics as reported by the source. An absent metric means
/// "unknown", which is deliberately distinct from zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement(BTreeMap<String, i64>);

impl Engagement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, metric: &str, value: i64) -> Self {
        self.0.insert(metric.to_string(), value);
        self
    }

    /// Look up a metric; `None` means the source did not report it.
    pub fn metric(&self, name: &str) -> Option<i64> {
        self.0.get(name).copied()
    }

    /// True when the source reported no metrics at all.
    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }
}

/// An item as returned by a fetch provider, before pipeline decoration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawItem {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub engagement: Engagement,
    /// Text payload; empty string if the source exposes none.
    #[serde(default)]
    pub body: String,
}

/// Presentation bucket assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    LabPulse,
    DeepDive,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::LabPulse => "lab-pulse",
            Category::DeepDive => "deep-dive",
            Category::General => "general",
        }
    }
}

/// One piece of discovered content, decorated as it moves through the stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub source: Source,
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub engagement: Engagement,
    /// Character count of the item's text payload (0 if unknown).
    pub body_length: usize,
    /// Which configured topic produced it; empty for must-follow items.
    pub topic_slug: String,
    pub is_priority_account: bool,
    pub is_lab_account: bool,
    /// Set by the quality scorer.
    pub score: Option<f64>,
    /// Set by the classifier.
    pub category: Option<Category>,
    /// Set by the spam filter.
    pub spam_flag: Option<bool>,
}

impl ContentItem {
    pub fn from_raw(raw: RawItem, source: Source, topic_slug: &str) -> Self {
        Self {
            source,
            body_length: raw.body.chars().count(),
            url: raw.url,
            title: raw.title,
            author: raw.author,
            published_at: raw.published_at,
            engagement: raw.engagement,
            topic_slug: topic_slug.to_string(),
            is_priority_account: false,
            is_lab_account: false,
            score: None,
            category: None,
            spam_flag: None,
        }
    }

    pub fn with_account_flags(mut self, priority: bool, lab: bool) -> Self {
        self.is_priority_account = priority;
        self.is_lab_account = lab;
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_spam_flag(mut self, spam: bool) -> Self {
        self.spam_flag = Some(spam);
        self
    }

    /// Author handle lowered for account-list matching.
    pub fn author_handle(&self) -> Option<String> {
        self.author
            .as_deref()
            .map(|a| a.trim_start_matches('@').to_ascii_lowercase())
    }
}
