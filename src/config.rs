// src/config.rs
//! Pipeline configuration: topics, accounts, quality filters, run parameters.
//!
//! Loaded once at startup from TOML and passed by reference into every
//! component constructor; no component reads ambient state after this point.
//! Path resolution mirrors the usual env-then-default scheme:
//! `$RESEARCH_CONFIG_PATH`, falling back to `config/pipeline.toml`.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::PipelineError;

pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";
pub const ENV_CONFIG_PATH: &str = "RESEARCH_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub run: RunParams,
    #[serde(default)]
    pub topics: Vec<TopicConfig>,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub quality_filters: QualityFilters,
}

/// A research topic track. Topics are processed in configured order, which
/// the cross-deduplicator depends on.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicConfig {
    pub slug: String,
    pub display_name: String,
    /// Score multiplier applied after all bonuses.
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub search_queries: Vec<String>,
}

fn default_weight() -> f64 {
    1.0
}

impl TopicConfig {
    /// Single search string for a fetch call: quoted queries joined with OR,
    /// falling back to the display name.
    pub fn combined_query(&self) -> String {
        if self.search_queries.is_empty() {
            return self.display_name.clone();
        }
        self.search_queries
            .iter()
            .map(|q| format!("\"{}\"", q))
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

/// A must-follow account, curated out-of-band by the operator.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub handle: String,
    #[serde(default = "default_group")]
    pub group: String,
    /// `true`: dedicated fetch call; `false`: batched with the rest of its group.
    #[serde(default)]
    pub solo: bool,
}

fn default_group() -> String {
    "Other".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct QualityFilters {
    #[serde(default)]
    pub min_engagement: MinEngagement,
    #[serde(default = "default_long_form_min_chars")]
    pub long_form_min_chars: usize,
    #[serde(default)]
    pub long_form_bonus: f64,
    #[serde(default)]
    pub priority_account_bonus: f64,
    /// Domains that count as long-form regardless of body length.
    #[serde(default)]
    pub article_domains: Vec<String>,
    /// Priority handles (engagement-floor bypass + score bonus).
    #[serde(default)]
    pub priority_accounts: Vec<String>,
    /// Lab handles (lab-pulse classification + floor bypass), keyed by lab name.
    #[serde(default)]
    pub lab_accounts: std::collections::BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub spam_detection: SpamDetection,
}

fn default_long_form_min_chars() -> usize {
    400
}

// A missing `[quality_filters]` table must yield the same values as an empty
// one, so `Default` mirrors the serde field defaults instead of deriving.
impl Default for QualityFilters {
    fn default() -> Self {
        Self {
            min_engagement: MinEngagement::default(),
            long_form_min_chars: default_long_form_min_chars(),
            long_form_bonus: 0.0,
            priority_account_bonus: 0.0,
            article_domains: Vec::new(),
            priority_accounts: Vec::new(),
            lab_accounts: std::collections::BTreeMap::new(),
            spam_detection: SpamDetection::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MinEngagement {
    /// Reddit items below this `score` are dropped before scoring.
    #[serde(default)]
    pub reddit_score: i64,
    /// X items below this `likes` count are dropped before scoring.
    #[serde(default)]
    pub x_likes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpamDetection {
    #[serde(default)]
    pub enabled: bool,
    /// Claim/link mismatch family toggle.
    #[serde(default = "default_true")]
    pub claim_link_enabled: bool,
    #[serde(default)]
    pub claim_link_mismatch: Vec<ClaimLinkPattern>,
    /// Low-effort family toggle.
    #[serde(default = "default_true")]
    pub low_effort_enabled: bool,
    /// Body-length floor for the low-effort family.
    #[serde(default = "default_low_effort_min_chars")]
    pub low_effort_min_chars: usize,
    /// Clickbait title templates (regex).
    #[serde(default)]
    pub low_effort_patterns: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_low_effort_min_chars() -> usize {
    80
}

impl Default for SpamDetection {
    fn default() -> Self {
        Self {
            enabled: false,
            claim_link_enabled: default_true(),
            claim_link_mismatch: Vec::new(),
            low_effort_enabled: default_true(),
            low_effort_min_chars: default_low_effort_min_chars(),
            low_effort_patterns: Vec::new(),
        }
    }
}

/// Title promises authoritative content; the link must back it up.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimLinkPattern {
    pub claim_regex: String,
    pub link_must_contain: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunParams {
    /// Root of the note corpus on disk.
    pub corpus_path: PathBuf,
    #[serde(default = "default_dailies_folder")]
    pub dailies_folder: String,
    #[serde(default = "default_library_folder")]
    pub library_folder: String,
    /// Append-only feedback log (JSON lines), relative to the corpus root.
    #[serde(default = "default_feedback_path")]
    pub feedback_path: String,
    #[serde(default = "default_items_per_topic")]
    pub items_per_topic: usize,
    #[serde(default = "default_reading_list_max")]
    pub reading_list_max: usize,
}

fn default_dailies_folder() -> String {
    "Research/Dailies".to_string()
}
fn default_library_folder() -> String {
    "Research/Library".to_string()
}
fn default_feedback_path() -> String {
    "Research/feedback.jsonl".to_string()
}
fn default_items_per_topic() -> usize {
    8
}
fn default_reading_list_max() -> usize {
    15
}

impl PipelineConfig {
    /// Load using `$RESEARCH_CONFIG_PATH` or the default path.
    pub fn load_default() -> Result<Self, PipelineError> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, PipelineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigValidation(format!("reading {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, PipelineError> {
        let cfg: PipelineConfig =
            toml::from_str(s).map_err(|e| PipelineError::ConfigValidation(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Startup validation; every failure here is fatal before anything runs.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut slugs = BTreeSet::new();
        for t in &self.topics {
            if t.slug.trim().is_empty() {
                return Err(PipelineError::ConfigValidation("topic with empty slug".into()));
            }
            if !slugs.insert(t.slug.as_str()) {
                return Err(PipelineError::ConfigValidation(format!(
                    "duplicate topic slug `{}`",
                    t.slug
                )));
            }
            if !t.weight.is_finite() || t.weight <= 0.0 {
                return Err(PipelineError::ConfigValidation(format!(
                    "topic `{}` has non-positive weight {}",
                    t.slug, t.weight
                )));
            }
        }
        for a in &self.accounts {
            if a.handle.trim().is_empty() {
                return Err(PipelineError::ConfigValidation(
                    "must-follow account with empty handle".into(),
                ));
            }
        }
        if self.run.items_per_topic == 0 {
            return Err(PipelineError::ConfigValidation(
                "run.items_per_topic must be at least 1".into(),
            ));
        }
        if self.run.reading_list_max == 0 {
            return Err(PipelineError::ConfigValidation(
                "run.reading_list_max must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn topic(&self, slug: &str) -> Option<&TopicConfig> {
        self.topics.iter().find(|t| t.slug == slug)
    }

    /// Reduce the topic list to a single slug (single-topic run mode).
    pub fn restrict_to_topic(&mut self, slug: &str) -> Result<(), PipelineError> {
        if self.topic(slug).is_none() {
            let known: Vec<&str> = self.topics.iter().map(|t| t.slug.as_str()).collect();
            return Err(PipelineError::ConfigValidation(format!(
                "unknown topic `{}` (known: {})",
                slug,
                known.join(", ")
            )));
        }
        self.topics.retain(|t| t.slug == slug);
        Ok(())
    }
}

impl QualityFilters {
    pub fn is_priority_handle(&self, handle: &str) -> bool {
        self.priority_accounts
            .iter()
            .any(|h| h.trim_start_matches('@').eq_ignore_ascii_case(handle))
    }

    pub fn is_lab_handle(&self, handle: &str) -> bool {
        self.lab_accounts.values().flatten().any(|h| {
            h.trim_start_matches('@').eq_ignore_ascii_case(handle)
        })
    }

    pub fn is_article_domain(&self, url: &str) -> bool {
        let lower = url.to_ascii_lowercase();
        self.article_domains
            .iter()
            .any(|d| lower.contains(&d.to_ascii_lowercase()))
    }
}
