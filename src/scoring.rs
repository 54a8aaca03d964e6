// src/scoring.rs
//! Quality scorer: an additive point system over an item's own fields plus
//! static configuration. Pure and deterministic; no external state.
//!
//! Order of operations per item:
//! 1. engagement floor gate (drop, not score-low),
//! 2. long-form bonus,
//! 3. priority-account bonus,
//! 4. multiply by topic weight.

use std::cmp::Ordering;

use crate::config::QualityFilters;
use crate::item::{ContentItem, Source};

#[derive(Debug)]
pub struct QualityScorer<'a> {
    filters: &'a QualityFilters,
}

/// Outcome of the floor gate + scoring for one item.
#[derive(Debug)]
pub enum ScoreOutcome {
    Scored(ContentItem),
    /// Dropped at the engagement floor; never enters the ranked output.
    BelowFloor,
}

impl<'a> QualityScorer<'a> {
    pub fn new(filters: &'a QualityFilters) -> Self {
        Self { filters }
    }

    /// Gate and score one item, returning a decorated copy.
    pub fn score(&self, item: ContentItem, topic_weight: f64) -> ScoreOutcome {
        if !self.passes_floor(&item) {
            return ScoreOutcome::BelowFloor;
        }
        ScoreOutcome::Scored(self.score_ungated(item, topic_weight))
    }

    /// Score without the floor gate (the must-follow track keeps every item).
    pub fn score_ungated(&self, item: ContentItem, topic_weight: f64) -> ContentItem {
        let mut score = 0.0;
        if self.is_long_form(&item) {
            score += self.filters.long_form_bonus;
        }
        if item.is_priority_account {
            score += self.filters.priority_account_bonus;
        }
        score *= topic_weight;
        item.with_score(score)
    }

    /// Source-specific engagement floor. Priority and lab accounts always
    /// pass, and so do items whose metric is absent; only an explicit count
    /// below the floor drops.
    pub fn passes_floor(&self, item: &ContentItem) -> bool {
        if item.is_priority_account || item.is_lab_account {
            return true;
        }
        let (metric, floor) = match item.source {
            Source::Reddit => ("score", self.filters.min_engagement.reddit_score),
            Source::X => ("likes", self.filters.min_engagement.x_likes),
            Source::Web => return true,
        };
        if floor <= 0 {
            return true;
        }
        match item.engagement.metric(metric) {
            Some(v) => v >= floor,
            None => true,
        }
    }

    /// Long-form condition: body length over the threshold, or a recognized
    /// article domain. Shared with the classifier's deep-dive rule.
    pub fn is_long_form(&self, item: &ContentItem) -> bool {
        item.body_length >= self.filters.long_form_min_chars
            || self.filters.is_article_domain(&item.url)
    }
}

/// Final ranking: score descending; ties broken by more recent
/// `published_at`; items without a timestamp keep their input order
/// (stable sort, no randomness).
pub fn rank(items: &mut [ContentItem]) {
    items.sort_by(|a, b| {
        let sa = a.score.unwrap_or(0.0);
        let sb = b.score.unwrap_or(0.0);
        match sb.partial_cmp(&sa).unwrap_or(Ordering::Equal) {
            Ordering::Equal => match (&b.published_at, &a.published_at) {
                (Some(tb), Some(ta)) => tb.cmp(ta),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            },
            other => other,
        }
    });
}
