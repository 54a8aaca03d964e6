// src/scan.rs
//! Topic orchestrator: drives the per-topic fetch → spam-filter → score →
//! classify pipeline, plus the unfiltered must-follow track.
//!
//! Per-topic fetches share no mutable state and run concurrently, one task
//! per topic plus one for must-follow. Cross-topic dedup is order-dependent
//! and happens later, behind a sequential barrier in the run coordinator.

use std::collections::BTreeMap;
use std::sync::Arc;

use ::metrics::counter;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::classify::Classifier;
use crate::config::{AccountConfig, PipelineConfig, TopicConfig};
use crate::error::PipelineError;
use crate::fetch::FetchProvider;
use crate::item::{ContentItem, Source};
use crate::metrics;
use crate::scoring::{QualityScorer, ScoreOutcome};
use crate::spam::SpamFilter;

/// Track label for must-follow items in scan results (their items carry an
/// empty `topic_slug`).
pub const MUST_FOLLOW_TRACK: &str = "must-follow";

/// Outcome of scanning one topic (or the must-follow track).
#[derive(Debug, Default)]
pub struct TopicScan {
    pub track: String,
    pub fetched: usize,
    pub spam_dropped: usize,
    pub floor_dropped: usize,
    pub errors: Vec<String>,
    pub items: Vec<ContentItem>,
}

impl TopicScan {
    /// A track failed when every fetch errored and nothing came back.
    pub fn failed(&self) -> bool {
        self.fetched == 0 && !self.errors.is_empty()
    }
}

/// Shared immutable stage state handed to every scan task.
pub struct ScanContext {
    pub cfg: PipelineConfig,
    pub spam: SpamFilter,
}

impl ScanContext {
    pub fn new(cfg: PipelineConfig) -> Result<Self, PipelineError> {
        let spam = SpamFilter::from_config(&cfg.quality_filters.spam_detection)?;
        Ok(Self { cfg, spam })
    }

    fn decorate(&self, item: ContentItem) -> ContentItem {
        let (priority, lab) = match item.author_handle() {
            Some(h) => (
                self.cfg.quality_filters.is_priority_handle(&h),
                self.cfg.quality_filters.is_lab_handle(&h),
            ),
            None => (false, false),
        };
        item.with_account_flags(priority, lab)
    }
}

/// Run all configured topic scans plus the must-follow track concurrently.
/// Results come back in configured topic order, must-follow last.
pub async fn run_scans(
    ctx: Arc<ScanContext>,
    providers: Arc<Vec<Arc<dyn FetchProvider>>>,
) -> Result<Vec<TopicScan>, PipelineError> {
    metrics::ensure_described();
    if providers.is_empty() {
        return Err(PipelineError::FetchFailure {
            topic: "*".into(),
            reason: "no fetch providers configured".into(),
        });
    }

    let mut set = JoinSet::new();
    for (order, topic) in ctx.cfg.topics.iter().cloned().enumerate() {
        let ctx = Arc::clone(&ctx);
        let providers = Arc::clone(&providers);
        set.spawn(async move { (order, scan_topic(&ctx, &topic, &providers).await) });
    }
    let mf_order = ctx.cfg.topics.len();
    {
        let ctx = Arc::clone(&ctx);
        let providers = Arc::clone(&providers);
        set.spawn(async move { (mf_order, scan_must_follow(&ctx, &providers).await) });
    }

    let mut by_order: BTreeMap<usize, TopicScan> = BTreeMap::new();
    while let Some(joined) = set.join_next().await {
        let (order, scan) = joined.map_err(|e| PipelineError::FetchFailure {
            topic: "*".into(),
            reason: format!("scan task panicked: {}", e),
        })?;
        by_order.insert(order, scan);
    }

    let scans: Vec<TopicScan> = by_order.into_values().collect();
    if scans.iter().all(|s| s.failed()) {
        return Err(PipelineError::FetchFailure {
            topic: "*".into(),
            reason: "every topic and the must-follow track failed".into(),
        });
    }
    Ok(scans)
}

/// Scan a single topic: fetch from every provider, then spam-filter, gate,
/// score and classify. A failing provider logs and contributes zero items.
pub async fn scan_topic(
    ctx: &ScanContext,
    topic: &TopicConfig,
    providers: &[Arc<dyn FetchProvider>],
) -> TopicScan {
    let mut scan = TopicScan {
        track: topic.slug.clone(),
        ..Default::default()
    };
    let query = topic.combined_query();
    let limit = ctx.cfg.run.items_per_topic;

    let mut raw_items = Vec::new();
    for p in providers {
        match p.search(&query, limit).await {
            Ok(items) => {
                for raw in items {
                    raw_items.push((p.source(), raw));
                }
            }
            Err(e) => {
                warn!(topic = %topic.slug, provider = p.name(), error = %e, "fetch failed");
                counter!(metrics::FETCH_ERRORS_TOTAL).increment(1);
                scan.errors.push(format!("{}/{}: {}", p.name(), topic.slug, e));
            }
        }
    }
    // The per-topic bound spans all providers combined.
    raw_items.truncate(limit);
    scan.fetched = raw_items.len();
    counter!(metrics::SCAN_FETCHED_TOTAL).increment(raw_items.len() as u64);

    let scorer = QualityScorer::new(&ctx.cfg.quality_filters);
    let classifier = Classifier::new(&ctx.cfg.quality_filters);

    for (source, raw) in raw_items {
        let item = ctx.decorate(ContentItem::from_raw(raw, source, &topic.slug));

        let verdict = ctx.spam.classify(&item);
        if verdict.is_spam {
            info!(topic = %topic.slug, url = %item.url, reason = ?verdict.reason, "spam dropped");
            counter!(metrics::SCAN_SPAM_TOTAL).increment(1);
            scan.spam_dropped += 1;
            continue;
        }
        let item = item.with_spam_flag(false);

        match scorer.score(item, topic.weight) {
            ScoreOutcome::Scored(scored) => scan.items.push(classifier.classify(scored)),
            ScoreOutcome::BelowFloor => {
                counter!(metrics::SCAN_FLOOR_TOTAL).increment(1);
                scan.floor_dropped += 1;
            }
        }
    }

    info!(
        topic = %scan.track,
        fetched = scan.fetched,
        kept = scan.items.len(),
        spam = scan.spam_dropped,
        floor = scan.floor_dropped,
        "topic scan done"
    );
    scan
}

/// Scan the must-follow accounts. Skips the spam filter and the engagement
/// floor entirely; these accounts are curated out-of-band by the operator.
pub async fn scan_must_follow(
    ctx: &ScanContext,
    providers: &[Arc<dyn FetchProvider>],
) -> TopicScan {
    let mut scan = TopicScan {
        track: MUST_FOLLOW_TRACK.to_string(),
        ..Default::default()
    };
    let queries = must_follow_queries(&ctx.cfg.accounts);
    if queries.is_empty() {
        return scan;
    }

    let limit = ctx.cfg.run.items_per_topic;
    let classifier = Classifier::new(&ctx.cfg.quality_filters);
    let scorer = QualityScorer::new(&ctx.cfg.quality_filters);

    for query in &queries {
        for p in providers.iter().filter(|p| p.source() == Source::X) {
            match p.search(query, limit).await {
                Ok(items) => {
                    scan.fetched += items.len();
                    for raw in items {
                        let item = ctx.decorate(ContentItem::from_raw(raw, Source::X, ""));
                        // Unconditionally kept; still scored (weight 1.0) and
                        // classified so it ranks and labels like the rest.
                        let item = scorer.score_ungated(item, 1.0);
                        scan.items.push(classifier.classify(item));
                    }
                }
                Err(e) => {
                    warn!(query = %query, provider = p.name(), error = %e, "must-follow fetch failed");
                    counter!(metrics::FETCH_ERRORS_TOTAL).increment(1);
                    scan.errors.push(format!("{}/must-follow: {}", p.name(), e));
                }
            }
        }
    }

    info!(fetched = scan.fetched, kept = scan.items.len(), "must-follow scan done");
    scan
}

/// One dedicated query per solo account; non-solo accounts batched per group.
pub fn must_follow_queries(accounts: &[AccountConfig]) -> Vec<String> {
    let mut queries = Vec::new();
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for a in accounts {
        let handle = a.handle.trim_start_matches('@');
        if a.solo {
            queries.push(format!("from:@{}", handle));
        } else {
            grouped.entry(a.group.as_str()).or_default().push(handle);
        }
    }
    for (_group, handles) in grouped {
        queries.push(
            handles
                .iter()
                .map(|h| format!("from:@{}", h))
                .collect::<Vec<_>>()
                .join(" OR "),
        );
    }
    queries
}
