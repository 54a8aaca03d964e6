// src/run.rs
//! Run coordinator: wires the stages into one pipeline pass.
//!
//! Order is fixed: tag sweep first (so yesterday's `#keep` lands in the
//! library before today's dedup index is built), then the history index, the
//! concurrent topic scans, the sequential dedup barrier, ranking, synthesis,
//! and finally the daily note write.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use ::metrics::{counter, gauge};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::corpus::{daily_note_path, unique_path, Corpus};
use crate::dedup::CrossDeduplicator;
use crate::error::PipelineError;
use crate::fetch::FetchProvider;
use crate::history::HistoryIndex;
use crate::item::ContentItem;
use crate::metrics;
use crate::promote::PromotionTracker;
use crate::scan::{self, ScanContext, TopicScan};
use crate::scoring;
use crate::synthesis::{RunDigest, Synthesizer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Sweep tags, scan every topic, write the daily note.
    Full,
    /// Scan a single topic slug (must-follow still runs).
    SingleTopic(String),
    /// Scan and rank but write nothing back.
    Preview,
    /// Only resolve pending tags, no scanning.
    PromoteOnly,
}

/// Per-track counts for the run report.
#[derive(Debug, Clone)]
pub struct TopicSummary {
    pub track: String,
    pub fetched: usize,
    pub spam_dropped: usize,
    pub floor_dropped: usize,
    pub duplicate_dropped: usize,
    pub kept: usize,
    pub failed: bool,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub topics: Vec<TopicSummary>,
    pub promotions: usize,
    pub feedback: usize,
    /// Path of the daily note written, `None` in preview/promote-only modes.
    pub note_path: Option<String>,
}

#[derive(Debug)]
pub struct RunCoordinator {
    cfg: PipelineConfig,
    mode: RunMode,
}

impl RunCoordinator {
    pub fn new(mut cfg: PipelineConfig, mode: RunMode) -> Result<Self, PipelineError> {
        if let RunMode::SingleTopic(slug) = &mode {
            cfg.restrict_to_topic(slug)?;
        }
        Ok(Self { cfg, mode })
    }

    pub async fn run(
        &self,
        corpus: &dyn Corpus,
        providers: Arc<Vec<Arc<dyn FetchProvider>>>,
        synthesizer: &dyn Synthesizer,
    ) -> Result<RunSummary, PipelineError> {
        self.run_for_date(corpus, providers, synthesizer, Utc::now().date_naive())
            .await
    }

    pub async fn run_for_date(
        &self,
        corpus: &dyn Corpus,
        providers: Arc<Vec<Arc<dyn FetchProvider>>>,
        synthesizer: &dyn Synthesizer,
        date: NaiveDate,
    ) -> Result<RunSummary, PipelineError> {
        metrics::ensure_described();
        let mut summary = RunSummary::default();

        // --- tag sweep ---
        // Preview must not mutate the corpus, so the sweep is skipped there.
        if self.mode != RunMode::Preview {
            let outcome = PromotionTracker::new(&self.cfg).sweep(corpus)?;
            summary.promotions = outcome.promotions.len();
            summary.feedback = outcome.feedback.len();
            if self.mode == RunMode::PromoteOnly {
                info!(
                    promotions = summary.promotions,
                    feedback = summary.feedback,
                    "promote-only run finished"
                );
                return Ok(summary);
            }
        }

        // --- history, scans, dedup ---
        let mut history = HistoryIndex::build(corpus, &self.cfg)?;
        let ctx = Arc::new(ScanContext::new(self.cfg.clone())?);
        let scans = scan::run_scans(ctx, providers).await?;

        let mut by_track: Vec<(TopicScan, Vec<ContentItem>)> = Vec::with_capacity(scans.len());
        let mut deduper = CrossDeduplicator::new(&mut history);
        for mut scan in scans {
            let items = std::mem::take(&mut scan.items);
            let (kept, dropped) = deduper.filter(items);
            counter!(metrics::SCAN_DUP_TOTAL).increment(dropped as u64);
            counter!(metrics::SCAN_KEPT_TOTAL).increment(kept.len() as u64);
            summary.topics.push(TopicSummary {
                track: scan.track.clone(),
                fetched: scan.fetched,
                spam_dropped: scan.spam_dropped,
                floor_dropped: scan.floor_dropped,
                duplicate_dropped: dropped,
                kept: kept.len(),
                failed: scan.failed(),
            });
            by_track.push((scan, kept));
        }

        // --- rank and cap ---
        let mut reading_list: Vec<ContentItem> = by_track
            .iter()
            .filter(|(scan, _)| scan.track != scan::MUST_FOLLOW_TRACK)
            .flat_map(|(_, kept)| kept.iter().cloned())
            .collect();
        scoring::rank(&mut reading_list);
        reading_list.truncate(self.cfg.run.reading_list_max);

        let must_follow = by_track
            .iter()
            .find(|(scan, _)| scan.track == scan::MUST_FOLLOW_TRACK)
            .map(|(_, kept)| kept.clone())
            .unwrap_or_default();

        let by_topic = self
            .cfg
            .topics
            .iter()
            .map(|topic| {
                let items = by_track
                    .iter()
                    .find(|(scan, _)| scan.track == topic.slug)
                    .map(|(_, kept)| kept.clone())
                    .unwrap_or_default();
                (topic.clone(), items)
            })
            .collect();

        let digest = RunDigest {
            date,
            reading_list,
            by_topic,
            must_follow,
        };

        // --- synthesis and note write ---
        let body = synthesizer
            .summarize(&digest)
            .await
            .map_err(|e| PipelineError::Synthesis(e.to_string()))?;

        if self.mode == RunMode::Preview {
            info!("preview run, daily note not written");
        } else {
            let path = unique_path(corpus, &daily_note_path(&self.cfg.run.dailies_folder, date));
            corpus
                .create(&path, &body)
                .map_err(|e| PipelineError::CorpusUnavailable(format!("writing {}: {}", path, e)))?;
            info!(note = %path, items = digest.reading_list.len(), "daily note written");
            summary.note_path = Some(path);
        }

        gauge!(metrics::RUN_LAST_TS).set(Utc::now().timestamp() as f64);
        for topic in summary.topics.iter().filter(|t| t.failed) {
            warn!(track = %topic.track, "track produced nothing and reported errors");
        }
        Ok(summary)
    }
}
