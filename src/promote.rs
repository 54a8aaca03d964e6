// src/promote.rs
//! Promotion tracker: the tag-driven feedback loop over prior output notes.
//!
//! Each pending tag is a small state machine: `#keep` → `#kept`,
//! `#good` → `#good-noted`, `#bad` → `#bad-noted`. A transition is two-phase:
//! compute the record, commit the line rewrite, then finalize the record.
//! When the rewrite fails, the tentative record is discarded, so a promotion
//! record never exists for a line still marked pending.

use chrono::{DateTime, Utc};
use ::metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::corpus::{unique_path, Corpus};
use crate::error::PipelineError;
use crate::fingerprint::Fingerprint;
use crate::metrics;
use crate::notes::{self, Tag, TaggedLine};

/// Written once per `#keep` → `#kept` transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionRecord {
    pub fingerprint: String,
    pub title: String,
    pub url: String,
    pub topic_slug: String,
    pub library_path: String,
    pub promoted_at: DateTime<Utc>,
}

/// Appended once per resolved `#good`/`#bad` occurrence; the log is never
/// rewritten, so the full history stays available for trend analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub title: String,
    pub url: String,
    pub tag: String,
    pub noted_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub promotions: Vec<PromotionRecord>,
    pub feedback: Vec<FeedbackRecord>,
}

pub struct PromotionTracker<'a> {
    cfg: &'a PipelineConfig,
}

impl<'a> PromotionTracker<'a> {
    pub fn new(cfg: &'a PipelineConfig) -> Self {
        Self { cfg }
    }

    /// Scan every daily note for pending tags and resolve them.
    ///
    /// Re-running with no new tags yields an empty outcome and no file
    /// changes: resolved tags are not parsed as pending, and a fingerprint is
    /// never promoted twice within a sweep.
    pub fn sweep(&self, corpus: &dyn Corpus) -> Result<SweepOutcome, PipelineError> {
        metrics::ensure_described();
        let mut outcome = SweepOutcome::default();
        let mut promoted_fps: Vec<Fingerprint> = Vec::new();

        let paths = corpus
            .list_notes(&self.cfg.run.dailies_folder)
            .map_err(|e| PipelineError::CorpusUnavailable(format!("listing dailies: {}", e)))?;

        for path in &paths {
            let text = match corpus.read(path) {
                Ok(t) => t,
                Err(e) => {
                    warn!(note = %path, error = %e, "skipping unreadable note");
                    continue;
                }
            };

            for tagged in notes::parse_tagged_lines(&text) {
                match tagged.tag {
                    Tag::Keep => {
                        self.promote_one(corpus, path, &tagged, &mut promoted_fps, &mut outcome)
                    }
                    Tag::Good | Tag::Bad => self.note_feedback(corpus, path, &tagged, &mut outcome),
                }
            }
        }

        counter!(metrics::PROMOTIONS_TOTAL).increment(outcome.promotions.len() as u64);
        counter!(metrics::FEEDBACK_TOTAL).increment(outcome.feedback.len() as u64);
        Ok(outcome)
    }

    /// `#keep` transition: construct the library entry, rewrite the line,
    /// finalize the record — in that order.
    fn promote_one(
        &self,
        corpus: &dyn Corpus,
        note_path: &str,
        tagged: &TaggedLine,
        promoted_fps: &mut Vec<Fingerprint>,
        outcome: &mut SweepOutcome,
    ) {
        let link = match &tagged.link {
            Some(l) => l.clone(),
            None => {
                warn!(note = %note_path, line = tagged.line, "keep tag without a link, skipping");
                return;
            }
        };
        let fp = Fingerprint::of(&link.url, &link.title);
        let resolved = notes::resolve_tag_in_line(&tagged.raw, Tag::Keep);

        // Another line already promoted this fingerprint: resolve the tag so
        // it never looks pending again, but emit no second record.
        if promoted_fps.contains(&fp) {
            if let Err(e) = corpus.rewrite_line(note_path, tagged.line, &resolved) {
                warn!(note = %note_path, line = tagged.line, error = %e, "duplicate keep tag left pending");
            }
            return;
        }
        let topic_slug = tagged.topic_slug.clone().unwrap_or_else(|| "general".into());
        let now = Utc::now();

        // Phase 1: compute the tentative record.
        let lib_path = unique_path(
            corpus,
            &format!("{}/{}.md", self.cfg.run.library_folder, slugify(&link.title)),
        );

        // Phase 2: commit the tag rewrite. On failure the tentative record is
        // dropped, nothing is written, and the line stays pending for the
        // next sweep.
        if let Err(e) = corpus.rewrite_line(note_path, tagged.line, &resolved) {
            let conflict = PipelineError::RewriteConflict {
                note: note_path.to_string(),
                line: tagged.line,
                reason: e.to_string(),
            };
            warn!(error = %conflict, "promotion discarded");
            return;
        }

        // Phase 3: library entry, then finalize.
        let content = library_note(&link.title, &link.url, &topic_slug, now);
        if let Err(e) = corpus.create(&lib_path, &content) {
            warn!(note = %note_path, line = tagged.line, error = %e, "library note creation failed, record dropped");
            return;
        }
        promoted_fps.push(fp.clone());
        info!(title = %link.title, library = %lib_path, "promoted to library");
        outcome.promotions.push(PromotionRecord {
            fingerprint: fp.digest(),
            title: link.title,
            url: link.url,
            topic_slug,
            library_path: lib_path,
            promoted_at: now,
        });
    }

    /// `#good`/`#bad` transition: rewrite first, then append to the log.
    fn note_feedback(
        &self,
        corpus: &dyn Corpus,
        note_path: &str,
        tagged: &TaggedLine,
        outcome: &mut SweepOutcome,
    ) {
        let (title, url) = match &tagged.link {
            Some(l) => (l.title.clone(), l.url.clone()),
            // Feedback without a link still counts; keep the raw line as title.
            None => (tagged.raw.trim().chars().take(80).collect(), String::new()),
        };
        let record = FeedbackRecord {
            title,
            url,
            tag: match tagged.tag {
                Tag::Good => "good".into(),
                Tag::Bad => "bad".into(),
                Tag::Keep => unreachable!("keep handled in promote_one"),
            },
            noted_at: Utc::now(),
        };

        let resolved = notes::resolve_tag_in_line(&tagged.raw, tagged.tag);
        if let Err(e) = corpus.rewrite_line(note_path, tagged.line, &resolved) {
            let conflict = PipelineError::RewriteConflict {
                note: note_path.to_string(),
                line: tagged.line,
                reason: e.to_string(),
            };
            warn!(error = %conflict, "feedback discarded");
            return;
        }

        if let Err(e) = self.append_feedback(corpus, &record) {
            warn!(error = %e, "feedback log append failed");
        }
        outcome.feedback.push(record);
    }

    fn append_feedback(&self, corpus: &dyn Corpus, record: &FeedbackRecord) -> anyhow::Result<()> {
        let path = &self.cfg.run.feedback_path;
        let mut log = if corpus.exists(path) {
            corpus.read(path)?
        } else {
            String::new()
        };
        if !log.is_empty() && !log.ends_with('\n') {
            log.push('\n');
        }
        log.push_str(&serde_json::to_string(record)?);
        log.push('\n');
        corpus.create(path, &log)
    }
}

/// Kebab-case filename slug from a title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    for ch in title.to_ascii_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            if !slug.ends_with('-') {
                slug.push('-');
            }
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.chars().take(60).collect::<String>().trim_end_matches('-').to_string()
    }
}

/// Minimal standalone library note. Enrichment (page fetch + summary) is the
/// synthesis collaborator's business, not this tracker's.
fn library_note(title: &str, url: &str, topic_slug: &str, now: DateTime<Utc>) -> String {
    format!(
        "---\ntype: research-note\nurl: {}\ntopic: {}\ndate_saved: {}\nstatus: unread\n---\n\n# {}\n\n> **Link**: [{}]({})\n",
        url,
        topic_slug,
        now.format("%Y-%m-%d"),
        title,
        title,
        url,
    )
}
