// src/error.rs
//! Error taxonomy for the pipeline.
//!
//! Stage-local failures (a single topic fetch, one malformed note) are logged
//! and recovered in place; only corpus- and config-level failures surface as
//! hard errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The note corpus could not be reached at all. Fatal: running with an
    /// empty history index would re-surface every previously seen item.
    #[error("corpus unavailable: {0}")]
    CorpusUnavailable(String),

    /// A single topic's external fetch failed. Recovered per topic by
    /// treating the topic as having produced zero items.
    #[error("fetch failed for topic `{topic}`: {reason}")]
    FetchFailure { topic: String, reason: String },

    /// A tag rewrite failed after the promotion/feedback record was
    /// tentatively computed. The tentative record must be discarded.
    #[error("rewrite conflict in `{note}` line {line}: {reason}")]
    RewriteConflict {
        note: String,
        line: usize,
        reason: String,
    },

    /// The synthesizer could not render the daily note body.
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// Startup configuration is malformed. Fatal before anything runs.
    #[error("invalid configuration: {0}")]
    ConfigValidation(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
