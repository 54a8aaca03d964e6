// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod classify;
pub mod config;
pub mod corpus;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod fingerprint;
pub mod history;
pub mod item;
pub mod metrics;
pub mod notes;
pub mod promote;
pub mod run;
pub mod scan;
pub mod scoring;
pub mod spam;
pub mod synthesis;

// ---- Re-exports for stable public API ----
pub use crate::config::PipelineConfig;
pub use crate::corpus::{Corpus, FsCorpus, MemoryCorpus};
pub use crate::error::PipelineError;
pub use crate::item::{Category, ContentItem, RawItem, Source};
pub use crate::run::{RunCoordinator, RunMode, RunSummary};
pub use crate::synthesis::{PlainSynthesizer, Synthesizer};
