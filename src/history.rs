// src/history.rs
//! History index: the set of previously seen content fingerprints, rebuilt
//! from the corpus on every run. The corpus is the source of truth; the
//! index is derived and never persisted.

use std::collections::{HashMap, HashSet};

use strsim::normalized_levenshtein;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::corpus::Corpus;
use crate::error::PipelineError;
use crate::fingerprint::{normalize_title, normalize_url, Fingerprint};
use crate::notes;

/// Fuzzy seen-title threshold (normalized Levenshtein).
const TITLE_SIMILARITY_THRESHOLD: f64 = 0.8;

#[derive(Debug, Default)]
pub struct HistoryIndex {
    fingerprints: HashSet<Fingerprint>,
    seen_urls: HashSet<String>,
    seen_titles: HashSet<String>,
    /// Fingerprint → note that first surfaced it, for diagnostics.
    provenance: HashMap<Fingerprint, String>,
}

impl HistoryIndex {
    /// Scan the dailies and library folders and build the index.
    ///
    /// A single malformed note logs a warning and is skipped; an unreachable
    /// corpus aborts the run (an empty index would re-surface every
    /// previously seen item).
    pub fn build(corpus: &dyn Corpus, cfg: &PipelineConfig) -> Result<Self, PipelineError> {
        let mut index = HistoryIndex::default();

        let mut paths = Vec::new();
        for folder in [&cfg.run.dailies_folder, &cfg.run.library_folder] {
            match corpus.list_notes(folder) {
                Ok(mut v) => paths.append(&mut v),
                Err(e) => {
                    return Err(PipelineError::CorpusUnavailable(format!(
                        "listing {}: {}",
                        folder, e
                    )))
                }
            }
        }
        paths.sort();

        for path in &paths {
            let text = match corpus.read(path) {
                Ok(t) => t,
                Err(e) => {
                    warn!(note = %path, error = %e, "skipping unreadable note");
                    continue;
                }
            };
            index.absorb_note(path, &text);
        }

        debug!(
            notes = paths.len(),
            fingerprints = index.fingerprints.len(),
            urls = index.seen_urls.len(),
            titles = index.seen_titles.len(),
            "history index built"
        );
        Ok(index)
    }

    fn absorb_note(&mut self, path: &str, text: &str) {
        for link in notes::extract_links(text) {
            let fp = Fingerprint::of(&link.url, &link.title);
            self.seen_urls.insert(fp.url.clone());
            if fp.title.chars().count() > 10 {
                self.seen_titles.insert(fp.title.clone());
            }
            self.provenance
                .entry(fp.clone())
                .or_insert_with(|| path.to_string());
            self.fingerprints.insert(fp);
        }
        for url in notes::extract_bare_urls(text) {
            self.seen_urls.insert(normalize_url(&url));
        }
        for heading in notes::extract_headings(text) {
            self.seen_titles.insert(normalize_title(&heading));
        }
    }

    /// Record a fingerprint accepted during the current run, so later topics
    /// in the same batch see it as taken.
    pub fn insert(&mut self, fp: Fingerprint) {
        self.seen_urls.insert(fp.url.clone());
        if fp.title.chars().count() > 10 {
            self.seen_titles.insert(fp.title.clone());
        }
        self.fingerprints.insert(fp);
    }

    /// True when the fingerprint's URL or title has been seen before.
    ///
    /// Titles match exactly or fuzzily (>= 0.8 similarity); titles shorter
    /// than three words require an exact match to avoid false hits.
    pub fn contains(&self, fp: &Fingerprint) -> bool {
        if self.fingerprints.contains(fp) || self.seen_urls.contains(&fp.url) {
            return true;
        }
        self.title_is_seen(&fp.title)
    }

    fn title_is_seen(&self, title: &str) -> bool {
        if title.is_empty() {
            return false;
        }
        if self.seen_titles.contains(title) {
            return true;
        }
        if title.split_whitespace().count() < 3 {
            return false;
        }
        self.seen_titles
            .iter()
            .any(|seen| normalized_levenshtein(title, seen) >= TITLE_SIMILARITY_THRESHOLD)
    }

    /// Which note first surfaced this fingerprint, if known.
    pub fn provenance(&self, fp: &Fingerprint) -> Option<&str> {
        self.provenance.get(fp).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    /// Seen URLs in sorted order (the `--show-dedup` dump).
    pub fn seen_urls_sorted(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.seen_urls.iter().map(String::as_str).collect();
        v.sort();
        v
    }
}
