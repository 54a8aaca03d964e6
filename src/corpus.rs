// src/corpus.rs
//! Note corpus collaborator.
//!
//! The pipeline never touches raw files directly; everything goes through the
//! `Corpus` trait so the engine stays decoupled from how notes are stored.
//! `FsCorpus` is the production implementation (a vault directory on disk);
//! `MemoryCorpus` serves tests and previews.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Datelike;

use crate::error::PipelineError;

/// Read/write surface over the note store. Paths are vault-relative,
/// forward-slash separated (e.g. `Research/Dailies/2026/08/2026-08-29.md`).
pub trait Corpus: Send + Sync {
    /// List note paths under a folder prefix, recursively, sorted.
    fn list_notes(&self, prefix: &str) -> Result<Vec<String>>;
    fn read(&self, path: &str) -> Result<String>;
    /// Replace a single 0-based line in an existing note.
    fn rewrite_line(&self, path: &str, line: usize, new_text: &str) -> Result<()>;
    fn create(&self, path: &str, content: &str) -> Result<()>;
    fn exists(&self, path: &str) -> bool;
}

/// Build the year/month sub-path for a daily note,
/// e.g. `Research/Dailies/2026/08/2026-08-29.md`.
pub fn daily_note_path(dailies_folder: &str, date: chrono::NaiveDate) -> String {
    format!(
        "{}/{}/{:02}/{}.md",
        dailies_folder,
        date.year(),
        date.month(),
        date.format("%Y-%m-%d")
    )
}

/// Find an unused variant of `path` by suffixing `-2`, `-3`, …
pub fn unique_path(corpus: &dyn Corpus, path: &str) -> String {
    if !corpus.exists(path) {
        return path.to_string();
    }
    let base = path.strip_suffix(".md").unwrap_or(path);
    let mut i = 2;
    loop {
        let candidate = format!("{}-{}.md", base, i);
        if !corpus.exists(&candidate) {
            return candidate;
        }
        i += 1;
    }
}

/* ----------------------------
Filesystem corpus
---------------------------- */

#[derive(Debug)]
pub struct FsCorpus {
    root: PathBuf,
}

impl FsCorpus {
    /// Open a vault root. Fails with `CorpusUnavailable` when the directory
    /// is missing: proceeding with an empty corpus would make every
    /// previously seen item look new.
    pub fn open(root: &Path) -> Result<Self, PipelineError> {
        if !root.is_dir() {
            return Err(PipelineError::CorpusUnavailable(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn abs(&self, rel: &str) -> PathBuf {
        let mut p = self.root.clone();
        for part in rel.split('/') {
            p.push(part);
        }
        p
    }

    fn walk(&self, dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<()> {
        let entries =
            fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            let rel = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };
            if path.is_dir() {
                self.walk(&path, &rel, out)?;
            } else if name.ends_with(".md") {
                out.push(rel);
            }
        }
        Ok(())
    }
}

impl Corpus for FsCorpus {
    fn list_notes(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = self.abs(prefix);
        let mut out = Vec::new();
        if dir.is_dir() {
            self.walk(&dir, prefix, &mut out)?;
        }
        out.sort();
        Ok(out)
    }

    fn read(&self, path: &str) -> Result<String> {
        fs::read_to_string(self.abs(path)).with_context(|| format!("reading note {}", path))
    }

    fn rewrite_line(&self, path: &str, line: usize, new_text: &str) -> Result<()> {
        let abs = self.abs(path);
        let content =
            fs::read_to_string(&abs).with_context(|| format!("reading note {}", path))?;
        let mut lines: Vec<&str> = content.lines().collect();
        if line >= lines.len() {
            anyhow::bail!("line {} out of range in {} ({} lines)", line, path, lines.len());
        }
        lines[line] = new_text;
        let mut rewritten = lines.join("\n");
        if content.ends_with('\n') {
            rewritten.push('\n');
        }
        // Write to a sibling temp file, then rename: the rewrite either lands
        // fully or not at all.
        let tmp = abs.with_extension("md.tmp");
        fs::write(&tmp, rewritten).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &abs).with_context(|| format!("replacing note {}", path))?;
        Ok(())
    }

    fn create(&self, path: &str, content: &str) -> Result<()> {
        let abs = self.abs(path);
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating folder {}", parent.display()))?;
        }
        fs::write(&abs, content).with_context(|| format!("creating note {}", path))
    }

    fn exists(&self, path: &str) -> bool {
        self.abs(path).is_file()
    }
}

/* ----------------------------
In-memory corpus (tests, previews)
---------------------------- */

#[derive(Default)]
pub struct MemoryCorpus {
    notes: Mutex<BTreeMap<String, String>>,
    /// Paths whose rewrites should fail, for conflict-path tests.
    fail_rewrites: Mutex<Vec<String>>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_note(self, path: &str, content: &str) -> Self {
        self.notes
            .lock()
            .expect("corpus mutex poisoned")
            .insert(path.to_string(), content.to_string());
        self
    }

    /// Make every subsequent `rewrite_line` on `path` fail.
    pub fn fail_rewrites_on(&self, path: &str) {
        self.fail_rewrites
            .lock()
            .expect("corpus mutex poisoned")
            .push(path.to_string());
    }

    pub fn note(&self, path: &str) -> Option<String> {
        self.notes
            .lock()
            .expect("corpus mutex poisoned")
            .get(path)
            .cloned()
    }

    pub fn note_count(&self) -> usize {
        self.notes.lock().expect("corpus mutex poisoned").len()
    }
}

impl Corpus for MemoryCorpus {
    fn list_notes(&self, prefix: &str) -> Result<Vec<String>> {
        let notes = self.notes.lock().expect("corpus mutex poisoned");
        let needle = format!("{}/", prefix.trim_end_matches('/'));
        Ok(notes
            .keys()
            .filter(|k| k.starts_with(&needle))
            .cloned()
            .collect())
    }

    fn read(&self, path: &str) -> Result<String> {
        self.note(path)
            .ok_or_else(|| anyhow::anyhow!("no such note: {}", path))
    }

    fn rewrite_line(&self, path: &str, line: usize, new_text: &str) -> Result<()> {
        if self
            .fail_rewrites
            .lock()
            .expect("corpus mutex poisoned")
            .iter()
            .any(|p| p == path)
        {
            anyhow::bail!("simulated rewrite failure for {}", path);
        }
        let mut notes = self.notes.lock().expect("corpus mutex poisoned");
        let content = notes
            .get(path)
            .ok_or_else(|| anyhow::anyhow!("no such note: {}", path))?;
        let mut lines: Vec<&str> = content.lines().collect();
        if line >= lines.len() {
            anyhow::bail!("line {} out of range in {}", line, path);
        }
        lines[line] = new_text;
        let rewritten = lines.join("\n");
        notes.insert(path.to_string(), rewritten);
        Ok(())
    }

    fn create(&self, path: &str, content: &str) -> Result<()> {
        self.notes
            .lock()
            .expect("corpus mutex poisoned")
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.notes
            .lock()
            .expect("corpus mutex poisoned")
            .contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_path_uses_year_month_subfolders() {
        let d = chrono::NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert_eq!(
            daily_note_path("Research/Dailies", d),
            "Research/Dailies/2026/08/2026-08-29.md"
        );
    }

    #[test]
    fn unique_path_suffixes_on_collision() {
        let corpus = MemoryCorpus::new()
            .with_note("Lib/a-note.md", "x")
            .with_note("Lib/a-note-2.md", "x");
        assert_eq!(unique_path(&corpus, "Lib/a-note.md"), "Lib/a-note-3.md");
        assert_eq!(unique_path(&corpus, "Lib/fresh.md"), "Lib/fresh.md");
    }

    #[test]
    fn memory_rewrite_line_replaces_only_that_line() {
        let corpus = MemoryCorpus::new().with_note("n.md", "one\ntwo\nthree");
        corpus.rewrite_line("n.md", 1, "TWO").unwrap();
        assert_eq!(corpus.note("n.md").unwrap(), "one\nTWO\nthree");
        assert!(corpus.rewrite_line("n.md", 9, "x").is_err());
    }

    #[test]
    fn fs_corpus_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = FsCorpus::open(dir.path()).unwrap();
        corpus
            .create("Research/Dailies/2026/08/2026-08-29.md", "- a line\n")
            .unwrap();
        let listed = corpus.list_notes("Research/Dailies").unwrap();
        assert_eq!(listed, vec!["Research/Dailies/2026/08/2026-08-29.md"]);
        corpus
            .rewrite_line("Research/Dailies/2026/08/2026-08-29.md", 0, "- edited")
            .unwrap();
        assert_eq!(
            corpus.read("Research/Dailies/2026/08/2026-08-29.md").unwrap(),
            "- edited\n"
        );
    }

    #[test]
    fn missing_root_is_corpus_unavailable() {
        let err = FsCorpus::open(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, PipelineError::CorpusUnavailable(_)));
    }
}
