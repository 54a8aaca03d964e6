// src/fetch.rs
//! Fetch collaborator: the boundary to external search backends.
//!
//! The pipeline only sees `search(query, limit)`; live API clients plug in
//! behind this trait. `StaticProvider` serves canned items from JSON fixture
//! files and is what the binary uses when no live backend is wired up.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::item::{RawItem, Source};

#[async_trait]
pub trait FetchProvider: Send + Sync {
    fn source(&self) -> Source;
    fn name(&self) -> &'static str;
    /// Raw records for a query, at most `limit`. Missing engagement metrics
    /// must stay absent, never coerced to zero.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawItem>>;
}

/* ----------------------------
Fixture-backed provider
---------------------------- */

/// Items keyed by the query string (or matched against `from:@handle`
/// account queries); `"*"` matches any query.
pub struct StaticProvider {
    source: Source,
    by_query: BTreeMap<String, Vec<RawItem>>,
}

impl StaticProvider {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            by_query: BTreeMap::new(),
        }
    }

    pub fn with_items(mut self, query: &str, items: Vec<RawItem>) -> Self {
        self.by_query.insert(query.to_string(), items);
        self
    }

    /// Load a fixture file: a JSON object mapping query → items.
    pub fn from_json_file(source: Source, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        let by_query: BTreeMap<String, Vec<RawItem>> =
            serde_json::from_str(&content).with_context(|| {
                format!("parsing fixture {}", path.display())
            })?;
        Ok(Self { source, by_query })
    }
}

#[async_trait]
impl FetchProvider for StaticProvider {
    fn source(&self) -> Source {
        self.source
    }

    fn name(&self) -> &'static str {
        match self.source {
            Source::Reddit => "static-reddit",
            Source::X => "static-x",
            Source::Web => "static-web",
        }
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawItem>> {
        let items = self
            .by_query
            .get(query)
            .or_else(|| self.by_query.get("*"))
            .cloned()
            .unwrap_or_default();
        Ok(items.into_iter().take(limit).collect())
    }
}

/// A provider that always fails; exercises the per-topic failure policy.
pub struct FailingProvider(pub Source);

#[async_trait]
impl FetchProvider for FailingProvider {
    fn source(&self) -> Source {
        self.0
    }

    fn name(&self) -> &'static str {
        "failing"
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<RawItem>> {
        anyhow::bail!("backend unreachable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Engagement;

    fn raw(url: &str) -> RawItem {
        RawItem {
            url: url.into(),
            title: "t".into(),
            author: None,
            published_at: None,
            engagement: Engagement::new(),
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn static_provider_respects_limit_and_wildcard() {
        let p = StaticProvider::new(Source::X)
            .with_items("agents", vec![raw("https://a/1"), raw("https://a/2")])
            .with_items("*", vec![raw("https://fallback/1")]);

        let hits = p.search("agents", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://a/1");

        let fallback = p.search("unknown query", 5).await.unwrap();
        assert_eq!(fallback[0].url, "https://fallback/1");
    }

    #[tokio::test]
    async fn fixture_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        std::fs::write(
            &path,
            r#"{"agents": [{"url": "https://a/1", "title": "T", "engagement": {"likes": 7}, "body": "b"}]}"#,
        )
        .unwrap();
        let p = StaticProvider::from_json_file(Source::X, &path).unwrap();
        let hits = p.search("agents", 10).await.unwrap();
        assert_eq!(hits[0].engagement.metric("likes"), Some(7));
    }
}
