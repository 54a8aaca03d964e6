// src/dedup.rs
//! Cross-run and cross-topic deduplication.
//!
//! An item survives iff its fingerprint is absent from the history index and
//! from everything already accepted earlier in the same batch. Sequential,
//! first-occurrence-wins: when two topics surface the same URL, the first
//! processed topic's copy survives, so processing order (configured topic
//! order, must-follow last) matters and this stage never runs concurrently.

use tracing::debug;

use crate::fingerprint::Fingerprint;
use crate::history::HistoryIndex;
use crate::item::ContentItem;

pub struct CrossDeduplicator<'a> {
    history: &'a mut HistoryIndex,
}

impl<'a> CrossDeduplicator<'a> {
    /// The deduplicator owns the index mutably for the rest of the run:
    /// accepted fingerprints are folded into it so later topics in the same
    /// batch see them as taken.
    pub fn new(history: &'a mut HistoryIndex) -> Self {
        Self { history }
    }

    /// Keep only items not seen before, in order; returns the survivors and
    /// the number dropped as duplicates.
    pub fn filter(&mut self, items: Vec<ContentItem>) -> (Vec<ContentItem>, usize) {
        let mut kept = Vec::with_capacity(items.len());
        let mut dropped = 0usize;

        for item in items {
            let fp = Fingerprint::of(&item.url, &item.title);
            if self.history.contains(&fp) {
                dropped += 1;
                debug!(
                    url = %item.url,
                    first_seen = self.history.provenance(&fp).unwrap_or("this batch"),
                    "duplicate dropped"
                );
                continue;
            }
            self.history.insert(fp);
            kept.push(item);
        }

        (kept, dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Engagement, RawItem, Source};

    fn item(url: &str, title: &str, topic: &str) -> ContentItem {
        ContentItem::from_raw(
            RawItem {
                url: url.into(),
                title: title.into(),
                author: None,
                published_at: None,
                engagement: Engagement::new(),
                body: String::new(),
            },
            Source::X,
            topic,
        )
    }

    #[test]
    fn first_occurrence_wins_within_a_batch() {
        let mut history = HistoryIndex::default();
        let mut dedup = CrossDeduplicator::new(&mut history);

        // agents is processed before rag; same URL, different titles.
        let batch = vec![
            item("https://example.com/shared", "Agents take", "agents"),
            item("https://example.com/other", "Something else entirely", "agents"),
            item("https://example.com/shared?utm_source=x", "RAG take", "rag"),
        ];
        let (kept, dropped) = dedup.filter(batch);
        assert_eq!(dropped, 1);
        let topics: Vec<&str> = kept.iter().map(|i| i.topic_slug.as_str()).collect();
        assert_eq!(topics, vec!["agents", "agents"]);
        assert_eq!(kept[0].title, "Agents take");
    }

    #[test]
    fn history_hits_never_reappear() {
        let mut history = HistoryIndex::default();
        history.insert(Fingerprint::of("https://example.com/old", "An Old Item Title"));
        let mut dedup = CrossDeduplicator::new(&mut history);

        let (kept, dropped) =
            dedup.filter(vec![item("https://example.com/old", "Renamed Item", "rag")]);
        assert!(kept.is_empty());
        assert_eq!(dropped, 1);
    }

    #[test]
    fn accepted_items_are_folded_into_the_index() {
        let mut history = HistoryIndex::default();
        {
            let mut dedup = CrossDeduplicator::new(&mut history);
            let (kept, _) =
                dedup.filter(vec![item("https://example.com/a", "A Fresh Item Here", "agents")]);
            assert_eq!(kept.len(), 1);
        }
        assert!(history.contains(&Fingerprint::of("https://example.com/a", "A Fresh Item Here")));
    }
}
