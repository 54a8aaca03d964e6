// src/synthesis.rs
//! Daily note rendering.
//!
//! The engine hands a finished `RunDigest` to a `Synthesizer` and writes back
//! whatever markdown comes out. `PlainSynthesizer` is the deterministic
//! built-in; an LLM-backed implementation slots in behind the same trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::TopicConfig;
use crate::item::{Category, ContentItem};

/// Everything one run produced, grouped the way the note presents it.
#[derive(Debug)]
pub struct RunDigest {
    pub date: NaiveDate,
    /// Ranked and capped cross-topic reading list.
    pub reading_list: Vec<ContentItem>,
    /// Per-topic survivors, in configured topic order.
    pub by_topic: Vec<(TopicConfig, Vec<ContentItem>)>,
    pub must_follow: Vec<ContentItem>,
}

impl RunDigest {
    pub fn is_empty(&self) -> bool {
        self.reading_list.is_empty()
            && self.by_topic.iter().all(|(_, items)| items.is_empty())
            && self.must_follow.is_empty()
    }
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn summarize(&self, digest: &RunDigest) -> anyhow::Result<String>;
}

/// Template renderer with no external calls. Reading-list lines keep the
/// `- [ ] [title](url) … #topic` shape so later tag sweeps can parse them.
pub struct PlainSynthesizer;

#[async_trait]
impl Synthesizer for PlainSynthesizer {
    async fn summarize(&self, digest: &RunDigest) -> anyhow::Result<String> {
        let mut out = String::new();
        out.push_str(&format!("# Research Daily — {}\n\n", digest.date.format("%Y-%m-%d")));

        if digest.is_empty() {
            out.push_str("Nothing new today.\n");
            return Ok(out);
        }

        if !digest.reading_list.is_empty() {
            out.push_str("## Reading List\n\n");
            for item in &digest.reading_list {
                out.push_str(&reading_list_line(item));
                out.push('\n');
            }
            out.push('\n');
        }

        for (topic, items) in &digest.by_topic {
            if items.is_empty() {
                continue;
            }
            out.push_str(&format!("## {}\n\n", topic.display_name));
            for category in [Category::LabPulse, Category::DeepDive, Category::General] {
                let section: Vec<&ContentItem> =
                    items.iter().filter(|i| i.category == Some(category)).collect();
                if section.is_empty() {
                    continue;
                }
                out.push_str(&format!("### {}\n\n", category_heading(category)));
                for item in section {
                    out.push_str(&item_line(item));
                    out.push('\n');
                }
                out.push('\n');
            }
        }

        if !digest.must_follow.is_empty() {
            out.push_str("## Must-Follow\n\n");
            for item in &digest.must_follow {
                out.push_str(&item_line(item));
                out.push('\n');
            }
            out.push('\n');
        }

        Ok(out)
    }
}

fn category_heading(category: Category) -> &'static str {
    match category {
        Category::LabPulse => "Lab Pulse",
        Category::DeepDive => "Deep Dives",
        Category::General => "Around the Feeds",
    }
}

fn reading_list_line(item: &ContentItem) -> String {
    let mut line = format!("- [ ] [{}]({})", item.title, item.url);
    if let Some(author) = &item.author {
        line.push_str(&format!(" — @{}", author.trim_start_matches('@')));
    }
    if !item.topic_slug.is_empty() {
        line.push_str(&format!(" #{}", item.topic_slug));
    }
    line
}

fn item_line(item: &ContentItem) -> String {
    let mut line = format!("- [{}]({})", item.title, item.url);
    if let Some(author) = &item.author {
        line.push_str(&format!(" — @{}", author.trim_start_matches('@')));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{RawItem, Source};

    fn item(title: &str, url: &str, slug: &str, category: Category) -> ContentItem {
        ContentItem::from_raw(
            RawItem {
                url: url.into(),
                title: title.into(),
                author: Some("someone".into()),
                published_at: None,
                engagement: Default::default(),
                body: String::new(),
            },
            Source::Web,
            slug,
        )
        .with_category(category)
    }

    fn digest() -> RunDigest {
        let topic = TopicConfig {
            slug: "agents".into(),
            display_name: "Agents".into(),
            weight: 1.2,
            search_queries: vec![],
        };
        let a = item("Planner Loops", "https://a.example/p", "agents", Category::DeepDive);
        let b = item("Lab Ships Thing", "https://b.example/l", "agents", Category::LabPulse);
        RunDigest {
            date: NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
            reading_list: vec![a.clone(), b.clone()],
            by_topic: vec![(topic, vec![a, b])],
            must_follow: vec![],
        }
    }

    #[tokio::test]
    async fn reading_list_lines_carry_checkbox_and_topic_tag() {
        let text = PlainSynthesizer.summarize(&digest()).await.unwrap();
        assert!(text.contains("- [ ] [Planner Loops](https://a.example/p) — @someone #agents"));
        // Parseable by the tag sweep: the link survives as a markdown link.
        let links = crate::notes::extract_links(&text);
        assert!(links.iter().any(|l| l.title == "Planner Loops"));
    }

    #[tokio::test]
    async fn categories_render_lab_pulse_before_deep_dives() {
        let text = PlainSynthesizer.summarize(&digest()).await.unwrap();
        let lab = text.find("### Lab Pulse").unwrap();
        let deep = text.find("### Deep Dives").unwrap();
        assert!(lab < deep);
        assert!(text.starts_with("# Research Daily — 2026-08-29"));
    }

    #[tokio::test]
    async fn empty_digest_says_so() {
        let empty = RunDigest {
            date: NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
            reading_list: vec![],
            by_topic: vec![],
            must_follow: vec![],
        };
        let text = PlainSynthesizer.summarize(&empty).await.unwrap();
        assert!(text.contains("Nothing new today."));
    }
}
