// src/notes.rs
//! Markdown note parsing primitives shared by the history index and the
//! promotion tracker: link extraction, heading titles, and tagged reading-list
//! lines. Keeps both consumers decoupled from the corpus's serialization
//! details.

use once_cell::sync::OnceCell;
use regex::Regex;

/// A `[title](url)` link occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteLink {
    pub title: String,
    pub url: String,
}

/// Tags the operator applies to reading-list lines, plus their resolved forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Keep,
    Good,
    Bad,
}

impl Tag {
    pub fn pending(&self) -> &'static str {
        match self {
            Tag::Keep => "#keep",
            Tag::Good => "#good",
            Tag::Bad => "#bad",
        }
    }

    pub fn resolved(&self) -> &'static str {
        match self {
            Tag::Keep => "#kept",
            Tag::Good => "#good-noted",
            Tag::Bad => "#bad-noted",
        }
    }
}

const ALL_TAGS: [Tag; 3] = [Tag::Keep, Tag::Good, Tag::Bad];

/// One pending tag occurrence in a note.
#[derive(Debug, Clone)]
pub struct TaggedLine {
    /// 0-based line number within the note.
    pub line: usize,
    pub tag: Tag,
    pub raw: String,
    /// The markdown link on the line, if any.
    pub link: Option<NoteLink>,
    /// First `#slug`-style topic tag on the line, if any.
    pub topic_slug: Option<String>,
}

fn link_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]\((https?://[^\s\)]+)\)").expect("link regex"))
}

/// Extract every markdown link from a note.
pub fn extract_links(text: &str) -> Vec<NoteLink> {
    link_re()
        .captures_iter(text)
        .map(|c| NoteLink {
            title: c[1].trim().to_string(),
            url: c[2].to_string(),
        })
        .collect()
}

/// Extract bare URLs not wrapped in a markdown link.
pub fn extract_bare_urls(text: &str) -> Vec<String> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE
        .get_or_init(|| Regex::new(r#"https?://[^\s\)\]>"']+"#).expect("url regex"));
    re.find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']).to_string())
        .collect()
}

/// Extract `##`–`####` heading titles. Short headings ("Summary", "X") are
/// section labels, not content titles, and are skipped.
pub fn extract_headings(text: &str) -> Vec<String> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"(?m)^#{2,4}\s+(.+)$").expect("heading regex"));
    re.captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .filter(|t| t.chars().count() > 10)
        .collect()
}

/// Scan a note for reading-list lines carrying a pending tag.
///
/// A line whose tag already appears in resolved form is skipped, which is what
/// makes repeated sweeps idempotent.
pub fn parse_tagged_lines(text: &str) -> Vec<TaggedLine> {
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        for tag in ALL_TAGS {
            if !has_pending_tag(line, tag) {
                continue;
            }
            let link = extract_links(line).into_iter().next();
            out.push(TaggedLine {
                line: i,
                tag,
                raw: line.to_string(),
                link,
                topic_slug: first_topic_tag(line),
            });
        }
    }
    out
}

/// True when `line` carries `tag` in pending form. `#keep` must not match
/// inside `#kept`, and a `#good-noted` occurrence is already resolved.
fn has_pending_tag(line: &str, tag: Tag) -> bool {
    let pending = tag.pending();
    let mut rest = line;
    while let Some(pos) = rest.find(pending) {
        let after = &rest[pos + pending.len()..];
        let boundary = after
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric() && c != '-' && c != '_')
            .unwrap_or(true);
        if boundary {
            return true;
        }
        rest = after;
    }
    false
}

/// First `#slug` on the line that is not one of the workflow tags.
fn first_topic_tag(line: &str) -> Option<String> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"#([a-z0-9][a-z0-9_-]*)").expect("tag regex"));
    let workflow: [&str; 6] = [
        "keep",
        "kept",
        "good",
        "good-noted",
        "bad",
        "bad-noted",
    ];
    for c in re.captures_iter(line) {
        let tag = c[1].to_string();
        if !workflow.contains(&tag.as_str()) {
            return Some(tag);
        }
    }
    None
}

/// Rewrite the line's pending tag into its resolved form.
pub fn resolve_tag_in_line(line: &str, tag: Tag) -> String {
    line.replacen(tag.pending(), tag.resolved(), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_and_bare_urls_are_extracted() {
        let text = "- [ ] [A Post](https://example.com/p?x=1) — notes\nsee https://raw.example.com/x.";
        let links = extract_links(text);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].title, "A Post");
        assert_eq!(links[0].url, "https://example.com/p?x=1");
        assert_eq!(extract_bare_urls(text).last().unwrap(), "https://raw.example.com/x");
    }

    #[test]
    fn short_headings_are_skipped() {
        let text = "## Summary\n### A longer heading that names content\n";
        let h = extract_headings(text);
        assert_eq!(h, vec!["A longer heading that names content".to_string()]);
    }

    #[test]
    fn kept_does_not_count_as_keep() {
        assert!(has_pending_tag("- [x](https://a) #keep", Tag::Keep));
        assert!(!has_pending_tag("- [x](https://a) #kept", Tag::Keep));
        assert!(!has_pending_tag("- [x](https://a) #good-noted", Tag::Good));
    }

    #[test]
    fn tagged_lines_carry_link_and_topic() {
        let text = "\
# Daily\n\
- [ ] [Agent Post](https://example.com/agent) — neat #keep #agents\n\
- [ ] [Other](https://example.com/o) — meh #bad\n\
- [ ] [Done](https://example.com/d) #kept\n";
        let lines = parse_tagged_lines(text);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line, 1);
        assert_eq!(lines[0].tag, Tag::Keep);
        assert_eq!(lines[0].topic_slug.as_deref(), Some("agents"));
        assert_eq!(lines[1].tag, Tag::Bad);
    }

    #[test]
    fn resolving_rewrites_only_the_tag() {
        let line = "- [ ] [A](https://a) #keep #agents";
        assert_eq!(
            resolve_tag_in_line(line, Tag::Keep),
            "- [ ] [A](https://a) #kept #agents"
        );
    }
}
