// src/spam.rs
//! Spam filter: pattern families that flag misleading or engagement-bait
//! items before they enter scoring.
//!
//! Two families, each independently togglable:
//! - *claim/link mismatch*: the title promises official/authoritative
//!   content but the URL is not on the claim's allow-list of domains;
//! - *low effort*: short body, wholly unknown engagement, clickbait title.
//!
//! OR semantics: one family voting spam is enough. Priority and lab accounts
//! bypass the filter entirely.

use regex::Regex;

use crate::config::SpamDetection;
use crate::error::PipelineError;
use crate::item::ContentItem;

#[derive(Debug)]
struct CompiledClaim {
    claim: Regex,
    link_must_contain: Vec<String>,
}

#[derive(Debug)]
pub struct SpamFilter {
    enabled: bool,
    claim_link_enabled: bool,
    claims: Vec<CompiledClaim>,
    low_effort_enabled: bool,
    low_effort_min_chars: usize,
    low_effort: Vec<Regex>,
}

/// Verdict for one item: spam flag plus the family that voted, for the run
/// summary and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpamVerdict {
    pub is_spam: bool,
    pub reason: Option<String>,
}

impl SpamVerdict {
    fn clean() -> Self {
        Self {
            is_spam: false,
            reason: None,
        }
    }

    fn spam(reason: impl Into<String>) -> Self {
        Self {
            is_spam: true,
            reason: Some(reason.into()),
        }
    }
}

impl SpamFilter {
    /// Compile the configured patterns. A malformed regex is a config error,
    /// fatal at startup.
    pub fn from_config(cfg: &SpamDetection) -> Result<Self, PipelineError> {
        let claims = cfg
            .claim_link_mismatch
            .iter()
            .map(|p| {
                let claim = Regex::new(&p.claim_regex).map_err(|e| {
                    PipelineError::ConfigValidation(format!(
                        "claim regex `{}`: {}",
                        p.claim_regex, e
                    ))
                })?;
                Ok(CompiledClaim {
                    claim,
                    link_must_contain: p
                        .link_must_contain
                        .iter()
                        .map(|d| d.to_ascii_lowercase())
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        let low_effort = cfg
            .low_effort_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    PipelineError::ConfigValidation(format!("low-effort regex `{}`: {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        Ok(Self {
            enabled: cfg.enabled,
            claim_link_enabled: cfg.claim_link_enabled,
            claims,
            low_effort_enabled: cfg.low_effort_enabled,
            low_effort_min_chars: cfg.low_effort_min_chars,
            low_effort,
        })
    }

    /// Classify one item. Trusted senders (priority/lab accounts) are exempt.
    pub fn classify(&self, item: &ContentItem) -> SpamVerdict {
        if !self.enabled || item.is_priority_account || item.is_lab_account {
            return SpamVerdict::clean();
        }

        if self.claim_link_enabled {
            if let Some(reason) = self.claim_link_mismatch(item) {
                return SpamVerdict::spam(reason);
            }
        }
        if self.low_effort_enabled {
            if let Some(reason) = self.low_effort(item) {
                return SpamVerdict::spam(reason);
            }
        }
        SpamVerdict::clean()
    }

    fn claim_link_mismatch(&self, item: &ContentItem) -> Option<String> {
        let url = item.url.to_ascii_lowercase();
        for c in &self.claims {
            if !c.claim.is_match(&item.title) {
                continue;
            }
            let backed = c.link_must_contain.iter().any(|d| url.contains(d));
            if !c.link_must_contain.is_empty() && !backed {
                return Some(format!("claim-link-mismatch: `{}`", c.claim.as_str()));
            }
        }
        None
    }

    fn low_effort(&self, item: &ContentItem) -> Option<String> {
        if item.body_length >= self.low_effort_min_chars {
            return None;
        }
        if !item.engagement.is_unknown() {
            return None;
        }
        for re in &self.low_effort {
            if re.is_match(&item.title) {
                return Some(format!("low-effort: `{}`", re.as_str()));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClaimLinkPattern, SpamDetection};
    use crate::item::{ContentItem, Engagement, RawItem, Source};

    fn filter() -> SpamFilter {
        SpamFilter::from_config(&SpamDetection {
            enabled: true,
            claim_link_enabled: true,
            claim_link_mismatch: vec![ClaimLinkPattern {
                claim_regex: r"(?i)official (anthropic|openai) (guide|docs)".into(),
                link_must_contain: vec!["anthropic.com".into(), "openai.com".into()],
            }],
            low_effort_enabled: true,
            low_effort_min_chars: 80,
            low_effort_patterns: vec![r"(?i)^breaking".into(), r"\?!$".into()],
        })
        .unwrap()
    }

    fn item(title: &str, url: &str, body: &str, engagement: Engagement) -> ContentItem {
        ContentItem::from_raw(
            RawItem {
                url: url.into(),
                title: title.into(),
                author: None,
                published_at: None,
                engagement,
                body: body.into(),
            },
            Source::X,
            "agents",
        )
    }

    #[test]
    fn claim_without_backing_link_is_spam() {
        let f = filter();
        let v = f.classify(&item(
            "The OFFICIAL Anthropic guide to agents",
            "https://random.example.com/post",
            "a long enough body that is clearly not low effort and keeps going for a while here",
            Engagement::new().with("likes", 500),
        ));
        assert!(v.is_spam);
        assert!(v.reason.unwrap().starts_with("claim-link-mismatch"));
    }

    #[test]
    fn claim_with_backing_link_is_clean() {
        let f = filter();
        let v = f.classify(&item(
            "Official Anthropic docs update",
            "https://docs.anthropic.com/agents",
            "",
            Engagement::new(),
        ));
        assert!(!v.is_spam);
    }

    #[test]
    fn low_effort_needs_all_three_signals() {
        let f = filter();
        // Short body + unknown engagement + clickbait title: spam.
        let v = f.classify(&item(
            "BREAKING: you will not believe this",
            "https://example.com/x",
            "tiny",
            Engagement::new(),
        ));
        assert!(v.is_spam);

        // Known engagement breaks the conjunction.
        let v = f.classify(&item(
            "BREAKING: you will not believe this",
            "https://example.com/x",
            "tiny",
            Engagement::new().with("likes", 3),
        ));
        assert!(!v.is_spam);

        // Long body breaks it too.
        let long_body = "b".repeat(200);
        let v = f.classify(&item(
            "BREAKING: you will not believe this",
            "https://example.com/x",
            &long_body,
            Engagement::new(),
        ));
        assert!(!v.is_spam);
    }

    #[test]
    fn trusted_accounts_bypass_detection() {
        let f = filter();
        let spammy = item(
            "BREAKING: official OpenAI guide?!",
            "https://random.example.com",
            "",
            Engagement::new(),
        )
        .with_account_flags(true, false);
        assert!(!f.classify(&spammy).is_spam);
    }

    #[test]
    fn disabled_families_do_not_vote() {
        let mut cfg = SpamDetection {
            enabled: true,
            claim_link_enabled: false,
            claim_link_mismatch: vec![],
            low_effort_enabled: false,
            low_effort_min_chars: 80,
            low_effort_patterns: vec![r"(?i)^breaking".into()],
        };
        cfg.claim_link_mismatch.push(ClaimLinkPattern {
            claim_regex: r"(?i)official".into(),
            link_must_contain: vec!["anthropic.com".into()],
        });
        let f = SpamFilter::from_config(&cfg).unwrap();
        let v = f.classify(&item(
            "BREAKING: official announcement",
            "https://random.example.com",
            "",
            Engagement::new(),
        ));
        assert!(!v.is_spam);
    }

    #[test]
    fn bad_regex_is_a_config_error() {
        let cfg = SpamDetection {
            enabled: true,
            low_effort_patterns: vec!["(unclosed".into()],
            ..Default::default()
        };
        assert!(SpamFilter::from_config(&cfg).is_err());
    }
}
