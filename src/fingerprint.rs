// src/fingerprint.rs
//! Content fingerprints: the `(normalized_url, normalized_title)` key used for
//! every dedup comparison. Two items with the same fingerprint are duplicates
//! regardless of source.
//!
//! Normalization: lower-case; strip tracking query parameters from URLs;
//! collapse whitespace in titles.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Query parameters that trackers append and that never identify content.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "ref", "ref_src", "s", "t"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint {
    pub url: String,
    pub title: String,
}

impl Fingerprint {
    pub fn of(url: &str, title: &str) -> Self {
        Self {
            url: normalize_url(url),
            title: normalize_title(title),
        }
    }

    /// Short hex digest for logs and promotion records; never used for
    /// equality (the normalized pair is the key).
    pub fn digest(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.url.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.title.as_bytes());
        let out = hasher.finalize();
        let mut hex = String::with_capacity(16);
        for b in out.iter().take(8) {
            use std::fmt::Write as _;
            let _ = write!(&mut hex, "{:02x}", b);
        }
        hex
    }
}

/// Lower-case the URL, drop the fragment and any tracking query parameters,
/// and trim a trailing slash.
pub fn normalize_url(url: &str) -> String {
    let lower = url.trim().to_ascii_lowercase();
    let no_frag = lower.split('#').next().unwrap_or("").to_string();

    let (base, query) = match no_frag.split_once('?') {
        Some((b, q)) => (b.to_string(), Some(q)),
        None => (no_frag, None),
    };

    let mut out = base.trim_end_matches('/').to_string();
    if let Some(q) = query {
        let kept: Vec<&str> = q
            .split('&')
            .filter(|pair| {
                let key = pair.split('=').next().unwrap_or("");
                !key.starts_with("utm_") && !TRACKING_PARAMS.contains(&key)
            })
            .collect();
        if !kept.is_empty() {
            out.push('?');
            out.push_str(&kept.join("&"));
        }
    }
    out
}

/// Lower-case and collapse internal whitespace.
pub fn normalize_title(title: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    re.replace_all(title.trim(), " ").to_ascii_lowercase()
}
