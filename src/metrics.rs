// src/metrics.rs
//! Metric names and one-time registration so series have descriptions when a
//! recorder is installed.

use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

pub const SCAN_FETCHED_TOTAL: &str = "scan_fetched_total";
pub const SCAN_SPAM_TOTAL: &str = "scan_spam_dropped_total";
pub const SCAN_FLOOR_TOTAL: &str = "scan_floor_dropped_total";
pub const SCAN_DUP_TOTAL: &str = "scan_duplicate_dropped_total";
pub const SCAN_KEPT_TOTAL: &str = "scan_kept_total";
pub const FETCH_ERRORS_TOTAL: &str = "scan_fetch_errors_total";
pub const PROMOTIONS_TOTAL: &str = "promotions_total";
pub const FEEDBACK_TOTAL: &str = "feedback_total";
pub const RUN_LAST_TS: &str = "pipeline_last_run_ts";

/// One-time metrics registration.
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(SCAN_FETCHED_TOTAL, "Raw items returned by fetch providers.");
        describe_counter!(SCAN_SPAM_TOTAL, "Items dropped by the spam filter.");
        describe_counter!(SCAN_FLOOR_TOTAL, "Items dropped at the engagement floor.");
        describe_counter!(SCAN_DUP_TOTAL, "Items dropped as duplicates.");
        describe_counter!(SCAN_KEPT_TOTAL, "Items surviving to the ranked output.");
        describe_counter!(FETCH_ERRORS_TOTAL, "Per-topic fetch failures.");
        describe_counter!(PROMOTIONS_TOTAL, "Keep-tag promotions committed.");
        describe_counter!(FEEDBACK_TOTAL, "Feedback tags resolved.");
        describe_gauge!(RUN_LAST_TS, "Unix ts of the last pipeline run.");
    });
}
