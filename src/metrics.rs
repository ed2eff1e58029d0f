// src/metrics.rs
use metrics::describe_counter;
use once_cell::sync::OnceCell;

/// One-time metric descriptions, so series carry help text in whatever
/// recorder the host installs. Without a recorder the counters are no-ops.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "harvest_candidates_total",
            "Candidate links kept from listing pages."
        );
        describe_counter!(
            "harvest_source_errors_total",
            "Listing pages that failed to fetch or returned non-200."
        );
        describe_counter!("search_queries_total", "Search fallback queries issued.");
        describe_counter!(
            "search_hits_total",
            "Search fallback queries that yielded a matching document."
        );
        describe_counter!("download_saved_total", "Issues written to storage.");
        describe_counter!(
            "download_rejected_total",
            "Downloads discarded for bad status or content type."
        );
        describe_counter!(
            "download_errors_total",
            "Downloads that failed in transport or on write."
        );
    });
}
