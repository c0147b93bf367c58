//! Bounded historical context for prediction requests

use hw_store::HardwareRecord;

/// Maximum number of historical records embedded in a prediction request.
/// Keeps the external payload bounded regardless of table size.
pub const CONTEXT_LIMIT: usize = 15;

/// Select the prediction context from the persisted history: most recently
/// created first, truncated to [`CONTEXT_LIMIT`].
///
/// Ids break commit-timestamp ties (bulk batches share one timestamp), so the
/// order is always exact insertion order, newest first. This is a
/// recency-biased slice, not a representative sample of the table.
#[must_use]
pub fn select_context(mut history: Vec<HardwareRecord>) -> Vec<HardwareRecord> {
    history.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    history.truncate(CONTEXT_LIMIT);
    history
}
