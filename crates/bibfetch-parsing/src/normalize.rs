//! Trailing-locant cleanup for merged entries.

use once_cell::sync::Lazy;
use regex::Regex;

/// A period followed by a run of digits, commas, spaces, or full-width
/// commas, anchored at the very end of the entry.
static LOCANT_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[0-9,， ]+$").unwrap());

/// Strip dangling page/volume locants that layout re-flow appends after the
/// true sentence end, leaving a single terminating period. Idempotent: an
/// already-clean entry passes through unchanged.
pub fn normalize_entry(entry: &str) -> String {
    LOCANT_TAIL.replace(entry, ".").into_owned()
}
