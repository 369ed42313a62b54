//! Fractional sort keys
//!
//! Siblings are ordered by a floating point `sortindex`. Repositioning an
//! entry never renumbers its siblings: the new key is the midpoint between
//! the two neighbours it lands between.

use std::cmp::Ordering;

use chrono::Utc;

use crate::model::Record;

/// Reads the ordering key of a record (`0.0` when absent).
pub fn sort_key(record: &Record) -> f64 {
    record.sort_index()
}

/// Total order over sort keys; NaN sorts last.
pub fn compare(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// Midpoint of two keys.
pub fn midpoint(lower: f64, upper: f64) -> f64 {
    (lower + upper) / 2.0
}

/// Key for an entry dropped in front of `target`.
///
/// `prev` is the key of the sibling preceding the target; the lower bound
/// is `0` when the target is first.
///
/// ```
/// use hierarchy_lib::sort_key::key_before;
///
/// assert_eq!(key_before(Some(1.0), 3.0), 2.0);
/// assert_eq!(key_before(None, 3.0), 1.5);
/// ```
pub fn key_before(prev: Option<f64>, target: f64) -> f64 {
    midpoint(prev.unwrap_or(0.0), target)
}

/// Key for an entry dropped behind `target`.
///
/// When the target is the last sibling the upper bound is the current
/// unix time in seconds, but never less than `target + 1`.
///
/// ```
/// use hierarchy_lib::sort_key::key_after;
///
/// assert_eq!(key_after(1.0, Some(3.0)), 2.0);
/// assert!(key_after(5.0, None) > 5.0);
/// ```
pub fn key_after(target: f64, next: Option<f64>) -> f64 {
    let upper = next.unwrap_or_else(|| open_upper_bound(target));
    midpoint(target, upper)
}

fn open_upper_bound(target: f64) -> f64 {
    let now = Utc::now().timestamp() as f64;
    now.max(target + 1.0)
}
