//! Collection helpers for ranked listings

use std::cmp::Ordering;

/// Sort `items` by `key_fn` descending and keep the first `limit`.
///
/// Uses the stable `sort_by`, so items with equal keys keep their input order.
/// NaN keys compare via `total_cmp` and therefore never panic.
pub fn top_n_desc_by<T, F>(mut items: Vec<T>, limit: usize, key_fn: F) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    sort_desc_by(&mut items, key_fn);
    items.truncate(limit);
    items
}

/// Stable in-place descending sort on an `f64` key
pub fn sort_desc_by<T, F>(items: &mut [T], key_fn: F)
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| desc(key_fn(a), key_fn(b)));
}

#[inline]
fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
