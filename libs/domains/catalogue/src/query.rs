//! Pure query helpers: tag normalisation, stable ordering and page windows.

use std::collections::HashSet;

use crate::models::{Sock, SortOrder};

/// Trim tags, drop blanks and duplicates. First occurrence wins.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Split a comma separated `tags` parameter.
pub fn split_tags(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}

/// Sort in place. `sort_by` is stable, so equal keys keep store order.
pub fn sort_socks(socks: &mut [Sock], order: SortOrder) {
    socks.sort_by(|a, b| order.compare(a, b));
}

/// Half-open index window `[start, end)` for a page, clipped to `len`.
///
/// `page_size <= 0` selects everything and `page_num < 1` is the first page.
pub fn page_window(len: usize, page_num: i64, page_size: i64) -> (usize, usize) {
    if page_size <= 0 {
        return (0, len);
    }

    let page = page_num.max(1) as u128;
    let size = page_size as u128;
    let start = ((page - 1) * size).min(len as u128) as usize;
    let end = (page * size).min(len as u128) as usize;
    (start, end)
}

/// Cut one page out of an already filtered and sorted listing.
pub fn paginate<T>(items: Vec<T>, page_num: i64, page_size: i64) -> Vec<T> {
    let (start, end) = page_window(items.len(), page_num, page_size);
    items.into_iter().skip(start).take(end - start).collect()
}
