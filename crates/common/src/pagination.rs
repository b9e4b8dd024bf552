//! Pagination over ordered collections.
//!
//! A [`Paginator`] is built once from the configured page size and then used
//! per request. The raw `page` value coming from a query string is untrusted:
//! missing, non-numeric or non-positive values select the first page, values
//! past the end select the last page. Only a non-positive page size is an
//! error, and that is reported when the paginator is built.

use std::num::IntErrorKind;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("invalid configuration: page size must be positive, got {0}")]
    InvalidConfiguration(i64),
}

/// Validated page size plus the clamping rules for page requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
}

/// Resolved position of one page inside a collection of `total` items.
///
/// Shared by in-memory slicing and by `OFFSET`/`LIMIT` database queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based, already clamped
    pub number: usize,
    pub total: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub offset: usize,
    pub limit: usize,
}

/// One page of results plus navigation metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: usize,
    pub count: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Paginator {
    pub fn new(page_size: i64) -> Result<Self, PaginationError> {
        if page_size <= 0 {
            return Err(PaginationError::InvalidConfiguration(page_size));
        }
        let page_size = usize::try_from(page_size)
            .map_err(|_| PaginationError::InvalidConfiguration(page_size))?;
        Ok(Self { page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages needed for `total` items; zero for an empty collection.
    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.page_size)
    }

    /// Clamp a requested page number into `[1, total_pages]`.
    pub fn clamp(&self, requested: Option<i64>, total: usize) -> usize {
        let last = self.total_pages(total).max(1);
        match requested {
            Some(p) if p >= 1 => usize::try_from(p).map_or(last, |p| p.min(last)),
            _ => 1,
        }
    }

    pub fn window(&self, requested: Option<&str>, total: usize) -> PageWindow {
        let number = self.clamp(parse_page(requested), total);
        let offset = (number - 1) * self.page_size;
        let limit = self.page_size.min(total.saturating_sub(offset));
        PageWindow {
            number,
            total,
            total_pages: self.total_pages(total),
            page_size: self.page_size,
            offset,
            limit,
        }
    }

    /// Slice `items` for the requested page. `items` is left untouched.
    pub fn page<T: Clone>(&self, items: &[T], requested: Option<&str>) -> Page<T> {
        let window = self.window(requested, items.len());
        let slice = &items[window.offset..window.offset + window.limit];
        Page::from_window(window, slice.to_vec())
    }
}

/// One-shot form of [`Paginator::new`] followed by [`Paginator::page`].
pub fn paginate<T: Clone>(
    items: &[T],
    page_size: i64,
    requested: Option<&str>,
) -> Result<Page<T>, PaginationError> {
    Ok(Paginator::new(page_size)?.page(items, requested))
}

/// Lenient parse of a raw `page` query value.
///
/// Positive numbers too large for `i64` saturate so they still select the
/// last page; anything else unparsable is treated as absent.
pub fn parse_page(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim();
    match s.parse::<i64>() {
        Ok(n) => Some(n),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(i64::MAX),
        Err(_) => None,
    }
}

impl<T> Page<T> {
    /// Build a page from a resolved window and the items fetched for it.
    pub fn from_window(window: PageWindow, object_list: Vec<T>) -> Self {
        Self {
            object_list,
            number: window.number,
            count: window.total,
            total_pages: window.total_pages,
            page_size: window.page_size,
            has_previous: window.number > 1,
            has_next: window.number < window.total_pages,
        }
    }

    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous.then(|| self.number - 1)
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next.then(|| self.number + 1)
    }

    /// 1-based index of the first item on this page, 0 when the page is empty.
    pub fn start_index(&self) -> usize {
        if self.object_list.is_empty() {
            0
        } else {
            (self.number - 1) * self.page_size + 1
        }
    }

    /// 1-based index of the last item on this page, 0 when the page is empty.
    pub fn end_index(&self) -> usize {
        if self.object_list.is_empty() {
            0
        } else {
            self.start_index() + self.object_list.len() - 1
        }
    }

    pub fn page_range(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.total_pages
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            object_list: self.object_list.into_iter().map(f).collect(),
            number: self.number,
            count: self.count,
            total_pages: self.total_pages,
            page_size: self.page_size,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.object_list.iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.object_list.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn rejects_non_positive_page_size() {
        assert_eq!(Paginator::new(0), Err(PaginationError::InvalidConfiguration(0)));
        assert_eq!(Paginator::new(-4), Err(PaginationError::InvalidConfiguration(-4)));
        assert!(paginate(&items(3), 0, None).is_err());
    }

    #[test]
    fn thirteen_items_split_ten_and_three() {
        let p = Paginator::new(10).unwrap();
        let data = items(13);

        let first = p.page(&data, Some("1"));
        assert_eq!(first.len(), 10);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let second = p.page(&data, Some("2"));
        assert_eq!(second.object_list, vec![10, 11, 12]);
        assert!(!second.has_next);
        assert!(second.has_previous);
        assert_eq!(second.start_index(), 11);
        assert_eq!(second.end_index(), 13);
    }

    #[test]
    fn empty_collection_yields_empty_page() {
        let p = Paginator::new(10).unwrap();
        for raw in [None, Some("1"), Some("7"), Some("junk")] {
            let page = p.page::<usize>(&[], raw);
            assert!(page.is_empty());
            assert_eq!(page.total_pages, 0);
            assert_eq!(page.count, 0);
            assert_eq!(page.number, 1);
            assert!(!page.has_next && !page.has_previous);
            assert_eq!(page.start_index(), 0);
        }
    }

    #[test]
    fn malformed_or_missing_request_is_first_page() {
        let p = Paginator::new(5).unwrap();
        let data = items(12);
        let first = p.page(&data, Some("1"));
        for raw in [None, Some(""), Some("abc"), Some("0"), Some("-3"), Some("1.5")] {
            assert_eq!(p.page(&data, raw), first, "raw = {:?}", raw);
        }
    }

    #[test]
    fn past_the_end_clamps_to_last_page() {
        let p = Paginator::new(5).unwrap();
        let data = items(12);
        let last = p.page(&data, Some("3"));
        assert_eq!(last.object_list, vec![10, 11]);
        assert_eq!(p.page(&data, Some("8")), last);
        assert_eq!(p.page(&data, Some("99999999999999999999")), last);
        assert_eq!(p.page(&data, Some("+99999999999999999999")), last);
        assert_eq!(p.page(&data, Some("-99999999999999999999")), p.page(&data, None));
        assert_eq!(p.clamp(Some(i64::MAX), data.len()), 3);
    }

    #[test]
    fn oversized_page_numbers_saturate() {
        assert_eq!(parse_page(Some(" 99999999999999999999 ")), Some(i64::MAX));
        assert_eq!(parse_page(Some("-99999999999999999999")), None);
        assert_eq!(parse_page(Some("9999999999999999999x")), None);

        let p = Paginator::new(10).unwrap();
        let data = items(13);
        assert_eq!(p.page(&data, Some("99999999999999999999")), p.page(&data, Some("2")));
    }

    #[test]
    fn total_pages_is_ceiling() {
        for size in 1..=7i64 {
            let p = Paginator::new(size).unwrap();
            for total in 0..40usize {
                let expected = (total + size as usize - 1) / size as usize;
                assert_eq!(p.total_pages(total), expected);
                assert_eq!(p.total_pages(total) == 0, total == 0);
            }
        }
    }

    #[test]
    fn pages_partition_the_collection() {
        for size in 1..=6i64 {
            let p = Paginator::new(size).unwrap();
            for total in 0..25usize {
                let data = items(total);
                let pages = p.total_pages(total);
                let mut joined = Vec::new();
                for n in 1..=pages {
                    let page = p.page(&data, Some(&n.to_string()));
                    if n < pages {
                        assert_eq!(page.len(), size as usize);
                    }
                    joined.extend(page.object_list);
                }
                assert_eq!(joined, data);
            }
        }
    }

    #[test]
    fn window_matches_slice_bounds() {
        let p = Paginator::new(10).unwrap();
        let w = p.window(Some("2"), 13);
        assert_eq!((w.number, w.offset, w.limit, w.total_pages), (2, 10, 3, 2));
        let w = p.window(None, 0);
        assert_eq!((w.number, w.offset, w.limit, w.total_pages), (1, 0, 0, 0));
    }

    #[test]
    fn neighbours_and_range() {
        let p = Paginator::new(2).unwrap();
        let page = p.page(&items(7), Some("2"));
        assert_eq!(page.previous_page_number(), Some(1));
        assert_eq!(page.next_page_number(), Some(3));
        assert_eq!(page.page_range().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        let mapped = page.map(|i| i * 10);
        assert_eq!(mapped.object_list, vec![20, 30]);
    }

    #[test]
    fn serializes_navigation_fields() {
        let page = paginate(&items(3), 2, Some("2")).unwrap();
        let v = serde_json::to_value(&page).unwrap();
        assert_eq!(v["object_list"], serde_json::json!([2]));
        assert_eq!(v["number"], 2);
        assert_eq!(v["has_previous"], true);
        assert_eq!(v["has_next"], false);
    }
}
