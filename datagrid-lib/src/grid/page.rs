//! Page windows over a sorted record list.

use std::ops::Range;

/// A 1-based page position and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pagination {
    /// Current page, starting at 1.
    pub page: usize,
    /// Records per page. Zero is treated as one.
    pub page_size: usize,
}

impl Pagination {
    /// Creates a pagination at page 1.
    pub fn new(page_size: usize) -> Self {
        Self { page: 1, page_size }
    }

    /// Sets the page (clamped to at least 1).
    pub fn at(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    fn size(&self) -> usize {
        self.page_size.max(1)
    }

    /// The index range of the current page within `total` records.
    pub fn window(&self, total: usize) -> Range<usize> {
        let from = (self.page.max(1) - 1).saturating_mul(self.size()).min(total);
        let to = from.saturating_add(self.size()).min(total);
        from..to
    }

    /// The current page of `items`.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.window(items.len())]
    }

    /// Number of pages needed for `total` records. An empty list has one page.
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.size()).max(1)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(super::DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_partial_page() {
        let items: Vec<u32> = (0..25).collect();
        let page = Pagination::new(10).at(3);
        assert_eq!(page.slice(&items), &items[20..]);
        assert_eq!(page.slice(&items).len(), 5);
        assert_eq!(page.page_count(items.len()), 3);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let items: Vec<u32> = (0..5).collect();
        assert!(Pagination::new(10).at(2).slice(&items).is_empty());
    }

    #[test]
    fn test_page_zero_clamps() {
        let page = Pagination { page: 0, page_size: 0 };
        assert_eq!(page.window(3), 0..1);
        assert_eq!(Pagination::new(15).page_count(0), 1);
    }
}
