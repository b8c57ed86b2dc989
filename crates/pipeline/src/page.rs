//! Pagination parameters and the standardized page result shape.

use serde::{Deserialize, Serialize};

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// One-based pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub fn new(number: u32, size: u32) -> Self {
        Self { number, size }
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.number.saturating_sub(1) as usize) * (self.size as usize)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { number: 1, size: 25 }
    }
}

/// A page of results. Always reports the requested page parameters and the
/// total count across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageOf<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total: u64,
}

impl<T> PageOf<T> {
    /// Slice one page out of the full, already-sorted result set.
    pub fn slice(page: Page, all: Vec<T>) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(page.offset())
            .take(page.size as usize)
            .collect();
        Self {
            items,
            number: page.number,
            size: page.size,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_takes_the_first_size_items() {
        let page = PageOf::slice(Page::new(1, 10), (0..25).collect::<Vec<_>>());
        assert_eq!(page.items, (0..10).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
    }

    #[test]
    fn last_partial_page_returns_the_remainder() {
        let page = PageOf::slice(Page::new(3, 10), (0..25).collect::<Vec<_>>());
        assert_eq!(page.items, (20..25).collect::<Vec<_>>());
        assert_eq!(page.number, 3);
        assert_eq!(page.size, 10);
    }

    #[test]
    fn page_past_the_end_is_empty_but_keeps_total() {
        let page = PageOf::slice(Page::new(9, 10), (0..25).collect::<Vec<_>>());
        assert!(page.items.is_empty());
        assert_eq!(page.total, 25);
    }
}
