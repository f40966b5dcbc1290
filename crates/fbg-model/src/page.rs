//! Derived pagination info.

use serde::{Deserialize, Serialize};

/// Non-authoritative view of the current page.
///
/// Pages are 1-based. Row numbers are 1-based and inclusive; both are `0`
/// when the dataset is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Rows per page.
    pub page_size: usize,
    /// Rows in the whole dataset.
    pub total_rows: usize,
    /// Current page.
    pub current_page: usize,
    /// `ceil(total_rows / page_size)`, at least 1.
    pub total_pages: usize,
    /// First row shown on the current page.
    pub first_row: usize,
    /// Last row shown on the current page, clamped to `total_rows`.
    pub last_row: usize,
}

impl PageInfo {
    /// Compute page info for `current_page`.
    ///
    /// A zero page size is treated as 1. The page is clamped into
    /// `1..=total_pages`.
    #[must_use]
    pub fn compute(total_rows: usize, page_size: usize, current_page: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = Self::pages_for(total_rows, page_size);
        let current_page = current_page.clamp(1, total_pages);

        let (first_row, last_row) = if total_rows == 0 {
            (0, 0)
        } else {
            let first = (current_page - 1) * page_size + 1;
            let last = (current_page * page_size).min(total_rows);
            (first, last)
        };

        Self {
            page_size,
            total_rows,
            current_page,
            total_pages,
            first_row,
            last_row,
        }
    }

    /// Number of pages for `total_rows`, at least 1.
    #[must_use]
    pub fn pages_for(total_rows: usize, page_size: usize) -> usize {
        total_rows.div_ceil(page_size.max(1)).max(1)
    }

    /// Whether `page` is a valid page number.
    #[must_use]
    pub fn contains_page(&self, page: usize) -> bool {
        (1..=self.total_pages).contains(&page)
    }

    /// Whether a next page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Whether a previous page exists.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// Number of rows on the current page.
    #[must_use]
    pub fn rows_on_page(&self) -> usize {
        if self.total_rows == 0 {
            0
        } else {
            self.last_row + 1 - self.first_row
        }
    }
}

impl Default for PageInfo {
    fn default() -> Self {
        Self::compute(0, 100, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_250_rows_by_100() {
        let info = PageInfo::compute(250, 100, 1);
        assert_eq!(info.total_pages, 3);

        let second = PageInfo::compute(250, 100, 2);
        assert_eq!((second.first_row, second.last_row), (101, 200));

        let third = PageInfo::compute(250, 100, 3);
        assert_eq!((third.first_row, third.last_row), (201, 250));
        assert_eq!(third.rows_on_page(), 50);
        assert!(!third.has_next());
        assert!(third.has_previous());
    }

    #[test]
    fn test_empty_dataset_has_one_page() {
        let info = PageInfo::compute(0, 100, 1);
        assert_eq!(info.total_pages, 1);
        assert_eq!((info.first_row, info.last_row), (0, 0));
        assert_eq!(info.rows_on_page(), 0);
    }

    #[test]
    fn test_page_is_clamped() {
        let info = PageInfo::compute(120, 50, 9);
        assert_eq!(info.current_page, 3);
        assert_eq!((info.first_row, info.last_row), (101, 120));
        assert!(!info.contains_page(0));
        assert!(!info.contains_page(4));
    }

    #[test]
    fn test_zero_page_size_is_one() {
        let info = PageInfo::compute(3, 0, 2);
        assert_eq!(info.page_size, 1);
        assert_eq!(info.total_pages, 3);
        assert_eq!((info.first_row, info.last_row), (2, 2));
    }
}
