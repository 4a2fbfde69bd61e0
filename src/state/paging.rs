//! Index math for paginated collections.
//!
//! Pure conversions between `(page, offset-in-page)` and the flattened global index.
//! Pages are 1-based; offsets and global indices are 0-based.

/// Global index of the item at `item_index` on `page`.
pub fn global_index(page: usize, item_index: usize, page_size: usize) -> usize {
    page.saturating_sub(1) * page_size + item_index
}

/// Page containing `global_index`.
///
/// A zero page size has no meaningful answer; page 1 is returned.
pub fn page_from_global_index(global_index: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    global_index / page_size + 1
}

/// Whether an item follows `global_index` in a collection of `total_items`.
pub fn can_go_next(global_index: usize, total_items: usize) -> bool {
    global_index + 1 < total_items
}

/// Whether an item precedes `global_index`.
pub fn can_go_previous(global_index: usize) -> bool {
    global_index > 0
}

/// Number of pages needed for `total_items`. Zero items means zero pages.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size)
}

/// Clamp `page` into `[1, total_pages]`. With zero pages the result is 1.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.min(total_pages).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_index_is_zero_based_across_pages() {
        assert_eq!(global_index(1, 0, 20), 0);
        assert_eq!(global_index(1, 19, 20), 19);
        assert_eq!(global_index(2, 0, 20), 20);
        assert_eq!(global_index(3, 5, 10), 25);
    }

    #[test]
    fn page_from_global_index_finds_page_boundaries() {
        assert_eq!(page_from_global_index(0, 20), 1);
        assert_eq!(page_from_global_index(19, 20), 1);
        assert_eq!(page_from_global_index(20, 20), 2);
        assert_eq!(page_from_global_index(39, 20), 2);
    }

    #[test]
    fn next_and_previous_bounds() {
        assert!(!can_go_previous(0));
        assert!(can_go_previous(1));

        assert!(can_go_next(0, 2));
        assert!(!can_go_next(1, 2));
        assert!(!can_go_next(0, 0), "empty collection has no next");
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }

    #[test]
    fn zero_page_size_does_not_panic() {
        assert_eq!(total_pages(10, 0), 0);
        assert_eq!(page_from_global_index(10, 0), 1);
    }

    #[test]
    fn clamp_page_stays_in_range() {
        assert_eq!(clamp_page(0, 5), 1);
        assert_eq!(clamp_page(3, 5), 3);
        assert_eq!(clamp_page(9, 5), 5);
        assert_eq!(clamp_page(4, 0), 1, "no pages still yields page 1");
    }
}
