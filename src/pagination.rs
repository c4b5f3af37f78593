//! Fixed-size page slicing over the merged result set.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 50;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PaginationMeta {
    /// 1-based, clamped into [1, total_pages].
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    /// Never zero: an empty result set is "page 1 of 1, empty".
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Slice `items` into the requested page.
///
/// page_size is clamped to [1, MAX_PAGE_SIZE]; a page past the end returns
/// the last page's content rather than an empty slice.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> (Vec<T>, PaginationMeta) {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let total = items.len();
    let total_pages = std::cmp::max(1, total.div_ceil(page_size));
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * page_size;
    let end = std::cmp::min(start + page_size, total);
    let slice = if start < total {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };

    let meta = PaginationMeta {
        page,
        page_size,
        total,
        total_pages,
        has_prev: page > 1,
        has_next: page < total_pages,
    };
    (slice, meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forty_five_items_make_three_pages() {
        let items: Vec<u32> = (0..45).collect();
        let (slice, meta) = paginate(&items, 1, 20);
        assert_eq!(slice.len(), 20);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn page_past_end_clamps_to_last() {
        let items: Vec<u32> = (0..45).collect();
        let (slice, meta) = paginate(&items, 10, 20);
        assert_eq!(meta.page, 3);
        assert_eq!(slice, (40..45).collect::<Vec<u32>>());
        assert!(meta.has_prev);
        assert!(!meta.has_next);
    }

    #[test]
    fn page_zero_clamps_up_to_one() {
        let items: Vec<u32> = (0..5).collect();
        let (_, meta) = paginate(&items, 0, 20);
        assert_eq!(meta.page, 1);
    }

    #[test]
    fn empty_input_is_one_empty_page() {
        let items: Vec<u32> = Vec::new();
        let (slice, meta) = paginate(&items, 1, 20);
        assert!(slice.is_empty());
        assert_eq!(meta.page, 1);
        assert_eq!(meta.total_pages, 1);
        assert!(!meta.has_prev);
        assert!(!meta.has_next);
    }

    #[test]
    fn page_size_is_bounded() {
        let items: Vec<u32> = (0..200).collect();
        let (slice, meta) = paginate(&items, 1, 500);
        assert_eq!(meta.page_size, MAX_PAGE_SIZE);
        assert_eq!(slice.len(), MAX_PAGE_SIZE);
        let (_, meta) = paginate(&items, 1, 0);
        assert_eq!(meta.page_size, 1);
    }

    #[test]
    fn page_item_counts_sum_to_total() {
        let items: Vec<u32> = (0..45).collect();
        let mut seen = 0;
        for page in 1..=3 {
            let (slice, _) = paginate(&items, page, 20);
            seen += slice.len();
        }
        assert_eq!(seen, items.len());
    }
}
