//! Local pagination over a cached pool.

/// Slice `items` for a 1-based `page`.
///
/// Returns `items[(page-1)*page_size .. page*page_size]`, shorter at the
/// tail and empty past the end. Page 0 and a zero page size yield an empty
/// slice rather than an error.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed to show `len` items.
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        len.div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_middle_pages() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(page_slice(&items, 1, 10), &items[0..10]);
        assert_eq!(page_slice(&items, 2, 10), &items[10..20]);
    }

    #[test]
    fn tail_page_is_short() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(page_slice(&items, 3, 10), &[20, 21, 22, 23, 24]);
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        let items: Vec<u32> = (0..25).collect();
        assert!(page_slice(&items, 4, 10).is_empty());
        assert!(page_slice(&items, usize::MAX, 10).is_empty());
        assert!(page_slice(&items, 0, 10).is_empty());
        assert!(page_slice::<u32>(&[], 1, 10).is_empty());
    }

    #[test]
    fn counts_pages() {
        assert_eq!(page_count(25, 10), 3);
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(5, 0), 0);
    }
}
