//! Page-number pagination for post listings.

use serde::Serialize;

/// A request for one page of a listing. Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(number: u64, per_page: u64) -> Self {
        Self {
            number: number.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Parse the raw `?page=` value. `None` means the first page; anything
    /// that is not a positive integer is rejected.
    pub fn parse(raw: Option<&str>, per_page: u64) -> Option<Self> {
        let number = match raw.map(str::trim) {
            None | Some("") => 1,
            Some(value) => value.parse::<u64>().ok().filter(|n| *n >= 1)?,
        };
        Some(Self::new(number, per_page))
    }

    /// Zero-based index of the first item on this page, or `None` when the
    /// page starts past the end of `total_items` items. The first page is
    /// always in range.
    pub fn offset_within(&self, total_items: u64) -> Option<u64> {
        let offset = (self.number - 1).checked_mul(self.per_page)?;
        (self.number == 1 || offset < total_items).then_some(offset)
    }
}

/// One page of results plus the numbers a paginator widget needs.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub num_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        let num_pages = total_items.div_ceil(request.per_page).max(1);
        Self {
            items,
            number: request.number,
            per_page: request.per_page,
            total_items,
            num_pages,
            has_previous: request.number > 1,
            has_next: request.number < num_pages,
        }
    }

    /// A page past the end of a listing. Page 1 of an empty listing is
    /// still a valid page.
    pub fn is_out_of_range(&self) -> bool {
        self.number > self.num_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            total_items: self.total_items,
            num_pages: self.num_pages,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_to_first_page() {
        assert_eq!(PageRequest::parse(None, 10), Some(PageRequest::new(1, 10)));
        assert_eq!(PageRequest::parse(Some(""), 10), Some(PageRequest::new(1, 10)));
    }

    #[test]
    fn test_parse_rejects_garbage_and_zero() {
        assert_eq!(PageRequest::parse(Some("abc"), 10), None);
        assert_eq!(PageRequest::parse(Some("0"), 10), None);
        assert_eq!(PageRequest::parse(Some("-1"), 10), None);
    }

    #[test]
    fn test_page_counts() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(2, 3), 7);
        assert_eq!(page.num_pages, 3);
        assert!(page.has_previous);
        assert!(page.has_next);
        assert_eq!(PageRequest::new(2, 3).offset_within(7), Some(3));
    }

    #[test]
    fn test_offset_past_the_end() {
        assert_eq!(PageRequest::new(1, 10).offset_within(0), Some(0));
        assert_eq!(PageRequest::new(2, 10).offset_within(10), None);
        assert_eq!(PageRequest::new(u64::MAX, 10).offset_within(25), None);
        assert_eq!(PageRequest::new(u64::MAX, u64::MAX).offset_within(u64::MAX), None);
    }

    #[test]
    fn test_huge_page_number_parses_but_is_out_of_range() {
        let request = PageRequest::parse(Some("18446744073709551615"), 10).unwrap();
        let page: Page<u8> = Page::new(vec![], request, 25);
        assert!(page.is_out_of_range());
        assert_eq!(page.num_pages, 3);
    }

    #[test]
    fn test_empty_listing_first_page_is_in_range() {
        let page: Page<u8> = Page::new(vec![], PageRequest::new(1, 10), 0);
        assert!(!page.is_out_of_range());
        let page: Page<u8> = Page::new(vec![], PageRequest::new(2, 10), 0);
        assert!(page.is_out_of_range());
    }
}
