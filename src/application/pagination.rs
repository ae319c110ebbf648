//! Numbered pagination shared by every feed.

use serde::Serialize;

/// Number of posts rendered on one feed page.
pub const PAGE_SIZE: u32 = 10;

/// A 1-based page number.
///
/// Zero, negative and unparsable inputs clamp to the first page. Numbers past
/// the last page are kept so the caller receives an empty page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageNumber(u32);

impl PageNumber {
    pub const FIRST: Self = Self(1);

    pub fn new(value: i64) -> Self {
        if value < 1 {
            return Self::FIRST;
        }
        Self(u32::try_from(value).unwrap_or(u32::MAX))
    }

    /// Interpret a raw `?page=` value.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<i64>().ok())
            .map(Self::new)
            .unwrap_or(Self::FIRST)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn request(self, per_page: u32) -> PageRequest {
        let per_page = per_page.max(1);
        PageRequest {
            limit: per_page,
            offset: u64::from(self.0 - 1) * u64::from(per_page),
        }
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Limit/offset window handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub per_page: u32,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, number: PageNumber, per_page: u32, total_items: u64) -> Self {
        Self {
            items,
            number: number.get(),
            per_page: per_page.max(1),
            total_items,
        }
    }

    pub fn empty(number: PageNumber, per_page: u32) -> Self {
        Self::new(Vec::new(), number, per_page, 0)
    }

    /// Total page count; an empty collection still has one (empty) page.
    pub fn total_pages(&self) -> u32 {
        let pages = self.total_items.div_ceil(u64::from(self.per_page));
        u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_number(&self) -> Option<u32> {
        self.has_next().then(|| self.number + 1)
    }

    /// Previous page, pulled back onto the last real page when out of range.
    pub fn previous_number(&self) -> Option<u32> {
        self.has_previous()
            .then(|| (self.number - 1).min(self.total_pages()))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            total_items: self.total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_and_garbage_pages_clamp_to_first() {
        assert_eq!(PageNumber::new(0), PageNumber::FIRST);
        assert_eq!(PageNumber::new(-7), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("abc")), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(None), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some(" 3 ")).get(), 3);
    }

    #[test]
    fn request_window_follows_page_number() {
        let request = PageNumber::new(3).request(PAGE_SIZE);
        assert_eq!(request, PageRequest { limit: 10, offset: 20 });
    }

    #[test]
    fn page_navigation_for_thirteen_items() {
        let first: Page<u8> = Page::new(vec![0; 10], PageNumber::FIRST, PAGE_SIZE, 13);
        assert_eq!(first.total_pages(), 2);
        assert_eq!(first.next_number(), Some(2));
        assert_eq!(first.previous_number(), None);

        let second: Page<u8> = Page::new(vec![0; 3], PageNumber::new(2), PAGE_SIZE, 13);
        assert!(!second.has_next());
        assert_eq!(second.previous_number(), Some(1));
    }

    #[test]
    fn out_of_range_page_links_back_to_last_page() {
        let page: Page<u8> = Page::new(Vec::new(), PageNumber::new(9), PAGE_SIZE, 13);
        assert!(page.is_empty());
        assert!(!page.has_next());
        assert_eq!(page.previous_number(), Some(2));
    }

    #[test]
    fn empty_collection_has_single_page() {
        let page: Page<u8> = Page::empty(PageNumber::FIRST, PAGE_SIZE);
        assert_eq!(page.total_pages(), 1);
        assert!(!page.has_next());
    }
}
