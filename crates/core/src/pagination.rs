//! Page-number pagination.
//!
//! Clients select a page with `page` (1-based, or the literal `last`) and optionally a
//! `page_size`. The page size falls back to the configured default when it is missing or not a
//! positive integer, and is clamped to the configured maximum. An unusable page number is an
//! error; an empty collection still has a page 1.

use crate::config::PageSizing;
use crate::{RecordError, RecordResult};

/// The page a client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    Number(u64),
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: PageNumber,
    pub page_size: usize,
}

impl PageRequest {
    /// Builds a request from raw query parameter values.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::InvalidPage` if `page` is present but neither a positive integer nor
    /// `last`.
    pub fn from_query(
        page: Option<&str>,
        page_size: Option<&str>,
        sizing: PageSizing,
    ) -> RecordResult<Self> {
        let page = match page.map(str::trim) {
            None | Some("") => PageNumber::Number(1),
            Some("last") => PageNumber::Last,
            Some(raw) => match raw.parse::<u64>() {
                Ok(n) if n > 0 => PageNumber::Number(n),
                _ => return Err(RecordError::InvalidPage),
            },
        };

        let page_size = page_size
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .map_or(sizing.default_size(), |n| n.min(sizing.max_size()));

        Ok(Self { page, page_size })
    }
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub page_size: usize,
    pub total: usize,
    pub num_pages: u64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    /// Transforms the items while keeping the page position.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(Page {
            items,
            number: self.number,
            page_size: self.page_size,
            total: self.total,
            num_pages: self.num_pages,
        })
    }
}

/// Cuts the requested page out of `items`.
///
/// # Errors
///
/// Returns `RecordError::InvalidPage` if the page number is past the last page.
pub fn paginate<T>(items: Vec<T>, request: &PageRequest) -> RecordResult<Page<T>> {
    let total = items.len();
    let page_size = request.page_size.max(1);
    let num_pages = (total.div_ceil(page_size) as u64).max(1);

    let number = match request.page {
        PageNumber::Last => num_pages,
        PageNumber::Number(n) if n <= num_pages => n,
        PageNumber::Number(_) => return Err(RecordError::InvalidPage),
    };

    let start = (number as usize - 1) * page_size;
    let items = items.into_iter().skip(start).take(page_size).collect();

    Ok(Page {
        items,
        number,
        page_size,
        total,
        num_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizing() -> PageSizing {
        PageSizing::new(10, 100).unwrap()
    }

    #[test]
    fn test_from_query_defaults() {
        let req = PageRequest::from_query(None, None, sizing()).unwrap();
        assert_eq!(req.page, PageNumber::Number(1));
        assert_eq!(req.page_size, 10);
    }

    #[test]
    fn test_from_query_page_size_falls_back_and_clamps() {
        let size = |raw| PageRequest::from_query(None, Some(raw), sizing()).unwrap().page_size;
        assert_eq!(size("25"), 25);
        assert_eq!(size("0"), 10);
        assert_eq!(size("-5"), 10);
        assert_eq!(size("many"), 10);
        assert_eq!(size("1000"), 100);
    }

    #[test]
    fn test_from_query_rejects_bad_page_numbers() {
        for raw in ["0", "-1", "two", "1.5"] {
            assert!(matches!(
                PageRequest::from_query(Some(raw), None, sizing()),
                Err(RecordError::InvalidPage)
            ));
        }
        let req = PageRequest::from_query(Some("last"), None, sizing()).unwrap();
        assert_eq!(req.page, PageNumber::Last);
    }

    #[test]
    fn test_paginate_slices_pages() {
        let items: Vec<u32> = (1..=25).collect();
        let req = PageRequest {
            page: PageNumber::Number(2),
            page_size: 10,
        };
        let page = paginate(items, &req).unwrap();
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.previous_number(), Some(1));
        assert_eq!(page.next_number(), Some(3));
    }

    #[test]
    fn test_paginate_last_page() {
        let items: Vec<u32> = (1..=25).collect();
        let req = PageRequest {
            page: PageNumber::Last,
            page_size: 10,
        };
        let page = paginate(items, &req).unwrap();
        assert_eq!(page.number, 3);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert!(!page.has_next());
    }

    #[test]
    fn test_paginate_empty_collection_has_first_page_only() {
        let first = PageRequest {
            page: PageNumber::Number(1),
            page_size: 10,
        };
        let page = paginate(Vec::<u32>::new(), &first).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next() && !page.has_previous());

        let second = PageRequest {
            page: PageNumber::Number(2),
            page_size: 10,
        };
        assert!(matches!(
            paginate(Vec::<u32>::new(), &second),
            Err(RecordError::InvalidPage)
        ));
    }

    #[test]
    fn test_try_map_keeps_position() {
        let req = PageRequest {
            page: PageNumber::Number(2),
            page_size: 2,
        };
        let page = paginate(vec![1, 2, 3], &req).unwrap();
        let mapped: Page<String> = page
            .try_map(|n| Ok::<_, RecordError>(n.to_string()))
            .unwrap();
        assert_eq!(mapped.items, vec!["3".to_string()]);
        assert_eq!(mapped.number, 2);
        assert_eq!(mapped.total, 3);
    }
}
