//! Offset pagination for list queries.

use serde::Serialize;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Create a request for `page` (1-based) holding at most `size` items.
    ///
    /// A page number of zero is treated as the first page.
    #[must_use]
    pub const fn new(page: u32, size: u32) -> Self {
        Self {
            page: if page == 0 { 1 } else { page },
            size,
        }
    }

    /// The 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of items on this page.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// `LIMIT` clause value.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    /// `OFFSET` clause value.
    ///
    /// Saturates at `i64::MAX`, which simply yields an empty page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1).saturating_mul(i64::from(self.size))
    }
}

/// One page of results plus the totals needed to navigate the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
    pub last: bool,
}

impl<T> Page<T> {
    /// Assemble a page from the rows fetched for `request` and the total row count.
    #[must_use]
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        let size = i64::from(request.size());
        let total_pages = if size == 0 {
            0
        } else {
            (total_elements + size - 1) / size
        };

        Self {
            content,
            page: request.page(),
            size: request.size(),
            total_elements,
            total_pages,
            last: i64::from(request.page()) >= total_pages,
        }
    }

    /// Transform every item, keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            last: self.last,
        }
    }
}
