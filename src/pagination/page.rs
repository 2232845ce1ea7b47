//! Page slicing over an in-memory snapshot of a collection

use serde::Serialize;

/// A validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number as the client sent it
    pub page: usize,
    /// Maximum number of elements per page
    pub size: usize,
    /// `page` counts from 1 rather than 0
    pub one_indexed: bool,
}

/// A computed page over a collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// `ceil(total_elements / size)`
    pub total_pages: usize,
    /// Size of the whole collection
    pub total_elements: usize,
    /// Length of `content`
    pub number_of_elements: usize,
    /// This is the first page
    pub first: bool,
    /// This is the last page, or there are no pages
    pub last: bool,
    /// Requested page size
    pub size: usize,
    /// Echo of the requested page number
    pub number: usize,
    /// Elements on this page
    pub content: Vec<T>,
}

impl PageRequest {
    /// Zero-indexed request
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size, one_indexed: false }
    }

    /// Requested page translated to a zero-based index
    pub fn zero_based_page(&self) -> usize {
        if self.one_indexed {
            self.page.saturating_sub(1)
        } else {
            self.page
        }
    }
}

impl<T> Page<T> {
    /// Page metadata as `page-*` response headers
    pub fn header_pairs(&self) -> [(&'static str, String); 7] {
        [
            ("page-total-pages", self.total_pages.to_string()),
            ("page-total-elements", self.total_elements.to_string()),
            ("page-number-of-elements", self.number_of_elements.to_string()),
            ("page-first", self.first.to_string()),
            ("page-last", self.last.to_string()),
            ("page-size", self.size.to_string()),
            ("page-number", self.number.to_string()),
        ]
    }
}

/// Slice `data` according to `request`.
///
/// Never fails: pages past the end come back with empty content and
/// consistent `first`/`last` flags. A zero size yields an empty page with
/// zero total pages.
pub fn paginate<T>(data: Vec<T>, request: &PageRequest) -> Page<T> {
    let total_elements = data.len();
    let index = request.zero_based_page();

    let content: Vec<T> = match index.checked_mul(request.size) {
        Some(start) if request.size > 0 && start < total_elements => {
            data.into_iter().skip(start).take(request.size).collect()
        }
        _ => Vec::new(),
    };

    let total_pages = if request.size == 0 {
        0
    } else {
        total_elements.div_ceil(request.size)
    };

    Page {
        total_pages,
        total_elements,
        number_of_elements: content.len(),
        first: index == 0,
        last: total_pages == 0 || index == total_pages - 1,
        size: request.size,
        number: request.page,
        content,
    }
}
