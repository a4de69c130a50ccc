//! Offset pagination shared by repositories and services.

use serde::{Deserialize, Serialize};

/// Default page size when a caller does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Upper bound applied by [`PageRequest::clamped`].
pub const MAX_PAGE_SIZE: usize = 500;

/// A zero-based page index and a page size.
///
/// ```
/// use enroll_core::pagination::PageRequest;
///
/// let third = PageRequest::of(2, 20);
/// assert_eq!(third.offset(), 40);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn of(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    /// Number of items to skip.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    /// Size forced into `1..=MAX_PAGE_SIZE`.
    pub fn clamped(self) -> Self {
        Self {
            page: self.page,
            size: self.size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Either a page window or "everything".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pageable {
    Unpaged,
    Paged(PageRequest),
}

impl From<PageRequest> for Pageable {
    fn from(request: PageRequest) -> Self {
        Pageable::Paged(request)
    }
}

/// One page of results plus the total across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// Zero-based index of this page.
    pub page: usize,
    /// Requested page size; equals `items.len()` for unpaged results.
    pub size: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            size: request.size,
        }
    }

    /// A single page holding every item.
    pub fn unpaged(items: Vec<T>) -> Self {
        let size = items.len();
        Self {
            total: size as u64,
            items,
            page: 0,
            size,
        }
    }

    /// An empty page for `request`, keeping the real `total`.
    pub fn empty(total: u64, request: PageRequest) -> Self {
        Self::new(Vec::new(), total, request)
    }

    /// Slice an in-memory, already ordered list into the requested window.
    pub fn from_slice(all: Vec<T>, pageable: Pageable) -> Self {
        match pageable {
            Pageable::Unpaged => Self::unpaged(all),
            Pageable::Paged(request) => {
                let total = all.len() as u64;
                let items = all
                    .into_iter()
                    .skip(request.offset())
                    .take(request.size)
                    .collect();
                Self::new(items, total, request)
            }
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            1
        } else {
            self.total.div_ceil(self.size as u64)
        }
    }

    pub fn has_next(&self) -> bool {
        let seen = self
            .page
            .saturating_mul(self.size)
            .saturating_add(self.items.len());
        (seen as u64) < self.total
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
