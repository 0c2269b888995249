//! Pagination utilities for corpus listings

/// Default page size for listings
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page size a caller may request
pub const MAX_PAGE_SIZE: usize = 500;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Items per page
    pub size: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Index of the first item on this page
    pub offset: usize,
}

/// Calculate pagination metadata from total results and requested page
///
/// Ensures page is within valid bounds [1, total_pages] and size within
/// [1, MAX_PAGE_SIZE].
///
/// # Examples
/// ```
/// use chordmind_corpus::pagination::calculate_pagination;
///
/// // 45 total results at 20 per page = 3 pages (20 + 20 + 5)
/// let p = calculate_pagination(45, 2, 20);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 20);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(45, 99, 20);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 40);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: usize, requested_size: usize) -> Pagination {
    let size = requested_size.clamp(1, MAX_PAGE_SIZE);
    let total_pages = total_results.div_ceil(size);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * size;

    Pagination {
        page,
        size,
        total_pages,
        offset,
    }
}
