use super::types::{PageRequest, Pagination};

/// One page of an ordered sequence plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Slice `[(page-1)*limit, page*limit)` out of `ordered`.
///
/// A page past the end is empty; `total` always counts the whole input.
#[must_use]
pub fn paginate<T: Clone>(ordered: &[T], req: PageRequest) -> Page<T> {
    let total = ordered.len();
    let start = req.offset().min(total);
    let end = start.saturating_add(req.limit()).min(total);
    Page { items: ordered[start..end].to_vec(), pagination: Pagination::new(total, req) }
}
