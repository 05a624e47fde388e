//! Page selection arithmetic
//!
//! Pages are 1-indexed everywhere in this module. The excluded set is always
//! kept sorted and deduplicated, so membership checks can binary search.

use thiserror::Error;

/// A requested page falls outside `1..=total_pages`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Page {page} does not exist. Document has {total_pages} pages.")]
pub struct InvalidPageRange {
    pub page: i64,
    pub total_pages: u32,
}

/// Pages `1..=total_pages` that are not excluded, in ascending order.
///
/// `excluded_pages` must be sorted, as [`validate_and_normalize`] returns it.
pub fn compute_active_pages(total_pages: u32, excluded_pages: &[u32]) -> Vec<u32> {
    (1..=total_pages)
        .filter(|page| excluded_pages.binary_search(page).is_err())
        .collect()
}

/// Dedupe and sort a candidate exclusion list, rejecting anything out of range.
///
/// The first offending value (in ascending order) is reported. Normalizing an
/// already-normalized list returns it unchanged.
pub fn validate_and_normalize(
    candidate_pages: &[i64],
    total_pages: u32,
) -> Result<Vec<u32>, InvalidPageRange> {
    let mut pages = candidate_pages.to_vec();
    pages.sort_unstable();
    pages.dedup();

    if let Some(&page) = pages
        .iter()
        .find(|&&p| p < 1 || p > i64::from(total_pages))
    {
        return Err(InvalidPageRange { page, total_pages });
    }

    Ok(pages.into_iter().map(|p| p as u32).collect())
}
