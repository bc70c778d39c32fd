//! Page slicing for result lists
//!
//! Successful search results can hold thousands of aligned peptides, so poll
//! endpoints return them one page at a time together with a [`Pagination`]
//! descriptor the client uses to navigate.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default number of items per page
pub const DEFAULT_LIMIT: usize = 100;

/// Smallest page size a client may request
pub const MIN_LIMIT: usize = 10;

/// Largest page size a client may request
pub const MAX_LIMIT: usize = 100;

/// Navigation descriptor for one page of a list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Index of the first item on this page
    pub current_index: usize,
    /// Length of the whole list
    pub total: usize,
    /// 1-based page number
    pub current_page: usize,
    /// Number of pages the list spans
    pub total_pages: usize,
    /// Start index of the previous page (clamped to 0)
    pub previous_start: usize,
    /// Start index of the next page (clamped to the last page)
    pub next_start: usize,
    /// Whether this is the first page
    pub is_first_page: bool,
    /// Whether this is the last page
    pub is_last_page: bool,
}

impl Pagination {
    /// Descriptor for an empty list
    pub fn empty() -> Self {
        Self {
            current_index: 0,
            total: 0,
            current_page: 1,
            total_pages: 0,
            previous_start: 0,
            next_start: 0,
            is_first_page: true,
            is_last_page: true,
        }
    }
}

/// One page of items plus its navigation descriptor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WithPagination<T> {
    /// Items on this page
    pub data: Vec<T>,
    /// Navigation descriptor
    pub pagination: Pagination,
}

/// A resolved page request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationRequest {
    /// 1-based page number (at least 1)
    pub page: usize,
    /// Page size, clamped to `[MIN_LIMIT, MAX_LIMIT]`
    pub limit: usize,
    /// Index of the first item, `(page - 1) * limit`
    pub start: usize,
}

impl PaginationRequest {
    /// Resolve raw `page`/`limit` query values
    ///
    /// Missing values fall back to page 1 and `limit_fallback`. Pages below 1
    /// are raised to 1 and the limit is clamped to `[MIN_LIMIT, MAX_LIMIT]`.
    /// Non-integer values are rejected.
    pub fn resolve(page: Option<&str>, limit: Option<&str>, limit_fallback: usize) -> Result<Self> {
        let page = match page.filter(|p| !p.is_empty()) {
            Some(raw) => parse_query_int("page", raw)?,
            None => 1,
        };
        let limit = match limit.filter(|l| !l.is_empty()) {
            Some(raw) => parse_query_int("limit", raw)?,
            None => limit_fallback as i64,
        };

        let page = page.max(1) as usize;
        let limit = limit.clamp(MIN_LIMIT as i64, MAX_LIMIT as i64) as usize;

        Ok(Self {
            page,
            limit,
            start: page_start(page, limit)?,
        })
    }
}

/// Index of the first item of the 1-based `page`
fn page_start(page: usize, limit: usize) -> Result<usize> {
    (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| Error::Validation(format!("Page {} is out of range.", page)))
}

fn parse_query_int(name: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Validation(format!("{} must be an integer, got {:?}", name, raw)))
}

/// Build the navigation descriptor for a page starting at `start`
///
/// `step` is the page size. Fails when `step` is zero or when `start` lies
/// past the end of a non-empty list.
pub fn create_pagination(start: usize, total: usize, step: usize) -> Result<Pagination> {
    if step < 1 {
        return Err(Error::Validation(
            "Step must be a non-zero positive integer.".to_string(),
        ));
    }
    if total != 0 && start >= total {
        return Err(Error::Validation(
            "Start must be lesser than total. Make sure you have passed a valid page in query parameters."
                .to_string(),
        ));
    }

    let current_page = if total == 0 { 1 } else { start / step + 1 };
    let total_pages = total.div_ceil(step);

    Ok(Pagination {
        current_index: start,
        total,
        current_page,
        total_pages,
        previous_start: if total == 0 {
            0
        } else {
            start.saturating_sub(step)
        },
        next_start: start
            .saturating_add(step)
            .min(total_pages.saturating_sub(1) * step),
        is_first_page: current_page == 1 || total == 0,
        is_last_page: current_page == total_pages || total == 0,
    })
}

/// Slice `items` into the 1-based `page` of size `limit`
pub fn paginate_list<T: Clone>(items: &[T], page: usize, limit: usize) -> Result<WithPagination<T>> {
    if page < 1 {
        return Err(Error::Validation("Page must be at least 1.".to_string()));
    }

    let start = page_start(page, limit)?;
    let pagination = create_pagination(start, items.len(), limit)?;
    let end = start.saturating_add(limit).min(items.len());
    let data = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();

    Ok(WithPagination { data, pagination })
}
