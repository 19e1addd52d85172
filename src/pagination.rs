use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ApiError;

pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_OFFSET: i64 = 0;

/// Page
///
/// A validated `limit`/`offset` window. `limit` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

impl Page {
    /// parse
    ///
    /// Builds a window from raw query-string values. Absent or blank values take the
    /// defaults; anything that is not a non-negative integer (or a zero limit) is a 400.
    pub fn parse(limit: Option<&str>, offset: Option<&str>) -> Result<Self, ApiError> {
        let limit = parse_param(limit, DEFAULT_LIMIT)?;
        let offset = parse_param(offset, DEFAULT_OFFSET)?;
        if limit == 0 {
            return Err(invalid_window());
        }
        Ok(Self { limit, offset })
    }

    /// 1-based page number containing `offset`.
    pub fn number(&self) -> i64 {
        (self.offset / self.limit).saturating_add(1)
    }

    /// Number of pages needed for `total` items (0 when there are none).
    pub fn count_for(&self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        // Both operands are non-negative, so the unsigned ceiling cannot overflow.
        let pages = (total as u64).div_ceil(self.limit as u64);
        i64::try_from(pages).unwrap_or(i64::MAX)
    }

    /// The `[start, end)` slice of a `len`-item collection this window covers.
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX).min(len);
        let end = start
            .saturating_add(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .min(len);
        (start, end)
    }
}

fn parse_param(raw: Option<&str>, default: i64) -> Result<i64, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(invalid_window),
    }
}

fn invalid_window() -> ApiError {
    ApiError::Validation("Limit and offset must be valid positive integers".to_string())
}

/// PageMeta
///
/// The `metaData` object attached to every paginated response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PageMeta {
    pub page: i64,
    pub page_count: i64,
    /// Items in this page.
    pub count: i64,
    /// Items across all pages.
    pub total_count: i64,
}

impl PageMeta {
    pub fn new(page: Page, count: usize, total_count: i64) -> Self {
        Self {
            page: page.number(),
            page_count: page.count_for(total_count),
            count: i64::try_from(count).unwrap_or(i64::MAX),
            total_count,
        }
    }
}
