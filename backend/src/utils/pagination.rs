//! Page-number pagination shared by list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 200;
const MAX_PAGE: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Builds a page request from raw query values.
    ///
    /// Missing, non-numeric or non-positive values fall back to the defaults
    /// instead of failing the request; `limit` is capped at `max_limit`.
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: i64,
        max_limit: i64,
    ) -> Self {
        let page = parse_positive(page)
            .unwrap_or(DEFAULT_PAGE)
            .min(MAX_PAGE);
        let limit = parse_positive(limit)
            .unwrap_or(default_limit)
            .min(max_limit.max(1));
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total_pages(total, request.limit),
        }
    }
}

/// `ceil(total / limit)`, zero when there is nothing to page through.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}
