//! Limit/offset arithmetic for list endpoints.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_PAGE: i64 = 1;

/// Resolved paging window handed to the authoritative store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Build from raw query values. Missing, unparsable or non-positive values
    /// fall back to the defaults.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let limit = parse_positive(limit).unwrap_or(DEFAULT_LIMIT);
        let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
        Self {
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
}
