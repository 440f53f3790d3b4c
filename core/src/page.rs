//! Pagination for the list endpoint.
//!
//! `page` and `limit` arrive as raw query strings. Absent keys take the
//! defaults; present values that do not parse as integers become `0`. No
//! range checks are applied, so the arithmetic here has to stay total for
//! any `i64` pair.

use serde::{Deserialize, Serialize};

use crate::types::Todo;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Page number and size exactly as the client asked for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: page.map_or(DEFAULT_PAGE, parse_or_zero),
            limit: limit.map_or(DEFAULT_LIMIT, parse_or_zero),
        }
    }

    /// `(page - 1) * limit`, saturating instead of overflowing.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// The row window handed to the store: a negative limit means no limit,
    /// a non-positive offset means start at the first row.
    pub fn window(&self) -> PageWindow {
        PageWindow {
            limit: (self.limit >= 0).then_some(self.limit),
            offset: self.offset().max(0),
        }
    }
}

fn parse_or_zero(raw: &str) -> i64 {
    raw.parse().unwrap_or(0)
}

/// Normalized `LIMIT` / `OFFSET` pair. `offset` is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: Option<i64>,
    pub offset: i64,
}

/// The pagination block of a list response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

/// Body of `GET /todos`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoPage {
    pub todos: Vec<Todo>,
    pub pagination: Pagination,
}

impl TodoPage {
    pub fn new(todos: Vec<Todo>, request: PageRequest, total: i64) -> Self {
        Self {
            todos,
            pagination: Pagination {
                page: request.page,
                limit: request.limit,
                total,
            },
        }
    }
}
