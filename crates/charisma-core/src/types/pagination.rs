//! Offset/limit pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_LIMIT: u64 = 50;
/// Maximum page size.
pub const MAX_LIMIT: u64 = 200;

/// Offset-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetRequest {
    /// Maximum number of items to return.
    pub limit: u64,
    /// Number of items to skip.
    pub offset: u64,
}

impl OffsetRequest {
    /// Create a page request, clamping the limit to `1..=max_limit`.
    pub fn new(limit: Option<u64>, offset: Option<u64>, default_limit: u64, max_limit: u64) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit),
            offset: offset.unwrap_or(0),
        }
    }

    /// Number of leading rows a single source must supply so that the
    /// page can be cut from a merge of several sources.
    pub fn window(&self) -> u64 {
        self.offset.saturating_add(self.limit)
    }

    /// Cut this page out of an already ordered list.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for OffsetRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Pagination metadata returned alongside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    /// Requested page size.
    pub limit: u64,
    /// Requested offset.
    pub offset: u64,
    /// Total number of matching items.
    pub total: u64,
    /// Whether more items follow this page.
    pub has_more: bool,
}

impl PaginationInfo {
    /// Build pagination metadata for a page of `returned` items.
    pub fn new(request: &OffsetRequest, returned: usize, total: u64) -> Self {
        Self {
            limit: request.limit,
            offset: request.offset,
            total,
            has_more: request.offset + (returned as u64) < total,
        }
    }
}
