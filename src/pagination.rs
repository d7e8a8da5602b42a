//! Page arithmetic for offset-based listing.

use thiserror::Error;

/// Page number used when the caller does not supply one.
pub const DEFAULT_PAGE: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page must be a positive integer")]
    InvalidPage,
    #[error("limit must be between 1 and {max}")]
    InvalidLimit { max: u64 },
}

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    /// Validates raw query values. Out-of-range values are rejected, not clamped.
    pub fn new(page: i64, limit: i64, max_limit: u64) -> Result<Self, PageError> {
        let page = u64::try_from(page)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or(PageError::InvalidPage)?;
        let limit = u64::try_from(limit)
            .ok()
            .filter(|l| (1..=max_limit).contains(l))
            .ok_or(PageError::InvalidLimit { max: max_limit })?;
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of records to skip: `(page - 1) * limit`, saturating.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)`
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}
