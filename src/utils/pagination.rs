//! Offset/limit pagination parameters.

use crate::error::AppError;
use serde_json::json;

/// Default number of items returned by list operations.
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    /// Validates `offset` and `max` against the configured page size cap.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `offset < 0`, `max <= 0` or
    /// `max > max_page_size`.
    pub fn new(offset: i64, max: i64, max_page_size: i64) -> Result<Self, AppError> {
        if offset < 0 || max <= 0 || max > max_page_size {
            return Err(AppError::bad_request(
                "offset and/or max are not valid",
                json!({ "offset": offset, "max": max, "max_page_size": max_page_size }),
            ));
        }

        Ok(Self { offset, limit: max })
    }

    /// Applies the window to an in-memory sequence.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}
