//! Permission model error types.

use thiserror::Error;

use super::{MAX_BITS, MaskKind};

/// Errors raised while editing a permission or flag mask.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// The requested bit does not fit in a 64-bit mask.
    #[error("{kind} bit index {index} is out of range (expected 0..{max})", max = MAX_BITS)]
    BitIndexOutOfRange {
        /// Which mask the edit targeted
        kind: MaskKind,
        /// The offending index, as supplied by the caller
        index: i64,
    },
}

impl PermissionError {
    /// Check if this error is caused by caller-supplied input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, PermissionError::BitIndexOutOfRange { .. })
    }

    /// The rejected bit index, if this error is about one.
    pub fn index(&self) -> Option<i64> {
        match self {
            PermissionError::BitIndexOutOfRange { index, .. } => Some(*index),
        }
    }
}

impl From<PermissionError> for crate::Error {
    fn from(err: PermissionError) -> Self {
        crate::Error::Permission(err)
    }
}
