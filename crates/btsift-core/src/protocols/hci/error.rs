use thiserror::Error;

use crate::protocols::common::TooShort;

/// Errors returned by ACL header decoding.
///
/// # Examples
/// ```
/// use btsift_core::protocols::hci::error::HciError;
///
/// let err = HciError::DeclaredLengthExceeded { declared: 27, available: 4 };
/// assert!(err.to_string().contains("declares 27 bytes"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HciError {
    #[error(transparent)]
    TooShort(#[from] TooShort),
    #[error("ACL header declares {declared} bytes but only {available} follow")]
    DeclaredLengthExceeded { declared: u16, available: usize },
}
