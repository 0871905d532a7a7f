use thiserror::Error;

use crate::protocols::common::TooShort;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum L2capError {
    #[error(transparent)]
    TooShort(#[from] TooShort),
}
