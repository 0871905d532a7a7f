use thiserror::Error;

#[derive(Debug, Error)]
pub enum BtsnoopError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a btsnoop capture: magic mismatch (found {found})")]
    BadMagic { found: String },
    #[error("btsnoop header too short: need {needed} bytes, got {actual}")]
    TruncatedHeader { needed: usize, actual: usize },
}
