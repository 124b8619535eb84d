use thiserror::Error;

/// Store failures surfaced to callers. I/O errors are never retried
/// internally; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be interpreted at all. Shape problems
    /// (missing columns, bad cells) never produce this; they degrade to
    /// null values instead.
    #[error("unreadable table data: {0}")]
    Codec(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
