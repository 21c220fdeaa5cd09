use thiserror::Error;

pub type DictResult<T> = Result<T, DictError>;

/// Recoverable precondition failures. Contract violations (an unsafe
/// iterator released after mutation) are fatal and panic instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DictError {
    #[error("key already exists")]
    DuplicateKey,

    #[error("key not found")]
    KeyNotFound,

    #[error("rehash already in progress")]
    RehashInProgress,

    #[error("resize is disabled")]
    ResizeDisabled,

    #[error("resize target {target} is below the {used} entries in use")]
    InvalidResizeTarget { target: usize, used: usize },

    #[error("requested table size {requested} exceeds the addressable maximum")]
    TableSizeOverflow { requested: usize },
}
