use thiserror::Error;
use timechain_common::crypto::Hash;

/// Raised when a caller violates one of `HeaderTimechain::Add`'s stated
/// preconditions on the parent/work/height relationship.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("parent handle does not resolve to a stored header")]
    UnknownParent,

    #[error("header.previous {previous} does not match parent hash {parent}")]
    ParentHashMismatch { previous: Hash, parent: Hash },

    #[error("total_work {given} does not equal parent.total_work + work ({expected})")]
    TotalWorkMismatch { given: String, expected: String },

    #[error("height {given} does not equal parent.height + 1 ({expected})")]
    HeightMismatch { given: u64, expected: u64 },

    #[error("a genesis header was already inserted into this timechain")]
    GenesisAlreadyPresent,
}

/// Top-level error type for timechain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimechainError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("height {height} is out of range for the active chain (length {length})")]
    HeightOutOfRange { height: u64, length: u64 },

    #[error("handle does not resolve to a stored header")]
    InvalidHandle,
}
