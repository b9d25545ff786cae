// Interface-only stand-ins for the consensus rule predicates the core calls
// out to but does not implement (`ValidateHeader`, `ValidateTransaction`,
// `ValidateBlockStructure`, `ValidateBlockContext`). Real nodes plug in a
// crate that knows about difficulty retargeting, signature checks, script
// evaluation and so on; the timechain only needs the tagged error shape
// those predicates return, so their bodies here simply mean "not yet
// wired to a real consensus module".

use thiserror::Error;

use timechain_common::crypto::Hash;
use timechain_common::header::BlockHeader;

use crate::chain::HeaderAncestryView;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header hash {0} does not satisfy its own compact target")]
    InsufficientWork(Hash),

    #[error("header timestamp {given} is not greater than the median of the last window")]
    TimestampTooOld { given: u32 },

    #[error("header timestamp {given} is too far in the future")]
    TimestampTooFarInFuture { given: u32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction {0} failed structural validation")]
    MalformedTransaction(Hash),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error("block body does not match header.merkle_root")]
    MerkleRootMismatch,
}

/// Validates a candidate header against the ancestry view of its intended
/// parent. Not implemented here: this crate owns header/chain bookkeeping,
/// not proof-of-work or timestamp policy.
pub trait ValidateHeader {
    fn validate_header(
        &self,
        header: &BlockHeader,
        ancestry: &HeaderAncestryView,
    ) -> Result<(), HeaderError>;
}

pub trait ValidateTransaction {
    fn validate_transaction(&self, bytes: &[u8]) -> Result<(), TransactionError>;
}

pub trait ValidateBlockStructure {
    fn validate_block_structure(&self, body: &[u8]) -> Result<(), BlockError>;
}

pub trait ValidateBlockContext {
    fn validate_block_context(
        &self,
        header: &BlockHeader,
        ancestry: &HeaderAncestryView,
    ) -> Result<(), BlockError>;
}
