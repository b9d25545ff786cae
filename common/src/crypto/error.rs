use thiserror::Error;

/// Errors surfaced while parsing or validating hash-shaped values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Invalid hash length: {len} bytes, expected: {expected} bytes")]
    InvalidHashLength { len: usize, expected: usize },
}
