use thiserror::Error;
use timechain_common::serializer::ReaderError;

#[derive(Error, Debug)]
pub enum BlockFileError {
    #[error("failed to open block file: {0}")]
    FileOpenError(std::io::Error),

    #[error("unsupported block file version: expected 1, got {0}")]
    UnsupportedVersionError(i32),

    #[error("block index {index} out of range (size {size})")]
    IndexOutOfRangeError { index: usize, size: usize },

    #[error("corrupt block file: {0}")]
    CorruptFormatError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ReaderError> for BlockFileError {
    fn from(err: ReaderError) -> Self {
        BlockFileError::CorruptFormatError(err.to_string())
    }
}
