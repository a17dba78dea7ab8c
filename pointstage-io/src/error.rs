//! Result codes reported by file filters

use pointstage_core::Error;
use thiserror::Error;

/// Errors a file filter reports to its caller.
///
/// Errors raised by stages never cross the filter boundary as-is: they are
/// folded into one of these variants.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Third-party library exception: {0}")]
    ThirdPartyLibException(String),

    #[error("Error reported on the console: {0}")]
    ConsoleError(String),

    #[error("Not implemented")]
    NotImplemented,
}

impl From<Error> for FileError {
    fn from(e: Error) -> Self {
        FileError::ThirdPartyLibException(e.to_string())
    }
}

/// Flat result code of a filter call, for hosts that dispatch on codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileErrorCode {
    NoError,
    ThirdPartyLibException,
    ConsoleError,
    NotImplemented,
}

impl FileErrorCode {
    pub fn from_result<T>(result: &std::result::Result<T, FileError>) -> Self {
        match result {
            Ok(_) => FileErrorCode::NoError,
            Err(e) => e.code(),
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == FileErrorCode::NoError
    }
}

impl FileError {
    pub fn code(&self) -> FileErrorCode {
        match self {
            FileError::ThirdPartyLibException(_) => FileErrorCode::ThirdPartyLibException,
            FileError::ConsoleError(_) => FileErrorCode::ConsoleError,
            FileError::NotImplemented => FileErrorCode::NotImplemented,
        }
    }
}
