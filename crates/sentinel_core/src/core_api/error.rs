use std::io;

use thiserror::Error;

use crate::codec::CodecError;
use crate::validation::ValidationFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    Io,
    Validation,
    Layout,
    UnknownField,
    IndexOutOfRange,
    TruncatedRead,
    ValueOutOfRange,
    StringTooLong,
    InvalidText,
    InvalidItemCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code:?}: {message}")]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// True for errors that reject a single field edit without affecting the
    /// rest of the session.
    pub fn is_local(&self) -> bool {
        matches!(
            self.code,
            CoreErrorCode::ValueOutOfRange
                | CoreErrorCode::StringTooLong
                | CoreErrorCode::InvalidText
                | CoreErrorCode::InvalidItemCode
                | CoreErrorCode::UnknownField
                | CoreErrorCode::IndexOutOfRange
        )
    }
}

impl From<CodecError> for CoreError {
    fn from(err: CodecError) -> Self {
        let code = match &err {
            CodecError::TruncatedRead { .. } | CodecError::TruncatedWrite { .. } => {
                CoreErrorCode::TruncatedRead
            }
            CodecError::ValueOutOfRange { .. } => CoreErrorCode::ValueOutOfRange,
            CodecError::StringTooLong { .. } => CoreErrorCode::StringTooLong,
            CodecError::NonAsciiText { .. } => CoreErrorCode::InvalidText,
            CodecError::InvalidWidth(_) | CodecError::KindMismatch { .. } => CoreErrorCode::Layout,
        };
        Self::new(code, err.to_string())
    }
}

impl From<ValidationFailure> for CoreError {
    fn from(failure: ValidationFailure) -> Self {
        Self::new(CoreErrorCode::Validation, failure.to_string())
    }
}

impl From<io::Error> for CoreError {
    fn from(err: io::Error) -> Self {
        Self::new(CoreErrorCode::Io, err.to_string())
    }
}
