//! Error types for the core crate.

use thiserror::Error;

/// Core error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Address does not match `^0x[a-fA-F0-9]{40}$`.
    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    /// Address is well-formed but fails the EIP-55 checksum.
    #[error("Address is not checksummed: {0}")]
    InvalidChecksum(String),

    /// Hash is not 32 bytes of hex.
    #[error("Invalid hash encoding: {0}")]
    InvalidHash(String),

    /// Unknown question status code in storage.
    #[error("Unknown question status: {0}")]
    InvalidQuestionStatus(String),

    /// Unknown answer status code in storage.
    #[error("Unknown answer status: {0}")]
    InvalidAnswerStatus(String),
}

/// Result type alias for CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;
