// src/error.rs
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Gas estimation failed: {0}")]
    EstimationFailure(String),

    #[error("Ethereum provider error: {0}")]
    NetworkFailure(String),

    #[error("ABI encoding failed: {0}")]
    EncodingFailure(String),

    #[error("Signing failed: {0}")]
    SigningFailure(String),
}

impl AccountError {
    /// Short machine-readable name, used as RPC error data.
    pub fn kind(&self) -> &'static str {
        match self {
            AccountError::InvalidInput(_) => "invalid_input",
            AccountError::EstimationFailure(_) => "estimation_failure",
            AccountError::NetworkFailure(_) => "network_failure",
            AccountError::EncodingFailure(_) => "encoding_failure",
            AccountError::SigningFailure(_) => "signing_failure",
        }
    }
}
