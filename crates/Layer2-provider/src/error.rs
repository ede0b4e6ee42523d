//! Provider error types

use thiserror::Error;

/// Errors from a model provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// A scripted provider has no responses left
    #[error("Script exhausted after {0} response(s)")]
    ScriptExhausted(usize),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<ProviderError> for orca_foundation::Error {
    fn from(err: ProviderError) -> Self {
        orca_foundation::Error::Agent(err.to_string())
    }
}
