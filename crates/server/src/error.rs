//! Structured errors for the asset-cache server.
//!
//! Failures from the cache itself arrive as [`assetcache_core::Error`] and
//! convert directly; these cover problems with tool arguments and output.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the asset-cache server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid tool arguments (e.g., an unknown HTTP method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Tool output could not be encoded.
    #[error("OUTPUT_FAILED: {0}")]
    OutputFailed(String),
}

impl From<ServerError> for McpError {
    fn from(err: ServerError) -> Self {
        let (code, message) = match &err {
            ServerError::InvalidInput(_) => (-32602, err.to_string()),
            ServerError::OutputFailed(_) => (-32000, err.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err: McpError = ServerError::InvalidInput("bad method".into()).into();
        assert_eq!(err.code.0, -32602);
        assert!(err.message.contains("bad method"));

        let err: McpError = ServerError::OutputFailed("oops".into()).into();
        assert_eq!(err.code.0, -32000);
    }
}
