//! RPC error codes and error type.

use toolchat_core::tools::ToolError;

use crate::types::RpcErrorBody;

// ── Error code constants ────────────────────────────────────────────

/// Body was not valid JSON.
pub const PARSE_ERROR: i64 = -32700;
/// JSON was not a valid request object.
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
/// Missing or unknown `mcp-session-id`.
pub const SESSION_NOT_FOUND: i64 = -32000;
/// The session closed while the request was in flight.
pub const DISCONNECTED: i64 = -32001;
pub const RESOURCE_NOT_FOUND: i64 = -32002;

/// RPC error type returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Required parameter missing or wrong type.
    #[error("{message}")]
    InvalidParams { message: String },

    #[error("Method '{method}' not found")]
    MethodNotFound { method: String },

    /// Requested entity not found.
    #[error("{message}")]
    NotFound { code: i64, message: String },

    /// The owning session went away.
    #[error("{message}")]
    Disconnected { message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl RpcError {
    /// JSON-RPC numeric code for this variant.
    pub fn code(&self) -> i64 {
        match self {
            Self::InvalidParams { .. } => INVALID_PARAMS,
            Self::MethodNotFound { .. } => METHOD_NOT_FOUND,
            Self::NotFound { code, .. } => *code,
            Self::Disconnected { .. } => DISCONNECTED,
            Self::Internal { .. } => INTERNAL_ERROR,
        }
    }

    pub fn to_error_body(&self) -> RpcErrorBody {
        RpcErrorBody {
            code: self.code(),
            message: self.to_string(),
            data: None,
        }
    }

    pub fn disconnected() -> Self {
        Self::Disconnected {
            message: "Session disconnected".into(),
        }
    }
}

impl From<ToolError> for RpcError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::InvalidArguments(message) => Self::InvalidParams { message },
            ToolError::Cancelled => Self::disconnected(),
            ToolError::Timeout(_) | ToolError::ExecutionFailed(_) => Self::Internal {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn codes() {
        assert_eq!(RpcError::InvalidParams { message: "x".into() }.code(), -32602);
        assert_eq!(RpcError::MethodNotFound { method: "x".into() }.code(), -32601);
        assert_eq!(RpcError::disconnected().code(), -32001);
        assert_eq!(RpcError::Internal { message: "x".into() }.code(), -32603);
        let err = RpcError::NotFound {
            code: RESOURCE_NOT_FOUND,
            message: "gone".into(),
        };
        assert_eq!(err.code(), -32002);
    }

    #[test]
    fn method_not_found_message() {
        let err = RpcError::MethodNotFound {
            method: "tools/destroy".into(),
        };
        let body = err.to_error_body();
        assert_eq!(body.code, METHOD_NOT_FOUND);
        assert!(body.message.contains("tools/destroy"));
    }

    #[test]
    fn tool_errors_map_to_rpc_codes() {
        assert_eq!(RpcError::from(ToolError::Cancelled).code(), DISCONNECTED);
        assert_eq!(
            RpcError::from(ToolError::InvalidArguments("a".into())).code(),
            INVALID_PARAMS
        );
        let err = RpcError::from(ToolError::Timeout(Duration::from_secs(5)));
        assert_eq!(err.code(), INTERNAL_ERROR);
        assert!(err.to_string().contains("timeout"));
    }
}
