//! Client error type.

/// Errors surfaced by [`ChatClient`](crate::ChatClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not connected to server")]
    NotConnected,

    #[error("a message is already being sent")]
    Busy,

    #[error("message is empty")]
    EmptyMessage,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a JSON-RPC error body.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The server's reply did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_error_display() {
        let err = ClientError::Rpc {
            code: -32000,
            message: "Bad Request".into(),
        };
        assert_eq!(err.to_string(), "RPC error -32000: Bad Request");
    }

    #[test]
    fn protocol_helper() {
        let err = ClientError::protocol("missing header");
        assert!(matches!(err, ClientError::Protocol(m) if m == "missing header"));
    }
}
