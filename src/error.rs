use std::time::Duration;

use thiserror::Error;

/// Failures of the connection lifecycle itself.
///
/// None of these trigger automatic reconnection; the caller decides whether
/// and when to retry.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("broker did not acknowledge the connection within {0:?}")]
    AckTimeout(Duration),

    #[error("broker did not confirm the disconnect within {0:?}")]
    CloseTimeout(Duration),

    #[error("operation requires a connected session")]
    NotConnected,

    #[error("transport failure: {0}")]
    Transport(#[source] anyhow::Error),
}

/// Failures of a single correlated request.
///
/// Timeout and external cancellation are modeled identically: the request
/// resolves as cancelled and its listeners are released. Recognized broker
/// rejections never appear here: operations that expect them return a typed
/// outcome instead, so only unrecognized codes surface as `Broker`.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request {req_id} timed out after {elapsed:?}")]
    Timeout { req_id: i64, elapsed: Duration },

    #[error("request {req_id} was cancelled")]
    Cancelled { req_id: i64 },

    #[error("broker error {code} on request {req_id}: {message}")]
    Broker {
        req_id: i64,
        code: i32,
        message: String,
    },

    #[error("order id seed from the broker never arrived within {0:?}")]
    IdentityTimeout(Duration),

    #[error(transparent)]
    Connection(#[from] ConnectError),
}

impl RequestError {
    /// True when the request ended by deadline or cancellation signal
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            RequestError::Timeout { .. } | RequestError::Cancelled { .. }
        )
    }
}
