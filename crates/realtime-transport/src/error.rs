//! Transport error types.

use thiserror::Error;

/// Transport error type.
#[derive(Error, Debug)]
pub enum TransportError {
    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Endpoint could not be turned into a URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Socket target has a scheme other than ws/wss
    #[error("Unsupported socket scheme: {0}")]
    UnsupportedScheme(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The socket closed, gracefully or not
    #[error("ws_closed")]
    SocketClosed,

    /// Neither socket support nor a poll endpoint is available
    #[error("No transport available: sockets unsupported and no poll URL configured")]
    NoTransport,

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias using TransportError.
pub type TransportResult<T> = Result<T, TransportError>;
