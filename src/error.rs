//! Crate-level error types.
//!
//! [`CoinwatchError`] unifies every error source (configuration, WebSocket,
//! HTTP, JSON) behind a single enum so callers can match on the variant they
//! care about while still using the `?` operator for easy propagation.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoinwatchError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum CoinwatchError {
    /// An environment variable was missing or held an invalid value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A WebSocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A REST request failed or returned a non-success status.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The TLS configuration could not be built.
    #[error("tls error: {0}")]
    Tls(String),

    /// An inbound message did not have the expected shape.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The transport was already closed when a directive was sent.
    #[error("connection closed")]
    ConnectionClosed,
}
