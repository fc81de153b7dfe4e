//! Transport seam between the subscription manager and the network.

use std::fmt;

use tokio::sync::mpsc;

use crate::Result;
use crate::models::SubscriptionRequest;

/// Identifies one transport instance; events from replaced transports are
/// recognised and dropped by comparing ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Signals a transport delivers to its owner, one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed.
    Open,
    /// A text frame arrived.
    Message(String),
    /// The transport failed; a `Close` usually follows.
    Error(String),
    /// The transport is closed and will deliver nothing further.
    Close,
}

/// Sending half used by transports to report their events.
pub type EventSender = mpsc::UnboundedSender<(ConnectionId, TransportEvent)>;

/// Receiving half consumed by the feed driver.
pub type EventReceiver = mpsc::UnboundedReceiver<(ConnectionId, TransportEvent)>;

/// An open (or opening) streaming connection.
pub trait Transport {
    /// Queues a directive for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`CoinwatchError::ConnectionClosed`](crate::CoinwatchError::ConnectionClosed)
    /// if the transport can no longer accept directives.
    fn send(&mut self, request: &SubscriptionRequest) -> Result<()>;

    /// Requests the connection be closed. No events are expected after
    /// the close completes.
    fn close(&mut self);
}

/// Opens transports on behalf of the subscription manager.
pub trait Connector {
    type Transport: Transport;

    /// Starts opening a transport authenticated with `credential`. The
    /// handshake outcome is reported later as an event tagged with `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot even be started (for
    /// example an unusable endpoint URL).
    fn open(&mut self, id: ConnectionId, credential: &str) -> Result<Self::Transport>;
}
