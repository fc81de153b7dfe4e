//! Single-symbol quote subscription state machine.
//!
//! [`QuoteSubscription`] owns at most one transport at a time, bound to the
//! symbol the caller is interested in. Changing the symbol unsubscribes and
//! closes the current transport before the next one is opened. Inbound
//! trade batches update the published [`QuoteSnapshot`].

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::transport::{ConnectionId, Connector, Transport, TransportEvent};
use crate::models::SubscriptionRequest;
use crate::models::trade::Quote;
use crate::websocket::latest_trade;

/// Error reported to callers for any transport failure.
pub const FEED_ERROR: &str = "Failed to connect to real-time feed";

/// Caller-visible view of a subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteSnapshot {
    pub quote: Option<Quote>,
    pub connected: bool,
    pub error: Option<String>,
}

/// Lifecycle phase of the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// No symbol selected.
    Idle,
    /// Transport opening, handshake not yet complete.
    Connecting,
    /// Handshake complete and subscribe directive sent.
    Live,
    /// Transport closed; waits for the caller to retry or pick a symbol.
    Closed,
}

struct ActiveSubscription<T> {
    symbol: String,
    credential: String,
    id: ConnectionId,
    transport: Option<T>,
    state: SubscriptionState,
}

/// Keeps one feed connection in step with the caller's target symbol.
pub struct QuoteSubscription<C: Connector> {
    connector: C,
    active: Option<ActiveSubscription<C::Transport>>,
    next_id: u64,
    snapshot: watch::Sender<QuoteSnapshot>,
}

impl<C: Connector> QuoteSubscription<C> {
    /// Creates an idle manager that opens transports through `connector`.
    pub fn new(connector: C) -> Self {
        let (snapshot, _) = watch::channel(QuoteSnapshot::default());
        Self {
            connector,
            active: None,
            next_id: 0,
            snapshot,
        }
    }

    /// Returns a copy of the current caller-visible state.
    pub fn snapshot(&self) -> QuoteSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Returns a receiver notified whenever the snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<QuoteSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn state(&self) -> SubscriptionState {
        self.active
            .as_ref()
            .map_or(SubscriptionState::Idle, |a| a.state)
    }

    /// Symbol the current transport is bound to.
    pub fn active_symbol(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.symbol.as_str())
    }

    /// Points the subscription at `symbol`, authenticating with `credential`.
    ///
    /// A blank symbol or credential leaves the manager idle. Re-supplying
    /// the target that is already connecting or live is a no-op; supplying
    /// it again after the transport closed reconnects.
    pub fn set_target(&mut self, symbol: Option<&str>, credential: &str) {
        let symbol = symbol.map(str::trim).filter(|s| !s.is_empty());
        let credential = credential.trim();

        if let (Some(symbol), Some(active)) = (symbol, self.active.as_ref())
            && active.symbol == symbol
            && active.credential == credential
            && matches!(
                active.state,
                SubscriptionState::Connecting | SubscriptionState::Live
            )
        {
            debug!(symbol, "Target unchanged");
            return;
        }

        self.teardown();

        let Some(symbol) = symbol else {
            return;
        };
        if credential.is_empty() {
            warn!(symbol, "No feed credential configured, staying idle");
            return;
        }

        self.open(symbol.to_string(), credential.to_string());
    }

    /// Closes the current transport and reconnects to the same symbol.
    ///
    /// The old transport is fully released before the new one is opened.
    pub fn refresh(&mut self) {
        let Some((symbol, credential)) = self
            .active
            .as_ref()
            .map(|a| (a.symbol.clone(), a.credential.clone()))
        else {
            debug!("Nothing to refresh");
            return;
        };

        self.teardown();
        self.open(symbol, credential);
    }

    /// Processes one transport signal. Signals from transports other than
    /// the current one are ignored.
    pub fn handle_event(&mut self, id: ConnectionId, event: TransportEvent) {
        let Some(active) = self.active.as_mut() else {
            debug!(connection = %id, ?event, "Ignoring event while idle");
            return;
        };
        if active.id != id {
            debug!(
                connection = %id,
                current = %active.id,
                "Ignoring event from replaced connection"
            );
            return;
        }

        match event {
            TransportEvent::Open => {
                if active.state != SubscriptionState::Connecting {
                    return;
                }
                active.state = SubscriptionState::Live;
                info!(connection = %id, symbol = %active.symbol, "Feed connected");
                self.snapshot.send_if_modified(|s| {
                    let changed = !s.connected || s.error.is_some();
                    s.connected = true;
                    s.error = None;
                    changed
                });

                let request = SubscriptionRequest::subscribe(&active.symbol);
                if let Some(Err(e)) = active.transport.as_mut().map(|t| t.send(&request)) {
                    warn!(connection = %id, "Failed to send subscribe: {e}");
                    self.flag_error();
                }
            }
            TransportEvent::Message(text) => {
                if active.state != SubscriptionState::Live {
                    debug!(connection = %id, "Ignoring message before subscription is live");
                    return;
                }
                match latest_trade(&text) {
                    Ok(Some(trade)) => {
                        let quote = Quote::from_trade(&active.symbol, &trade);
                        self.snapshot.send_if_modified(|s| {
                            let changed = s.quote.as_ref() != Some(&quote);
                            s.quote = Some(quote);
                            changed
                        });
                    }
                    Ok(None) => {}
                    Err(e) => warn!(connection = %id, "Error parsing feed message: {e}"),
                }
            }
            TransportEvent::Error(detail) => {
                warn!(connection = %id, symbol = %active.symbol, "Feed error: {detail}");
                self.flag_error();
            }
            TransportEvent::Close => {
                info!(connection = %id, symbol = %active.symbol, "Feed closed");
                active.state = SubscriptionState::Closed;
                active.transport = None;
                self.set_connected(false);
            }
        }
    }

    /// Unsubscribes and closes the current transport, leaving the manager idle.
    pub fn shutdown(&mut self) {
        self.teardown();
    }

    fn open(&mut self, symbol: String, credential: String) {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;

        self.snapshot.send_if_modified(|s| {
            let changed = s.connected || s.error.is_some();
            s.connected = false;
            s.error = None;
            changed
        });

        info!(connection = %id, symbol = %symbol, "Opening feed connection");
        let (transport, state) = match self.connector.open(id, &credential) {
            Ok(transport) => (Some(transport), SubscriptionState::Connecting),
            Err(e) => {
                warn!(connection = %id, symbol = %symbol, "Failed to open feed connection: {e}");
                self.flag_error();
                (None, SubscriptionState::Closed)
            }
        };

        self.active = Some(ActiveSubscription {
            symbol,
            credential,
            id,
            transport,
            state,
        });
    }

    fn teardown(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        if let Some(mut transport) = active.transport.take() {
            if active.state == SubscriptionState::Live {
                let request = SubscriptionRequest::unsubscribe(&active.symbol);
                if let Err(e) = transport.send(&request) {
                    debug!(connection = %active.id, "Failed to send unsubscribe: {e}");
                }
            }
            transport.close();
            info!(connection = %active.id, symbol = %active.symbol, "Feed connection released");
        }

        self.set_connected(false);
    }

    fn flag_error(&self) {
        self.snapshot.send_if_modified(|s| {
            let changed = s.connected || s.error.as_deref() != Some(FEED_ERROR);
            s.connected = false;
            s.error = Some(FEED_ERROR.to_string());
            changed
        });
    }

    fn set_connected(&self, connected: bool) {
        self.snapshot.send_if_modified(|s| {
            let changed = s.connected != connected;
            s.connected = connected;
            changed
        });
    }
}

impl<C: Connector> Drop for QuoteSubscription<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}
