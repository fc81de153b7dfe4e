//! Live quote feed for a single, switchable symbol.
//!
//! [`QuoteSubscription`] is the synchronous state machine; [`QuoteFeed`]
//! runs it on a tokio task, feeding it caller commands and transport
//! events strictly one at a time and publishing snapshots through a
//! [`watch`] channel.

mod manager;
mod transport;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::FinnhubConfig;
use crate::websocket::WsConnector;

pub use manager::{FEED_ERROR, QuoteSnapshot, QuoteSubscription, SubscriptionState};
pub use transport::{
    ConnectionId, Connector, EventReceiver, EventSender, Transport, TransportEvent,
};

/// Requests sent from a [`QuoteFeed`] handle to its driver task.
#[derive(Debug)]
enum FeedCommand {
    Select(Option<String>),
    Credential(String),
    Refresh,
}

/// Handle to a running quote feed.
///
/// Dropping the handle stops the driver, which unsubscribes and closes
/// any open connection.
pub struct QuoteFeed {
    commands: mpsc::UnboundedSender<FeedCommand>,
    snapshot: watch::Receiver<QuoteSnapshot>,
    task: JoinHandle<()>,
}

impl QuoteFeed {
    /// Starts a feed against the configured Finnhub endpoint.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(config: &FinnhubConfig, tls_config: Arc<rustls::ClientConfig>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let connector = WsConnector::new(config.websocket_url.clone(), tls_config, events_tx);
        let credential = config.token.clone().unwrap_or_default();

        Self::spawn(connector, credential, events_rx)
    }

    /// Starts a feed over an arbitrary connector. `events` must receive
    /// everything the connector's transports report.
    pub fn spawn<C>(connector: C, credential: String, events: EventReceiver) -> Self
    where
        C: Connector + Send + 'static,
        C::Transport: Send + 'static,
    {
        let manager = QuoteSubscription::new(connector);
        let snapshot = manager.subscribe();
        let (commands, command_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run(manager, credential, command_rx, events));

        Self {
            commands,
            snapshot,
            task,
        }
    }

    /// Selects the symbol to stream, or `None` to stop streaming.
    pub fn select(&self, symbol: Option<&str>) {
        self.send(FeedCommand::Select(symbol.map(String::from)));
    }

    /// Replaces the feed credential, reconnecting if a symbol is selected.
    pub fn set_credential(&self, credential: &str) {
        self.send(FeedCommand::Credential(credential.to_string()));
    }

    /// Closes the current connection and opens a fresh one for the same symbol.
    pub fn refresh(&self) {
        self.send(FeedCommand::Refresh);
    }

    /// Returns a copy of the latest snapshot.
    pub fn snapshot(&self) -> QuoteSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Returns a receiver notified on every snapshot change.
    pub fn watch(&self) -> watch::Receiver<QuoteSnapshot> {
        self.snapshot.clone()
    }

    /// Stops the driver after releasing the connection, and waits for it.
    pub async fn shutdown(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            debug!("Feed driver ended abnormally: {e}");
        }
    }

    fn send(&self, command: FeedCommand) {
        if self.commands.send(command).is_err() {
            debug!("Feed driver already stopped");
        }
    }
}

/// Driver loop: applies commands and transport events in arrival order
/// until every command sender is gone.
async fn run<C: Connector>(
    mut manager: QuoteSubscription<C>,
    mut credential: String,
    mut commands: mpsc::UnboundedReceiver<FeedCommand>,
    mut events: EventReceiver,
) {
    let mut symbol: Option<String> = None;

    loop {
        tokio::select! {
            cmd = commands.recv() => {
                match cmd {
                    Some(FeedCommand::Select(next)) => {
                        symbol = next;
                        manager.set_target(symbol.as_deref(), &credential);
                    }
                    Some(FeedCommand::Credential(next)) => {
                        credential = next;
                        manager.set_target(symbol.as_deref(), &credential);
                    }
                    Some(FeedCommand::Refresh) => manager.refresh(),
                    None => break,
                }
            }

            Some((id, event)) = events.recv() => {
                manager.handle_event(id, event);
            }
        }
    }

    manager.shutdown();
    info!("Quote feed stopped");
}
