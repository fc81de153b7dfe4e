//! Shared test utilities: a recording connector for the quote feed.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use coinwatch::CoinwatchError;
use coinwatch::feed::{ConnectionId, Connector, Transport};
use coinwatch::models::SubscriptionRequest;

/// Everything the manager did to its transports, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(ConnectionId, String),
    Send(ConnectionId, SubscriptionRequest),
    Close(ConnectionId),
}

/// Shared log of transport activity plus a live-handle counter.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
    live: Arc<AtomicUsize>,
    max_live: Arc<AtomicUsize>,
    fail_next_open: Arc<AtomicBool>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Transports that were opened and not yet closed or dropped.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live transports ever observed.
    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    pub fn fail_next_open(&self) {
        self.fail_next_open.store(true, Ordering::SeqCst);
    }

    /// Id passed to the most recent `open`.
    pub fn last_opened(&self) -> Option<ConnectionId> {
        self.calls().iter().rev().find_map(|call| match call {
            Call::Open(id, _) => Some(*id),
            _ => None,
        })
    }

    /// Position of the first call equal to `call`.
    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub struct MockConnector {
    pub recorder: Recorder,
}

impl MockConnector {
    pub fn new() -> (Self, Recorder) {
        let recorder = Recorder::default();
        (
            Self {
                recorder: recorder.clone(),
            },
            recorder,
        )
    }
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    fn open(&mut self, id: ConnectionId, credential: &str) -> coinwatch::Result<MockTransport> {
        if self.recorder.fail_next_open.swap(false, Ordering::SeqCst) {
            return Err(CoinwatchError::Config("unreachable endpoint".to_string()));
        }

        self.recorder.record(Call::Open(id, credential.to_string()));
        let live = self.recorder.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.recorder.max_live.fetch_max(live, Ordering::SeqCst);

        Ok(MockTransport {
            id,
            recorder: self.recorder.clone(),
            released: false,
        })
    }
}

pub struct MockTransport {
    id: ConnectionId,
    recorder: Recorder,
    released: bool,
}

impl MockTransport {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.recorder.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Transport for MockTransport {
    fn send(&mut self, request: &SubscriptionRequest) -> coinwatch::Result<()> {
        if self.released {
            return Err(CoinwatchError::ConnectionClosed);
        }
        self.recorder.record(Call::Send(self.id, request.clone()));
        Ok(())
    }

    fn close(&mut self) {
        self.recorder.record(Call::Close(self.id));
        self.release();
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.release();
    }
}

pub fn subscribe(symbol: &str) -> SubscriptionRequest {
    SubscriptionRequest::subscribe(symbol)
}

pub fn unsubscribe(symbol: &str) -> SubscriptionRequest {
    SubscriptionRequest::unsubscribe(symbol)
}

/// Builds the default TLS config for live-network tests.
pub fn test_tls_config() -> rustls::ClientConfig {
    coinwatch::tls::build_tls_config(None).expect("failed to build TLS config")
}
