//! Mock transport for testing.
//!
//! Allows scripting request replies, injecting signals, and capturing sent
//! requests for verification.

use super::{
    SignalReceiver, SignalSender, Transport, TransportError, TransportFactory, TransportSignal,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use sync_core::ReconnectPolicy;
use sync_types::{RequestKind, LOCAL_DISCONNECT_REASON};
use tokio::sync::mpsc;

use crate::config::ConnectionConfig;

/// A scripted reply to one request.
#[derive(Debug, Clone)]
enum MockReply {
    Data(Value),
    Fail(String),
}

/// Mock transport for testing.
///
/// Clones share state, so a test can keep a handle while the session owns
/// another.
#[derive(Debug, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug)]
struct MockTransportInner {
    connected: bool,
    connect_calls: usize,
    close_calls: usize,
    requests: Vec<(RequestKind, Value)>,
    replies: HashMap<RequestKind, VecDeque<MockReply>>,
    on_connect: Vec<TransportSignal>,
    signals: Option<SignalSender>,
}

impl MockTransport {
    /// Create a new mock transport and its signal stream.
    ///
    /// By default `connect()` reports [`TransportSignal::Connected`].
    pub fn new() -> (Self, SignalReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = MockTransportInner {
            connected: false,
            connect_calls: 0,
            close_calls: 0,
            requests: Vec::new(),
            replies: HashMap::new(),
            on_connect: vec![TransportSignal::Connected],
            signals: Some(tx),
        };
        (
            Self {
                inner: Arc::new(Mutex::new(inner)),
            },
            rx,
        )
    }

    /// Queue a successful reply (`{"data": data}`) for the given request.
    ///
    /// The last queued reply for a request is reused for every later call.
    pub fn respond_ok(&self, kind: RequestKind, data: Value) {
        self.push_reply(kind, MockReply::Data(json!({ "data": data })));
    }

    /// Queue a failed reply for the given request.
    pub fn respond_err(&self, kind: RequestKind, error: &str) {
        self.push_reply(kind, MockReply::Fail(error.to_string()));
    }

    fn push_reply(&self, kind: RequestKind, reply: MockReply) {
        let mut inner = self.inner.lock().unwrap();
        inner.replies.entry(kind).or_default().push_back(reply);
    }

    /// Replace the signals `connect()` reports (empty = report nothing).
    pub fn script_connect(&self, signals: Vec<TransportSignal>) {
        let mut inner = self.inner.lock().unwrap();
        inner.on_connect = signals;
    }

    /// Inject a signal as if the transport had produced it.
    ///
    /// Returns false if the transport has already shut down.
    pub fn emit(&self, signal: TransportSignal) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.emit(signal)
    }

    /// Inject a push event.
    pub fn push_event(&self, name: &str, payload: Value) -> bool {
        self.emit(TransportSignal::Event {
            name: name.to_string(),
            payload,
        })
    }

    /// Get all requests that were sent.
    pub fn requests(&self) -> Vec<(RequestKind, Value)> {
        let inner = self.inner.lock().unwrap();
        inner.requests.clone()
    }

    /// Get the params of every request of one kind.
    pub fn requests_of(&self, kind: RequestKind) -> Vec<Value> {
        let inner = self.inner.lock().unwrap();
        inner
            .requests
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, params)| params.clone())
            .collect()
    }

    /// How many times `connect()` was called.
    pub fn connect_calls(&self) -> usize {
        self.inner.lock().unwrap().connect_calls
    }

    /// How many times `close()` was called.
    pub fn close_calls(&self) -> usize {
        self.inner.lock().unwrap().close_calls
    }

    /// Whether the signal stream has been shut down.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().signals.is_none()
    }
}

impl MockTransportInner {
    fn emit(&mut self, signal: TransportSignal) -> bool {
        match &signal {
            TransportSignal::Connected | TransportSignal::Reconnected(_) => self.connected = true,
            TransportSignal::Disconnected(_) | TransportSignal::ReconnectFailed => {
                self.connected = false
            }
            _ => {}
        }
        let gave_up = matches!(signal, TransportSignal::ReconnectFailed);
        let sent = match &self.signals {
            Some(tx) => tx.send(signal).is_ok(),
            None => false,
        };
        // A transport that gives up stops producing signals.
        if gave_up {
            self.signals = None;
        }
        sent
    }

    fn next_reply(&mut self, kind: RequestKind) -> Option<MockReply> {
        let queue = self.replies.get_mut(&kind)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.signals.is_none() {
            return Err(TransportError::ConnectionClosed);
        }
        inner.connect_calls += 1;

        let script = inner.on_connect.clone();
        for signal in script {
            inner.emit(signal);
        }
        Ok(())
    }

    async fn request(&self, kind: RequestKind, params: Value) -> Result<Value, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }

        inner.requests.push((kind, params));

        match inner.next_reply(kind) {
            Some(MockReply::Data(reply)) => Ok(reply),
            Some(MockReply::Fail(error)) => Err(TransportError::RequestFailed(error)),
            None => Err(TransportError::RequestFailed(format!(
                "no reply scripted for {kind}"
            ))),
        }
    }

    fn is_connected(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.connected
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.close_calls += 1;
        if inner.connected {
            inner.emit(TransportSignal::Disconnected(LOCAL_DISCONNECT_REASON.into()));
        }
        inner.connected = false;
        // Dropping the sender ends the signal stream.
        inner.signals = None;
        Ok(())
    }
}

/// Factory that hands out [`MockTransport`]s and remembers them.
///
/// Replies and connect scripts configured on the factory are installed on
/// every transport it opens.
#[derive(Debug, Clone, Default)]
pub struct MockFactory {
    inner: Arc<Mutex<MockFactoryInner>>,
}

#[derive(Debug, Default)]
struct MockFactoryInner {
    opened: Vec<MockTransport>,
    configs: Vec<ConnectionConfig>,
    replies: Vec<(RequestKind, MockReply)>,
    on_connect: Option<Vec<TransportSignal>>,
}

impl MockFactory {
    /// Create a new factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply on every transport this factory opens.
    pub fn respond_ok(&self, kind: RequestKind, data: Value) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .replies
            .push((kind, MockReply::Data(json!({ "data": data }))));
    }

    /// Queue a failed reply on every transport this factory opens.
    pub fn respond_err(&self, kind: RequestKind, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .replies
            .push((kind, MockReply::Fail(error.to_string())));
    }

    /// Set the connect script of every transport this factory opens.
    pub fn script_connect(&self, signals: Vec<TransportSignal>) {
        let mut inner = self.inner.lock().unwrap();
        inner.on_connect = Some(signals);
    }

    /// Every transport opened so far, oldest first.
    pub fn transports(&self) -> Vec<MockTransport> {
        self.inner.lock().unwrap().opened.clone()
    }

    /// The most recently opened transport.
    pub fn last(&self) -> Option<MockTransport> {
        self.inner.lock().unwrap().opened.last().cloned()
    }

    /// The config each transport was opened with.
    pub fn configs(&self) -> Vec<ConnectionConfig> {
        self.inner.lock().unwrap().configs.clone()
    }
}

impl TransportFactory for MockFactory {
    fn open(
        &self,
        config: &ConnectionConfig,
        _policy: &ReconnectPolicy,
    ) -> Result<(Arc<dyn Transport>, SignalReceiver), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        let (transport, signals) = MockTransport::new();

        for (kind, reply) in &inner.replies {
            transport.push_reply(*kind, reply.clone());
        }
        if let Some(script) = &inner.on_connect {
            transport.script_connect(script.clone());
        }

        inner.opened.push(transport.clone());
        inner.configs.push(config.clone());
        Ok((Arc::new(transport), signals))
    }
}
