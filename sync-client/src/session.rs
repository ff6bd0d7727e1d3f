//! ConnectionSession - owns at most one live transport.
//!
//! `start()` tears down whatever was running, opens a fresh transport, and
//! spawns a pump task that feeds the transport's signals through the pure
//! [`ConnectionState`] machine and the push-event [`Dispatcher`]. Signals
//! are handled one at a time in transport order; fetches are spawned so a
//! slow reply never holds up the next event.

use std::sync::Arc;
use sync_core::{Action, ConnectionState, Event, ReconnectPolicy};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::bootstrap::SyncContext;
use crate::config::{ConfigError, ConnectionConfig};
use crate::dispatch::Dispatcher;
use crate::sink::StatusSink;
use crate::store::StateStore;
use crate::transport::{SignalReceiver, Transport, TransportError, TransportFactory, TransportSignal};

/// Errors raised synchronously by [`ConnectionSession::start`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The transport could not be created or started.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Host collaborators for one session start.
#[derive(Clone)]
pub struct SessionHandlers {
    /// Receives status transitions and log lines.
    pub sink: Arc<dyn StatusSink>,
    /// Receives state updates.
    pub store: Arc<dyn StateStore>,
}

struct ActiveConnection {
    transport: Arc<dyn Transport>,
    pump: JoinHandle<()>,
}

/// Connection lifecycle manager for one room at a time.
///
/// # Example
///
/// ```ignore
/// let mut session = ConnectionSession::new(SocketIoFactory::default());
/// let config = ConnectionConfig::from_api_url("https://api.example.io/v1/", "r1", key)?;
/// session.start(config, SessionHandlers { sink, store }).await?;
/// // ...
/// session.stop().await;
/// ```
pub struct ConnectionSession<F: TransportFactory> {
    factory: F,
    policy: ReconnectPolicy,
    active: Option<ActiveConnection>,
}

impl<F: TransportFactory> ConnectionSession<F> {
    /// Create a session with the default reconnect policy.
    pub fn new(factory: F) -> Self {
        Self::with_policy(factory, ReconnectPolicy::default())
    }

    /// Create a session with a custom reconnect policy.
    pub fn with_policy(factory: F, policy: ReconnectPolicy) -> Self {
        Self {
            factory,
            policy,
            active: None,
        }
    }

    /// The transport factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Whether a transport is currently owned by this session.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Wait until the current connection has ended for good.
    ///
    /// Resolves once the transport stops producing signals without a local
    /// `stop()`: reconnection gave up, or the server ended the session.
    /// Resolves at once if no connection is active.
    pub async fn finished(&mut self) {
        if let Some(active) = self.active.as_mut() {
            if !active.pump.is_finished() {
                let _ = (&mut active.pump).await;
            }
        }
    }

    /// Start a fresh connection, replacing any existing one.
    ///
    /// Emits `Connecting` before the connect call is issued. Configuration
    /// problems are returned here; everything after that is reported through
    /// the sink.
    pub async fn start(
        &mut self,
        config: ConnectionConfig,
        handlers: SessionHandlers,
    ) -> Result<(), SessionError> {
        self.stop().await;
        config.validate()?;

        let (transport, signals) = self.factory.open(&config, &self.policy)?;
        tracing::info!("Starting session for room {}", config.room_id);

        let context = SyncContext::new(
            ApiClient::new(Arc::clone(&transport)),
            handlers.store,
            Arc::clone(&handlers.sink),
        );
        let mut pump = Pump {
            state: ConnectionState::new(),
            sink: handlers.sink,
            dispatcher: Dispatcher::new(context.clone()),
            context,
        };
        pump.apply(Event::StartRequested);

        self.active = Some(ActiveConnection {
            transport: Arc::clone(&transport),
            pump: tokio::spawn(pump.run(signals)),
        });

        transport.connect().await?;
        Ok(())
    }

    /// Close the current connection, if any. Idempotent.
    pub async fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        tracing::debug!("Stopping session");
        if let Err(e) = active.transport.close().await {
            tracing::warn!("Failed to close transport: {}", e);
        }
        // In-flight fetches are separate tasks and are left to finish.
        active.pump.abort();
    }
}

/// Per-connection signal loop.
struct Pump {
    state: ConnectionState,
    sink: Arc<dyn StatusSink>,
    context: SyncContext,
    dispatcher: Dispatcher,
}

impl Pump {
    async fn run(mut self, mut signals: SignalReceiver) {
        while let Some(signal) = signals.recv().await {
            self.on_signal(signal);
        }
        tracing::debug!("Transport signal stream ended");
    }

    fn on_signal(&mut self, signal: TransportSignal) {
        let event = match signal {
            TransportSignal::Connected => Event::ConnectSucceeded,
            TransportSignal::ConnectError(error) => Event::ConnectFailed { error },
            TransportSignal::Disconnected(reason) => Event::Disconnected { reason },
            TransportSignal::Error(error) => Event::ChannelError { error },
            TransportSignal::ReconnectAttempt(attempt) => Event::ReconnectAttempt { attempt },
            TransportSignal::Reconnected(attempt) => Event::ReconnectSucceeded { attempt },
            TransportSignal::ReconnectFailed => Event::ReconnectExhausted,
            TransportSignal::Event { name, payload } => {
                self.dispatcher.dispatch(&name, payload);
                return;
            }
        };
        self.apply(event);
    }

    fn apply(&mut self, event: Event) {
        let (state, actions) = self.state.on_event(event);
        self.state = state;

        for action in actions {
            match action {
                Action::Log { level, message } => self.context.log(level, &message),
                Action::EmitStatus(status) => self.sink.update_status(status),
                Action::Bootstrap => {
                    let context = self.context.clone();
                    tokio::spawn(async move { context.bootstrap().await });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_support::{settle, RecordingSink};
    use crate::transport::MockFactory;
    use serde_json::json;
    use sync_types::{ConnectionStatus, LogLevel, RequestKind, LOCAL_DISCONNECT_REASON};

    fn config() -> ConnectionConfig {
        ConnectionConfig::from_api_url("https://api.example.io/v1/", "r1", "key").unwrap()
    }

    fn handlers() -> (Arc<RecordingSink>, Arc<MemoryStore>, SessionHandlers) {
        let sink = Arc::new(RecordingSink::default());
        let store = Arc::new(MemoryStore::new());
        let handlers = SessionHandlers {
            sink: sink.clone(),
            store: store.clone(),
        };
        (sink, store, handlers)
    }

    fn factory() -> MockFactory {
        let factory = MockFactory::new();
        factory.respond_ok(RequestKind::GetRoom, json!({ "_id": "r1", "name": "Main" }));
        factory.respond_ok(RequestKind::GetStatus, json!({ "timer_id": null }));
        factory
    }

    #[tokio::test]
    async fn stop_without_start_is_a_noop() {
        let mut session = ConnectionSession::new(MockFactory::new());
        session.stop().await;
        session.stop().await;
        assert!(!session.is_active());
        assert!(session.factory().transports().is_empty());
    }

    #[tokio::test]
    async fn start_emits_connecting_then_ok() {
        let (sink, store, handlers) = handlers();
        let mut session = ConnectionSession::new(factory());

        session.start(config(), handlers).await.unwrap();
        settle(|| store.snapshot().room_name.is_some()).await;

        assert_eq!(
            sink.statuses(),
            vec![ConnectionStatus::Connecting, ConnectionStatus::Ok]
        );
        assert!(session.is_active());
    }

    #[tokio::test]
    async fn local_disconnect_after_connect_is_suppressed() {
        let (sink, store, handlers) = handlers();
        let mut session = ConnectionSession::new(factory());

        session.start(config(), handlers).await.unwrap();
        settle(|| store.snapshot().room_name.is_some()).await;
        let transport = session.factory().last().unwrap();
        transport.emit(TransportSignal::Disconnected(LOCAL_DISCONNECT_REASON.into()));
        settle(|| sink.has_log(LogLevel::Debug, "Disconnected by client")).await;
        session.stop().await;

        assert_eq!(
            sink.statuses(),
            vec![ConnectionStatus::Connecting, ConnectionStatus::Ok]
        );
        assert_eq!(transport.close_calls(), 1);
    }

    #[tokio::test]
    async fn finished_resolves_after_reconnection_gives_up() {
        let (sink, _store, handlers) = handlers();
        let factory = MockFactory::new();
        factory.script_connect(vec![
            TransportSignal::ConnectError("unreachable".into()),
            TransportSignal::ReconnectFailed,
        ]);
        let mut session = ConnectionSession::new(factory);

        session.start(config(), handlers).await.unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), session.finished())
            .await
            .unwrap();

        assert_eq!(
            sink.statuses(),
            vec![
                ConnectionStatus::Connecting,
                ConnectionStatus::ConnectionFailure,
                ConnectionStatus::ConnectionFailure,
            ]
        );
        // Still resolves on a second call.
        session.finished().await;
        session.stop().await;
    }

    #[tokio::test]
    async fn finished_stays_pending_while_connected() {
        let (_sink, store, handlers) = handlers();
        let mut session = ConnectionSession::new(factory());

        session.start(config(), handlers).await.unwrap();
        settle(|| store.snapshot().room_name.is_some()).await;

        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(50), session.finished()).await;
        assert!(waited.is_err());
        session.stop().await;
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_connecting() {
        let (sink, _store, handlers) = handlers();
        let mut session = ConnectionSession::new(MockFactory::new());
        let mut bad = config();
        bad.api_key.clear();

        let result = session.start(bad, handlers).await;

        assert!(matches!(
            result,
            Err(SessionError::Config(ConfigError::MissingApiKey))
        ));
        assert!(sink.statuses().is_empty());
        assert!(!session.is_active());
    }
}
