//! SocketIoTransport - Socket.IO v4 client over a WebSocket.
//!
//! One background driver task owns the socket. It performs the Engine.IO and
//! Socket.IO handshakes, answers pings, forwards push events as signals,
//! correlates request acks, and runs the bounded reconnection schedule from
//! [`ReconnectPolicy`]. A server-initiated disconnect (`41`) ends the driver
//! without retrying, as Socket.IO clients do.

use super::packet::{self, OpenInfo, Packet};
use super::{
    SignalReceiver, SignalSender, Transport, TransportError, TransportFactory, TransportSignal,
};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sync_core::{ReconnectAction, ReconnectPolicy, ReconnectState};
use sync_types::{RequestKind, LOCAL_DISCONNECT_REASON};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::config::ConnectionConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Reason reported when the server ends the session with `41`.
const SERVER_DISCONNECT_REASON: &str = "io server disconnect";

/// Reply channel of one in-flight request.
type PendingTx = oneshot::Sender<Result<Value, TransportError>>;

/// Configuration for SocketIoTransport.
#[derive(Clone, Debug)]
pub struct SocketIoConfig {
    /// Limit for one connection attempt (WebSocket + both handshakes).
    pub connect_timeout: Duration,
}

impl Default for SocketIoConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(20),
        }
    }
}

/// Commands from the handle to the driver task.
enum Command {
    Request {
        kind: RequestKind,
        params: Value,
        reply: PendingTx,
    },
    Close,
}

/// SocketIoTransport implements the Transport trait over Socket.IO v4.
///
/// # Example
///
/// ```ignore
/// let (transport, mut signals) = SocketIoTransport::new(url, auth, config, policy);
/// transport.connect().await?;
/// let room = transport.request(RequestKind::GetRoom, Value::Null).await?;
/// ```
pub struct SocketIoTransport {
    commands: mpsc::UnboundedSender<Command>,
    connected: Arc<AtomicBool>,
    /// Taken by the first `connect()`.
    driver: Mutex<Option<Driver>>,
}

impl SocketIoTransport {
    /// Create a transport for the given WebSocket URL and auth payload.
    ///
    /// Nothing happens on the network until [`Transport::connect`].
    pub fn new(
        url: Url,
        auth: Value,
        config: SocketIoConfig,
        policy: ReconnectPolicy,
    ) -> (Self, SignalReceiver) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));

        let driver = Driver {
            url,
            auth,
            config,
            policy,
            commands: command_rx,
            signals: signal_tx,
            connected: Arc::clone(&connected),
        };

        (
            Self {
                commands: command_tx,
                connected,
                driver: Mutex::new(Some(driver)),
            },
            signal_rx,
        )
    }
}

#[async_trait]
impl Transport for SocketIoTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let driver = self
            .driver
            .lock()
            .await
            .take()
            .ok_or_else(|| TransportError::ConnectionFailed("transport already started".into()))?;

        tokio::spawn(driver.run());
        Ok(())
    }

    async fn request(&self, kind: RequestKind, params: Value) -> Result<Value, TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Request {
                kind,
                params,
                reply,
            })
            .map_err(|_| TransportError::ConnectionClosed)?;

        response
            .await
            .map_err(|_| TransportError::ConnectionClosed)?
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn close(&self) -> Result<(), TransportError> {
        // Never started: dropping the driver ends the signal stream.
        if self.driver.lock().await.take().is_some() {
            return Ok(());
        }
        // The driver may already be gone; that is a closed transport too.
        let _ = self.commands.send(Command::Close);
        Ok(())
    }
}

/// Outcome of one connection attempt.
enum Attempt {
    Ready(WsStream, OpenInfo),
    Failed(String),
    Closed,
}

/// Why a live link ended.
enum LinkEnd {
    /// Closed by this handle.
    Closed,
    /// Ended by the server with a Socket.IO disconnect; not retried.
    Kicked,
    Lost(String),
}

/// Background task owning the socket and the retry schedule.
struct Driver {
    url: Url,
    auth: Value,
    config: SocketIoConfig,
    policy: ReconnectPolicy,
    commands: mpsc::UnboundedReceiver<Command>,
    signals: SignalSender,
    connected: Arc<AtomicBool>,
}

impl Driver {
    async fn run(mut self) {
        let mut reconnect = ReconnectState::Idle;

        loop {
            let attempt = reconnect.attempt();

            match self.establish().await {
                Attempt::Closed => return,
                Attempt::Ready(ws, info) => {
                    reconnect = reconnect.on_success();
                    self.connected.store(true, Ordering::Release);
                    tracing::debug!("Socket connected (sid {})", info.sid);
                    self.signal(match attempt {
                        None => TransportSignal::Connected,
                        Some(n) => TransportSignal::Reconnected(n),
                    });

                    let end = self.serve(ws, &info).await;
                    self.connected.store(false, Ordering::Release);

                    match end {
                        LinkEnd::Closed => {
                            self.signal(TransportSignal::Disconnected(
                                LOCAL_DISCONNECT_REASON.into(),
                            ));
                            return;
                        }
                        LinkEnd::Kicked => {
                            tracing::info!("Server ended the session; not reconnecting");
                            self.signal(TransportSignal::Disconnected(
                                SERVER_DISCONNECT_REASON.into(),
                            ));
                            return;
                        }
                        LinkEnd::Lost(reason) => {
                            self.signal(TransportSignal::Disconnected(reason));
                        }
                    }
                }
                Attempt::Failed(error) => {
                    tracing::debug!("Connect attempt failed: {}", error);
                    self.signal(TransportSignal::ConnectError(error));
                }
            }

            let (next, action) = reconnect.on_failure(&self.policy);
            reconnect = next;

            match action {
                ReconnectAction::Wait { attempt, delay } => {
                    tracing::debug!("Reconnect attempt {} in {:?}", attempt, delay);
                    if !self.wait(delay).await {
                        return;
                    }
                    self.signal(TransportSignal::ReconnectAttempt(attempt));
                }
                ReconnectAction::GiveUp => {
                    self.signal(TransportSignal::ReconnectFailed);
                    return;
                }
            }
        }
    }

    fn signal(&self, signal: TransportSignal) {
        // Receiver gone means nobody is listening any more; keep running
        // until closed.
        let _ = self.signals.send(signal);
    }

    /// One connection attempt, abandoned early if the handle closes.
    async fn establish(&mut self) -> Attempt {
        let handshake = tokio::time::timeout(
            self.config.connect_timeout,
            handshake(self.url.clone(), self.auth.clone()),
        );
        tokio::pin!(handshake);

        loop {
            tokio::select! {
                result = &mut handshake => {
                    return match result {
                        Ok(Ok((ws, info))) => Attempt::Ready(ws, info),
                        Ok(Err(error)) => Attempt::Failed(error),
                        Err(_) => Attempt::Failed("timeout".into()),
                    };
                }
                command = self.commands.recv() => match command {
                    None | Some(Command::Close) => return Attempt::Closed,
                    Some(Command::Request { reply, .. }) => {
                        let _ = reply.send(Err(TransportError::NotConnected));
                    }
                },
            }
        }
    }

    /// Sleep between attempts. Returns false if the handle closed meanwhile.
    async fn wait(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                command = self.commands.recv() => match command {
                    None | Some(Command::Close) => return false,
                    Some(Command::Request { reply, .. }) => {
                        let _ = reply.send(Err(TransportError::NotConnected));
                    }
                },
            }
        }
    }

    /// Run a live link until it is closed locally or lost.
    async fn serve(&mut self, ws: WsStream, info: &OpenInfo) -> LinkEnd {
        let (mut ws_tx, mut ws_rx) = ws.split();
        let mut pending: HashMap<u64, PendingTx> = HashMap::new();
        let mut next_id: u64 = 0;

        let deadline = tokio::time::sleep(info.ping_deadline());
        tokio::pin!(deadline);

        let end = loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    None | Some(Command::Close) => {
                        let _ = ws_tx.send(text_frame(packet::DISCONNECT)).await;
                        let _ = ws_tx.close().await;
                        break LinkEnd::Closed;
                    }
                    Some(Command::Request { kind, params, reply }) => {
                        let id = next_id;
                        next_id += 1;
                        tracing::debug!("Request {} ({})", kind, id);

                        let frame = packet::encode_request(id, kind.as_str(), &params);
                        if let Err(e) = ws_tx.send(text_frame(frame)).await {
                            let _ = reply.send(Err(TransportError::SendFailed(e.to_string())));
                            break LinkEnd::Lost("transport error".into());
                        }
                        pending.insert(id, reply);
                    }
                },
                frame = ws_rx.next() => match frame {
                    None | Some(Ok(Message::Close(_))) => {
                        break LinkEnd::Lost("transport close".into());
                    }
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error: {}", e);
                        break LinkEnd::Lost("transport error".into());
                    }
                    Some(Ok(Message::Text(body))) => match packet::decode(body.as_str()) {
                        Ok(Packet::Ping) => {
                            deadline.as_mut().reset(Instant::now() + info.ping_deadline());
                            if ws_tx.send(text_frame(packet::PONG)).await.is_err() {
                                break LinkEnd::Lost("transport error".into());
                            }
                        }
                        Ok(Packet::Event { name, payload }) => {
                            self.signal(TransportSignal::Event { name, payload });
                        }
                        Ok(Packet::Ack { id, args }) => match pending.remove(&id) {
                            Some(reply) => {
                                let value = args.into_iter().next().unwrap_or(Value::Null);
                                let _ = reply.send(Ok(value));
                            }
                            None => tracing::debug!("Ack for unknown request {}", id),
                        },
                        Ok(Packet::Disconnect) => break LinkEnd::Kicked,
                        Ok(Packet::Close) => break LinkEnd::Lost("transport close".into()),
                        Ok(Packet::ConnectError(message)) => {
                            self.signal(TransportSignal::Error(message));
                        }
                        Ok(Packet::Open(_) | Packet::Connect(_) | Packet::Pong | Packet::Noop) => {}
                        Err(e) => self.signal(TransportSignal::Error(e.to_string())),
                    },
                    Some(Ok(_)) => {}
                },
                _ = &mut deadline => break LinkEnd::Lost("ping timeout".into()),
            }
        };

        for (_, reply) in pending.drain() {
            let _ = reply.send(Err(TransportError::ConnectionClosed));
        }
        end
    }
}

/// WebSocket connect, Engine.IO open, Socket.IO namespace connect.
async fn handshake(url: Url, auth: Value) -> Result<(WsStream, OpenInfo), String> {
    let (mut ws, _) = connect_async(url.as_str())
        .await
        .map_err(|e| e.to_string())?;

    let info = loop {
        match next_packet(&mut ws).await? {
            Packet::Open(info) => break info,
            Packet::Noop => continue,
            other => return Err(format!("unexpected packet before open: {other:?}")),
        }
    };

    ws.send(text_frame(packet::encode_connect(&auth)))
        .await
        .map_err(|e| e.to_string())?;

    loop {
        match next_packet(&mut ws).await? {
            Packet::Connect(_) => return Ok((ws, info)),
            Packet::ConnectError(message) => return Err(message),
            Packet::Ping => ws
                .send(text_frame(packet::PONG))
                .await
                .map_err(|e| e.to_string())?,
            Packet::Pong | Packet::Noop => {}
            other => return Err(format!("unexpected packet during connect: {other:?}")),
        }
    }
}

async fn next_packet(ws: &mut WsStream) -> Result<Packet, String> {
    loop {
        match ws.next().await {
            None | Some(Ok(Message::Close(_))) => return Err("transport close".into()),
            Some(Err(e)) => return Err(e.to_string()),
            Some(Ok(Message::Text(body))) => {
                return packet::decode(body.as_str()).map_err(|e| e.to_string())
            }
            Some(Ok(_)) => continue,
        }
    }
}

fn text_frame(body: impl Into<String>) -> Message {
    let body: String = body.into();
    Message::Text(body.into())
}

/// Builds a [`SocketIoTransport`] per session start.
#[derive(Debug, Clone, Default)]
pub struct SocketIoFactory {
    config: SocketIoConfig,
}

impl SocketIoFactory {
    /// Create a factory with custom transport configuration.
    pub fn new(config: SocketIoConfig) -> Self {
        Self { config }
    }
}

impl TransportFactory for SocketIoFactory {
    fn open(
        &self,
        config: &ConnectionConfig,
        policy: &ReconnectPolicy,
    ) -> Result<(Arc<dyn Transport>, SignalReceiver), TransportError> {
        let url = config
            .socket_url()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        let auth = json!({
            "room_id": config.room_id.as_str(),
            "api_key": config.api_key,
        });

        let (transport, signals) =
            SocketIoTransport::new(url, auth, self.config.clone(), policy.clone());
        Ok((Arc::new(transport), signals))
    }
}
