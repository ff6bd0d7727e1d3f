//! Socket.IO v4 text packets over Engine.IO v4.
//!
//! Only the subset the client needs: the Engine.IO open/close/ping/pong
//! frames and the Socket.IO connect, disconnect, event, ack and
//! connect-error packets on the default namespace.

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Engine.IO pong, sent in reply to a server ping.
pub(crate) const PONG: &str = "3";

/// Socket.IO disconnect on the default namespace.
pub(crate) const DISCONNECT: &str = "41";

/// Packet decoding errors.
#[derive(Debug, Error)]
pub(crate) enum PacketError {
    /// Empty frame.
    #[error("empty packet")]
    Empty,

    /// Unknown Engine.IO or Socket.IO packet type.
    #[error("unknown packet type: {0}")]
    UnknownType(String),

    /// Structurally invalid packet.
    #[error("malformed packet: {0}")]
    Malformed(String),

    /// Invalid JSON body.
    #[error("invalid packet body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Engine.IO handshake data from the open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OpenInfo {
    pub sid: String,
    pub ping_interval: u64,
    pub ping_timeout: u64,
}

/// Upper bound on the ping deadline, whatever the server advertises.
const MAX_PING_DEADLINE: Duration = Duration::from_secs(60 * 60);

impl OpenInfo {
    /// How long to wait for a server ping before declaring the link dead.
    pub fn ping_deadline(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
            .min(MAX_PING_DEADLINE)
    }
}

/// One decoded packet.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Packet {
    /// Engine.IO open (`0{...}`).
    Open(OpenInfo),
    /// Engine.IO close (`1`).
    Close,
    /// Engine.IO ping (`2`).
    Ping,
    /// Engine.IO pong (`3`).
    Pong,
    /// Engine.IO noop/upgrade frames, ignored.
    Noop,
    /// Socket.IO namespace connected (`40{...}`).
    Connect(Value),
    /// Socket.IO server-side disconnect (`41`).
    Disconnect,
    /// Socket.IO event (`42[id]["name", payload]`).
    Event { name: String, payload: Value },
    /// Socket.IO ack (`43<id>[args...]`).
    Ack { id: u64, args: Vec<Value> },
    /// Socket.IO connect refused (`44{"message": ...}`).
    ConnectError(String),
}

/// Decode one text frame.
pub(crate) fn decode(text: &str) -> Result<Packet, PacketError> {
    let mut chars = text.chars();
    let engine = chars.next().ok_or(PacketError::Empty)?;
    let rest = chars.as_str();

    match engine {
        '0' => Ok(Packet::Open(serde_json::from_str(rest)?)),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '5' | '6' => Ok(Packet::Noop),
        '4' => decode_socket(rest),
        other => Err(PacketError::UnknownType(other.to_string())),
    }
}

fn decode_socket(text: &str) -> Result<Packet, PacketError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(PacketError::Empty)?;
    let rest = chars.as_str();

    match kind {
        '0' => {
            let body = if rest.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(rest)?
            };
            Ok(Packet::Connect(body))
        }
        '1' => Ok(Packet::Disconnect),
        '2' => {
            // Server may ask for an ack; the id is not used by the client.
            let (_, body) = split_id(rest);
            let mut args = parse_args(body)?;
            if args.is_empty() {
                return Err(PacketError::Malformed("event without name".into()));
            }
            let name = match args.remove(0) {
                Value::String(name) => name,
                other => return Err(PacketError::Malformed(format!("event name {other}"))),
            };
            let payload = args.into_iter().next().unwrap_or(Value::Null);
            Ok(Packet::Event { name, payload })
        }
        '3' => {
            let (id, body) = split_id(rest);
            let id = id.ok_or_else(|| PacketError::Malformed("ack without id".into()))?;
            Ok(Packet::Ack {
                id,
                args: parse_args(body)?,
            })
        }
        '4' => {
            let body: Value = serde_json::from_str(rest)?;
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string());
            Ok(Packet::ConnectError(message))
        }
        other => Err(PacketError::UnknownType(format!("4{other}"))),
    }
}

/// Split a leading decimal ack id from the JSON body.
fn split_id(text: &str) -> (Option<u64>, &str) {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, body) = text.split_at(end);
    (digits.parse().ok(), body)
}

fn parse_args(body: &str) -> Result<Vec<Value>, PacketError> {
    match serde_json::from_str(body)? {
        Value::Array(args) => Ok(args),
        other => Err(PacketError::Malformed(format!("expected array, got {other}"))),
    }
}

/// Socket.IO connect packet carrying the auth payload.
pub(crate) fn encode_connect(auth: &Value) -> String {
    format!("40{auth}")
}

/// Socket.IO event packet that expects an ack with the given id.
pub(crate) fn encode_request(id: u64, name: &str, params: &Value) -> String {
    let args = if params.is_null() {
        Value::Array(vec![Value::String(name.to_string())])
    } else {
        Value::Array(vec![Value::String(name.to_string()), params.clone()])
    };
    format!("42{id}{args}")
}
