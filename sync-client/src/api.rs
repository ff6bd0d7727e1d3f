//! Typed request/response calls over a transport.
//!
//! Every successful reply is wrapped in `{ "data": ... }`. A reply carrying
//! an `error` field instead is treated as a rejection.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use sync_types::{
    ApiResponse, RequestKind, RoomPayload, StatusPayload, TimerId, TimerPayload, TimerRequest,
};
use thiserror::Error;

use crate::transport::{Transport, TransportError};

/// Errors from a request/response call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport could not deliver the request or its reply.
    #[error("{kind} failed: {source}")]
    Transport {
        /// Request that failed.
        kind: RequestKind,
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },

    /// The service answered with an error.
    #[error("{kind} rejected: {message}")]
    Rejected {
        /// Request that was rejected.
        kind: RequestKind,
        /// Message supplied by the service.
        message: String,
    },

    /// Request params could not be encoded.
    #[error("{kind} params could not be encoded: {source}")]
    Encode {
        /// Request being built.
        kind: RequestKind,
        /// Serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// The reply did not have the expected shape.
    #[error("{kind} returned an unexpected reply: {source}")]
    Decode {
        /// Request whose reply was malformed.
        kind: RequestKind,
        /// Deserializer error.
        #[source]
        source: serde_json::Error,
    },
}

/// Request/response client bound to one transport.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    /// Wrap a transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send one request and await its `{ "data": ... }` reply.
    pub async fn send(
        &self,
        kind: RequestKind,
        params: Value,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let reply = self
            .transport
            .request(kind, params)
            .await
            .map_err(|source| ApiError::Transport { kind, source })?;

        if let Some(message) = rejection(&reply) {
            return Err(ApiError::Rejected { kind, message });
        }

        serde_json::from_value(reply).map_err(|source| ApiError::Decode { kind, source })
    }

    /// Fetch the room (`get_room`).
    pub async fn get_room(&self) -> Result<RoomPayload, ApiError> {
        self.fetch(RequestKind::GetRoom, Value::Null).await
    }

    /// Fetch the playback status (`get_status`).
    pub async fn get_status(&self) -> Result<StatusPayload, ApiError> {
        self.fetch(RequestKind::GetStatus, Value::Null).await
    }

    /// Fetch one timer's details (`get_timer`).
    pub async fn get_timer(&self, timer_id: &TimerId) -> Result<TimerPayload, ApiError> {
        let kind = RequestKind::GetTimer;
        let params = serde_json::to_value(TimerRequest {
            timer_id: timer_id.as_str().to_string(),
        })
        .map_err(|source| ApiError::Encode { kind, source })?;

        self.fetch(kind, params).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        kind: RequestKind,
        params: Value,
    ) -> Result<T, ApiError> {
        let response = self.send(kind, params).await?;
        serde_json::from_value(response.data).map_err(|source| ApiError::Decode { kind, source })
    }
}

/// Extract the service's error message, if the reply is a rejection.
fn rejection(reply: &Value) -> Option<String> {
    match reply.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(
            other
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        ),
    }
}
