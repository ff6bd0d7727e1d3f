//! Connection configuration for one room.

use sync_types::RoomId;
use thiserror::Error;
use url::Url;

/// Path segment the service mounts its Socket.IO endpoint under.
const SOCKET_SEGMENT: &str = "socket.io";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// API URL could not be parsed.
    #[error("invalid API URL {url:?}: {source}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// API URL is not http or https.
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// Room id is blank.
    #[error("room id is required")]
    MissingRoomId,

    /// API key is blank.
    #[error("API key is required")]
    MissingApiKey,
}

/// Everything needed to open a connection to one room.
///
/// Immutable for the lifetime of a connection attempt.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Scheme, host and port of the service (`https://api.example.io/`).
    pub service_origin: Url,
    /// Handshake path, e.g. `/v1/socket.io`.
    pub socket_path: String,
    /// Room to join.
    pub room_id: RoomId,
    /// Room API key, sent with the connect packet.
    pub api_key: String,
}

impl ConnectionConfig {
    /// Split an API URL into origin and path; the handshake path is the
    /// URL's path followed by `socket.io`.
    ///
    /// A path without a trailing slash is treated as a directory, so
    /// `https://host/v1` and `https://host/v1/` both give `/v1/socket.io`.
    pub fn from_api_url(
        api_url: &str,
        room_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let url = Url::parse(api_url).map_err(|source| ConfigError::InvalidUrl {
            url: api_url.to_string(),
            source,
        })?;

        let mut path = url.path().to_string();
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(SOCKET_SEGMENT);

        let mut service_origin = url;
        service_origin.set_path("/");
        service_origin.set_query(None);
        service_origin.set_fragment(None);

        let config = Self {
            service_origin,
            socket_path: path,
            room_id: RoomId::new(room_id),
            api_key: api_key.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the preconditions for starting a session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.service_origin.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
        if self.room_id.is_empty() {
            return Err(ConfigError::MissingRoomId);
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    /// WebSocket URL for the Engine.IO v4 transport.
    pub fn socket_url(&self) -> Result<Url, ConfigError> {
        let scheme = match self.service_origin.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };

        let mut url = self.service_origin.clone();
        url.set_scheme(scheme)
            .map_err(|_| ConfigError::UnsupportedScheme(scheme.to_string()))?;
        url.set_path(&format!("{}/", self.socket_path.trim_end_matches('/')));
        url.set_query(Some("EIO=4&transport=websocket"));
        Ok(url)
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("service_origin", &self.service_origin.as_str())
            .field("socket_path", &self.socket_path)
            .field("room_id", &self.room_id)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
