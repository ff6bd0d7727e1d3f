//! Configuration management for roomtimer.
//!
//! One TOML file, `config.toml`, in the data directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sync_client::ConnectionConfig;

const CONFIG_FILE: &str = "config.toml";

/// Room connection settings stored locally.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the timer service API.
    pub api_url: String,
    /// Room to join.
    pub room_id: String,
    /// Room API key.
    pub api_key: String,
}

/// Values given on the command line, overriding the stored file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub room_id: Option<String>,
    pub api_key: Option<String>,
}

impl ClientConfig {
    /// Path of the config file inside a data directory.
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }

    /// Load configuration from a directory.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::path(data_dir);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Not configured. Run 'roomtimer init' first.")?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Save configuration to a directory (owner read/write only).
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = Self::path(data_dir);
        let contents = toml::to_string_pretty(self).context("Failed to encode configuration")?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save configuration")?;
        set_file_permissions_0600(&path).await?;
        Ok(())
    }

    /// Check if a configuration file exists.
    pub async fn exists(data_dir: &Path) -> bool {
        tokio::fs::try_exists(Self::path(data_dir))
            .await
            .unwrap_or(false)
    }

    /// Stored configuration with command-line values applied on top.
    ///
    /// Without a stored file every value must come from the command line.
    pub async fn resolve(data_dir: &Path, overrides: Overrides) -> Result<Self> {
        if Self::exists(data_dir).await {
            let stored = Self::load(data_dir).await?;
            return Ok(stored.with_overrides(overrides));
        }

        match overrides {
            Overrides {
                api_url: Some(api_url),
                room_id: Some(room_id),
                api_key: Some(api_key),
            } => Ok(Self {
                api_url,
                room_id,
                api_key,
            }),
            _ => anyhow::bail!(
                "Not configured. Run 'roomtimer init' or pass --api-url, --room-id and --api-key."
            ),
        }
    }

    fn with_overrides(self, overrides: Overrides) -> Self {
        Self {
            api_url: overrides.api_url.unwrap_or(self.api_url),
            room_id: overrides.room_id.unwrap_or(self.room_id),
            api_key: overrides.api_key.unwrap_or(self.api_key),
        }
    }

    /// Validated connection settings for the client library.
    pub fn connection(&self) -> Result<ConnectionConfig> {
        ConnectionConfig::from_api_url(&self.api_url, self.room_id.as_str(), self.api_key.as_str())
            .context("Invalid room configuration")
    }

    /// API key safe for display: first four characters only.
    pub fn redacted_key(&self) -> String {
        if self.api_key.chars().count() <= 8 {
            return "[REDACTED]".to_string();
        }
        let prefix: String = self.api_key.chars().take(4).collect();
        format!("{prefix}...[REDACTED]")
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("room_id", &self.room_id)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Set directory permissions to 0700 (owner only) on Unix.
/// No-op on non-Unix platforms.
pub async fn set_dir_permissions_0700(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .await
            .context("Failed to set directory permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> ClientConfig {
        ClientConfig {
            api_url: "https://api.example.io/v1/".into(),
            room_id: "r1".into(),
            api_key: "sk_live_0123456789".into(),
        }
    }

    #[tokio::test]
    async fn config_roundtrip() {
        let dir = tempdir().unwrap();
        sample().save(dir.path()).await.unwrap();

        let loaded = ClientConfig::load(dir.path()).await.unwrap();
        assert_eq!(loaded, sample());
        assert!(ClientConfig::exists(dir.path()).await);
    }

    #[tokio::test]
    async fn load_without_file_explains_init() {
        let dir = tempdir().unwrap();
        let err = ClientConfig::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("roomtimer init"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn config_file_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        sample().save(dir.path()).await.unwrap();

        let perms = tokio::fs::metadata(ClientConfig::path(dir.path()))
            .await
            .unwrap()
            .permissions();
        assert_eq!(perms.mode() & 0o777, 0o600, "file should be 0600");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn data_dir_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("test-data");
        tokio::fs::create_dir_all(&data_dir).await.unwrap();
        set_dir_permissions_0700(&data_dir).await.unwrap();

        let perms = tokio::fs::metadata(&data_dir).await.unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o700, "dir should be 0700");
    }

    #[tokio::test]
    async fn flags_override_stored_values() {
        let dir = tempdir().unwrap();
        sample().save(dir.path()).await.unwrap();

        let resolved = ClientConfig::resolve(
            dir.path(),
            Overrides {
                room_id: Some("r2".into()),
                ..Overrides::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(resolved.room_id, "r2");
        assert_eq!(resolved.api_url, sample().api_url);
    }

    #[tokio::test]
    async fn flags_alone_need_every_value() {
        let dir = tempdir().unwrap();
        let partial = Overrides {
            api_url: Some("https://api.example.io/".into()),
            ..Overrides::default()
        };
        assert!(ClientConfig::resolve(dir.path(), partial).await.is_err());

        let full = Overrides {
            api_url: Some("https://api.example.io/".into()),
            room_id: Some("r1".into()),
            api_key: Some("k".into()),
        };
        let resolved = ClientConfig::resolve(dir.path(), full).await.unwrap();
        assert_eq!(resolved.room_id, "r1");
    }

    #[test]
    fn connection_validates() {
        assert!(sample().connection().is_ok());
        let mut bad = sample();
        bad.api_url = "ftp://example.io".into();
        assert!(bad.connection().is_err());
    }

    #[test]
    fn key_is_redacted() {
        let config = sample();
        assert_eq!(config.redacted_key(), "sk_l...[REDACTED]");
        assert!(!format!("{:?}", config).contains("0123456789"));

        let short = ClientConfig {
            api_key: "abc".into(),
            ..sample()
        };
        assert_eq!(short.redacted_key(), "[REDACTED]");
    }
}
