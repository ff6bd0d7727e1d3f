//! Store room connection settings.

use anyhow::Result;
use std::path::Path;

use crate::config::ClientConfig;

/// Run the init command.
pub async fn run(data_dir: &Path, config: ClientConfig, force: bool) -> Result<()> {
    if ClientConfig::exists(data_dir).await && !force {
        anyhow::bail!(
            "Already configured. Use --force to overwrite {}.",
            ClientConfig::path(data_dir).display()
        );
    }

    // Refuse to store something that could never connect.
    let connection = config.connection()?;
    config.save(data_dir).await?;

    println!("Room configured successfully!");
    println!();
    println!("  Room:     {}", connection.room_id);
    println!("  Service:  {}", connection.service_origin);
    println!("  Socket:   {}", connection.socket_path);
    println!("  API key:  {}", config.redacted_key());
    println!("  Data dir: {}", data_dir.display());
    println!();
    println!("Next step: roomtimer watch");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(room_id: &str) -> ClientConfig {
        ClientConfig {
            api_url: "https://api.example.io/v1/".into(),
            room_id: room_id.into(),
            api_key: "secret-key-123".into(),
        }
    }

    #[tokio::test]
    async fn init_creates_config() {
        let dir = tempdir().unwrap();
        run(dir.path(), config("r1"), false).await.unwrap();

        let loaded = ClientConfig::load(dir.path()).await.unwrap();
        assert_eq!(loaded.room_id, "r1");
    }

    #[tokio::test]
    async fn init_refuses_to_overwrite_without_force() {
        let dir = tempdir().unwrap();
        run(dir.path(), config("r1"), false).await.unwrap();

        assert!(run(dir.path(), config("r2"), false).await.is_err());
        run(dir.path(), config("r2"), true).await.unwrap();

        let loaded = ClientConfig::load(dir.path()).await.unwrap();
        assert_eq!(loaded.room_id, "r2");
    }

    #[tokio::test]
    async fn init_rejects_invalid_settings() {
        let dir = tempdir().unwrap();
        let mut bad = config("r1");
        bad.api_key = String::new();

        assert!(run(dir.path(), bad, false).await.is_err());
        assert!(!ClientConfig::exists(dir.path()).await);
    }
}
