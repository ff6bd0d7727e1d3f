//! Show the stored configuration.

use anyhow::Result;
use std::path::Path;

use crate::config::ClientConfig;

/// Run the status command.
pub async fn run(data_dir: &Path) -> Result<()> {
    println!("=== roomtimer status ===");
    println!();

    let config = match ClientConfig::load(data_dir).await {
        Ok(config) => config,
        Err(_) => {
            println!("Room: NOT CONFIGURED");
            println!();
            println!("Run 'roomtimer init --api-url <URL> --room-id <ID> --api-key <KEY>'.");
            return Ok(());
        }
    };

    println!("Room:");
    println!("  ID:      {}", config.room_id);
    println!("  API URL: {}", config.api_url);
    println!("  API key: {}", config.redacted_key());

    match config.connection() {
        Ok(connection) => {
            let socket = connection
                .socket_url()
                .map(|url| url.to_string())
                .unwrap_or_else(|e| format!("unavailable ({e})"));
            println!("  Socket:  {}", socket);
        }
        Err(e) => println!("  INVALID: {:#}", e),
    }

    println!();
    println!("  Config:  {}", ClientConfig::path(data_dir).display());

    Ok(())
}
