//! Web server command

use std::path::Path;

use anyhow::Result;
use pulse_server::ServerConfig;

use super::open_db;

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16, no_auth: bool) -> Result<()> {
    let db = open_db(db_path)?;

    // API keys come from the environment, comma separated
    let api_keys: Vec<String> = std::env::var("PULSE_API_KEYS")
        .map(|keys| {
            keys.split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let allowed_origins: Vec<String> = std::env::var("PULSE_ALLOWED_ORIGINS")
        .map(|origins| {
            origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let config = ServerConfig {
        require_auth: !no_auth,
        allowed_origins,
        api_keys,
    };

    pulse_server::serve_with_config(db, host, port, config).await
}
