// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `murmur status` command implementation.

use murmur_config::MurmurConfig;
use murmur_core::MurmurError;

/// Query a running instance's gateway and print its status JSON.
pub async fn run_status(config: &MurmurConfig) -> Result<(), MurmurError> {
    let url = format!(
        "http://{}:{}/api/status",
        config.gateway.host, config.gateway.port
    );

    let response = reqwest::get(&url).await.map_err(|e| MurmurError::Channel {
        message: format!("could not reach {url}: {e}"),
        source: Some(Box::new(e)),
    })?;
    let status = response.status();
    let body: serde_json::Value =
        response.json().await.map_err(|e| MurmurError::Channel {
            message: format!("malformed status response: {e}"),
            source: Some(Box::new(e)),
        })?;

    if !status.is_success() {
        return Err(MurmurError::Channel {
            message: format!("status endpoint returned {status}: {body}"),
            source: None,
        });
    }

    println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    Ok(())
}
