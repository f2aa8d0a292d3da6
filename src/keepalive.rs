//! Keep-alive poller: periodic cheap requests so the portal does not expire
//! an idle session. Not part of the protocol core; any transport failure
//! ends the loop so the caller can decide to re-login.

use anyhow::{Context, Result};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(3);
const POLL_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn keep_alive_loop(target: &str) -> Result<()> {
    tracing::info!("accessing {target} periodically to keep the session alive");
    let client = reqwest::Client::builder()
        .timeout(POLL_TIMEOUT)
        .build()
        .context("failed to build keep-alive client")?;
    loop {
        let resp = client
            .head(target)
            .send()
            .await
            .with_context(|| format!("accessing {target} failed (re-login might be required)"))?;
        tracing::debug!(status = %resp.status(), "keep-alive poll");
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
