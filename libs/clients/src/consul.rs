use std::time::{Duration, Instant};

use dusts_world::ComponentAddresses;
use tracing::{debug, info};

use crate::error::ClientError;

/// Time allowed for consul to elect a leader.
pub const CONSUL_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll consul's leader endpoint until it reports a leader.
pub async fn consul_wait_until_ready(
    addresses: &ComponentAddresses,
    timeout: Duration,
) -> Result<(), ClientError> {
    wait_for_leader(&addresses.consul_http_url()?, timeout).await
}

/// Poll `{base}/v1/status/leader` until the body is a non-empty address.
pub async fn wait_for_leader(base: &str, timeout: Duration) -> Result<(), ClientError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;
    let url = format!("{base}/v1/status/leader");
    let deadline = Instant::now() + timeout;

    loop {
        match leader(&client, &url).await {
            Ok(Some(leader)) => {
                info!(leader = %leader, "consul is ready");
                return Ok(());
            }
            Ok(None) => debug!("consul has no leader yet"),
            Err(e) => debug!(error = %e, "consul not reachable yet"),
        }

        if Instant::now() >= deadline {
            return Err(ClientError::Timeout {
                what: "a consul leader".to_string(),
                timeout,
            });
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

async fn leader(client: &reqwest::Client, url: &str) -> Result<Option<String>, ClientError> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Ok(None);
    }

    let leader: String = response.json().await?;
    Ok(Some(leader).filter(|l| !l.is_empty()))
}
