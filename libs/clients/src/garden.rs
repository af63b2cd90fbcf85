//! Minimal Garden API client used to clean up after scenarios.

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ClientError;

#[derive(Debug, Deserialize)]
struct Handles {
    #[serde(rename = "Handles", default)]
    handles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GardenErrorBody {
    #[serde(rename = "Message", default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct GardenClient {
    client: reqwest::Client,
    base_url: String,
}

impl GardenClient {
    /// Client for a garden server listening on `address` (`host:port`).
    pub fn new(address: &str) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("http://{address}"),
        })
    }

    /// Handles of every container.
    pub async fn containers(&self) -> Result<Vec<String>, ClientError> {
        let url = format!("{}/containers", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                url,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json::<Handles>().await?.handles)
    }

    pub async fn destroy(&self, handle: &str) -> Result<(), ClientError> {
        let url = format!("{}/containers/{handle}", self.base_url);
        let response = self.client.delete(&url).send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GardenErrorBody>(&body)
            .map(|e| e.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("{status}: {body}"));

        Err(ClientError::Garden {
            handle: handle.to_string(),
            message,
        })
    }

    /// Destroy every container and return the failures.
    ///
    /// Listing the containers must succeed; individual destroy failures are
    /// collected so one stuck container does not hide the others.
    pub async fn cleanup(&self) -> Result<Vec<ClientError>, ClientError> {
        let handles = self.containers().await?;
        let mut errors = Vec::new();

        for handle in &handles {
            if let Err(e) = self.destroy(handle).await {
                warn!(handle = %handle, error = %e, "failed to destroy container");
                errors.push(e);
            }
        }

        info!(
            containers = handles.len(),
            failures = errors.len(),
            "garden cleaned up"
        );
        Ok(errors)
    }
}
