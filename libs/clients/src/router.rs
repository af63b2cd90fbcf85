use std::time::Duration;

use reqwest::header::HOST;

use crate::error::ClientError;

/// Issues requests through the router, selecting the route by Host header.
#[derive(Debug, Clone)]
pub struct RouterClient {
    client: reqwest::Client,
    router_addr: String,
}

impl RouterClient {
    pub fn new(router_addr: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            router_addr: router_addr.into(),
        })
    }

    /// Body and status of `GET /` for `host`.
    pub async fn get(&self, host: &str) -> Result<(String, u16), ClientError> {
        let response = self
            .client
            .get(format!("http://{}/", self.router_addr))
            .header(HOST, host)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((body, status))
    }
}

/// One-off request through the router at `router_addr` for `host`.
pub async fn response_body_and_status_code_from_host(
    router_addr: &str,
    host: &str,
) -> Result<(String, u16), ClientError> {
    RouterClient::new(router_addr)?.get(host).await
}
