//! BBS client speaking protobuf over HTTP(S).

use std::time::{Duration, Instant};

use dusts_world::{ComponentAddresses, SslConfig};
use prost::Message;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::models::{
    Action, ActualLrpGroup, ActualLrpGroupsByProcessGuidRequest, ActualLrpGroupsResponse,
    BbsError, DesireLrpRequest, DesiredLrp, DesiredLrpLifecycleResponse, DownloadAction,
    EnvironmentVariable, ProtoRoutes, RunAction,
};

const PROTOBUF: &str = "application/x-protobuf";

const DESIRE_LRP_ROUTE: &str = "/v1/desired_lrp/desire.r2";
const ACTUAL_LRP_GROUPS_BY_PROCESS_GUID_ROUTE: &str = "/v1/actual_lrp_groups/list_by_process_guid";

/// Domain the canary LRP is desired in.
pub const DEFAULT_DOMAIN: &str = "test-domain";
/// Hostname the canary LRP is routed on.
pub const DEFAULT_HOST: &str = "lrp-route";
pub const DEFAULT_PORT: u32 = 8080;
/// App archive the file server must serve for the canary LRP.
pub const CANARY_ARCHIVE: &str = "lrp.tgz";

#[derive(Debug, Clone)]
pub struct BbsClient {
    client: reqwest::Client,
    base_url: String,
}

impl BbsClient {
    /// Client for `base_url`. HTTPS URLs need the CA and client identity from `tls`.
    pub fn new(base_url: impl Into<String>, tls: Option<&SslConfig>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(30));

        if let Some(tls) = tls {
            let ca = std::fs::read(&tls.ca_cert)?;
            let mut identity = std::fs::read(&tls.client_cert)?;
            identity.extend(std::fs::read(&tls.client_key)?);

            builder = builder
                .use_rustls_tls()
                .add_root_certificate(reqwest::Certificate::from_pem(&ca)?)
                .identity(reqwest::Identity::from_pem(&identity)?);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Client for the node's BBS using its mutual TLS material.
    pub fn for_addresses(
        addresses: &ComponentAddresses,
        tls: &SslConfig,
    ) -> Result<Self, ClientError> {
        Self::new(format!("https://{}", addresses.bbs), Some(tls))
    }

    async fn post<Req: Message, Resp: Message + Default>(
        &self,
        route: &str,
        request: &Req,
    ) -> Result<Resp, ClientError> {
        let url = format!("{}{route}", self.base_url);
        debug!(url = %url, "bbs request");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, PROTOBUF)
            .body(request.encode_to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::UnexpectedStatus {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(Resp::decode(bytes)?)
    }

    pub async fn desire_lrp(&self, desired_lrp: &DesiredLrp) -> Result<(), ClientError> {
        let request = DesireLrpRequest {
            desired_lrp: Some(desired_lrp.clone()),
        };
        let response: DesiredLrpLifecycleResponse = self.post(DESIRE_LRP_ROUTE, &request).await?;
        check(response.error)?;

        info!(process_guid = %desired_lrp.process_guid, "desired lrp");
        Ok(())
    }

    pub async fn actual_lrp_groups_by_process_guid(
        &self,
        process_guid: &str,
    ) -> Result<Vec<ActualLrpGroup>, ClientError> {
        let request = ActualLrpGroupsByProcessGuidRequest {
            process_guid: process_guid.to_string(),
        };
        let response: ActualLrpGroupsResponse = self
            .post(ACTUAL_LRP_GROUPS_BY_PROCESS_GUID_ROUTE, &request)
            .await?;
        check(response.error)?;

        Ok(response.actual_lrp_groups)
    }

    /// State of the first instance of `process_guid`, or empty when there is none.
    pub async fn lrp_state(&self, process_guid: &str) -> Result<String, ClientError> {
        let groups = self.actual_lrp_groups_by_process_guid(process_guid).await?;
        Ok(groups
            .first()
            .and_then(ActualLrpGroup::resolve)
            .map(|lrp| lrp.state.clone())
            .unwrap_or_default())
    }

    /// Poll until the first instance reaches `state`. Request errors count as
    /// not yet there.
    pub async fn wait_for_lrp_state(
        &self,
        process_guid: &str,
        state: &str,
        timeout: Duration,
    ) -> Result<(), ClientError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.lrp_state(process_guid).await {
                Ok(current) if current == state => return Ok(()),
                Ok(current) => debug!(process_guid, state = %current, "waiting for lrp state"),
                Err(e) => debug!(process_guid, error = %e, "lrp state poll failed"),
            }

            if Instant::now() >= deadline {
                return Err(ClientError::Timeout {
                    what: format!("{process_guid} to be {state}"),
                    timeout,
                });
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }
}

fn check(error: Option<BbsError>) -> Result<(), ClientError> {
    match error {
        Some(e) => Err(ClientError::Bbs {
            kind: e.r#type,
            message: e.message,
        }),
        None => Ok(()),
    }
}

/// The canary: an app served from the file server's `lrp.tgz`, listening on
/// 8080 and routed on `lrp-route`.
pub fn default_lrp_create_request(
    addresses: &ComponentAddresses,
    process_guid: &str,
    log_guid: &str,
    instances: i32,
) -> DesiredLrp {
    let cf_router = serde_json::json!([{
        "hostnames": [DEFAULT_HOST],
        "port": DEFAULT_PORT,
    }]);
    let routes = ProtoRoutes {
        routes: [("cf-router".to_string(), cf_router.to_string().into_bytes())].into(),
    };

    DesiredLrp {
        process_guid: process_guid.to_string(),
        domain: DEFAULT_DOMAIN.to_string(),
        root_fs: "preloaded:cflinuxfs2".to_string(),
        instances,
        log_guid: log_guid.to_string(),
        ports: vec![DEFAULT_PORT],
        routes: Some(routes),
        setup: Some(Action::download(DownloadAction {
            from: format!("http://{}/v1/static/{CANARY_ARCHIVE}", addresses.file_server),
            to: "/tmp/diego".to_string(),
            user: "vcap".to_string(),
            ..Default::default()
        })),
        action: Some(Action::run(RunAction {
            path: "/tmp/diego/go-server".to_string(),
            env: vec![EnvironmentVariable::new("PORT", DEFAULT_PORT.to_string())],
            user: "vcap".to_string(),
            ..Default::default()
        })),
        monitor: Some(Action::run(RunAction {
            path: "true".to_string(),
            user: "vcap".to_string(),
            ..Default::default()
        })),
        ..Default::default()
    }
}
