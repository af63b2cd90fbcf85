use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ClientLocketConfig, ComponentConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BbsConfig {
    pub listen_address: String,
    pub health_address: String,
    pub advertise_url: String,
    pub require_ssl: bool,
    pub ca_file: String,
    pub cert_file: String,
    pub key_file: String,
    pub database_driver: String,
    pub database_connection_string: String,
    pub auctioneer_address: String,
    pub auctioneer_ca_cert: String,
    pub auctioneer_client_cert: String,
    pub auctioneer_client_key: String,
    pub auctioneer_require_tls: bool,
    pub rep_ca_cert: String,
    pub rep_client_cert: String,
    pub rep_client_key: String,
    pub rep_require_tls: bool,
    pub consul_cluster: String,
    pub encryption_keys: BTreeMap<String, String>,
    pub active_key_label: String,
    pub locks_locket_enabled: bool,
    pub cell_registrations_locket_enabled: bool,
    pub log_level: String,
    #[serde(flatten)]
    pub client_locket_config: ClientLocketConfig,
}

impl ComponentConfig for BbsConfig {
    const FLAG_RENAMES: &'static [(&'static str, &'static str)] = &[
        ("advertise_url", "advertiseURL"),
        ("require_ssl", "requireSSL"),
        ("encryption_keys", "encryptionKey"),
    ];

    const FLAG_OMITTED: &'static [&'static str] = &[
        "auctioneer_ca_cert",
        "auctioneer_client_cert",
        "auctioneer_client_key",
        "auctioneer_require_tls",
        "rep_ca_cert",
        "rep_client_cert",
        "rep_client_key",
        "rep_require_tls",
        "locks_locket_enabled",
        "cell_registrations_locket_enabled",
        "locket_address",
        "locket_ca_cert_file",
        "locket_client_cert_file",
        "locket_client_key_file",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocketConfig {
    pub listen_address: String,
    pub database_driver: String,
    pub database_connection_string: String,
    pub ca_file: String,
    pub cert_file: String,
    pub key_file: String,
    pub consul_cluster: String,
    pub log_level: String,
}

impl ComponentConfig for LocketConfig {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuctioneerConfig {
    pub listen_address: String,
    pub bbs_address: String,
    pub bbs_ca_cert_file: String,
    pub bbs_client_cert_file: String,
    pub bbs_client_key_file: String,
    /// Serving TLS material; all three empty serves plain HTTP.
    pub ca_cert_file: String,
    pub server_cert_file: String,
    pub server_key_file: String,
    pub rep_ca_cert: String,
    pub rep_client_cert: String,
    pub rep_client_key: String,
    pub rep_require_tls: bool,
    pub consul_cluster: String,
    pub locks_locket_enabled: bool,
    #[serde(with = "crate::duration_json")]
    pub lock_retry_interval: Duration,
    pub log_level: String,
    #[serde(flatten)]
    pub client_locket_config: ClientLocketConfig,
}

impl ComponentConfig for AuctioneerConfig {
    const FLAG_RENAMES: &'static [(&'static str, &'static str)] = &[
        ("listen_address", "listenAddr"),
        ("bbs_ca_cert_file", "bbsCACert"),
        ("bbs_client_cert_file", "bbsClientCert"),
        ("bbs_client_key_file", "bbsClientKey"),
    ];

    const FLAG_OMITTED: &'static [&'static str] = &[
        "ca_cert_file",
        "server_cert_file",
        "server_key_file",
        "rep_ca_cert",
        "rep_client_cert",
        "rep_client_key",
        "rep_require_tls",
        "locks_locket_enabled",
        "locket_address",
        "locket_ca_cert_file",
        "locket_client_cert_file",
        "locket_client_key_file",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepConfig {
    pub cell_id: String,
    pub zone: String,
    pub listen_addr: String,
    pub bbs_address: String,
    pub bbs_ca_cert_file: String,
    pub bbs_client_cert_file: String,
    pub bbs_client_key_file: String,
    pub ca_cert_file: String,
    pub server_cert_file: String,
    pub server_key_file: String,
    pub require_tls: bool,
    pub garden_addr: String,
    pub garden_network: String,
    #[serde(with = "crate::duration_json")]
    pub evacuation_timeout: Duration,
    #[serde(with = "crate::duration_json")]
    pub evacuation_polling_interval: Duration,
    #[serde(with = "crate::duration_json")]
    pub polling_interval: Duration,
    pub export_network_env_vars: bool,
    /// `name:path` entries.
    pub preloaded_root_fs: Vec<String>,
    pub supported_providers: Vec<String>,
    pub cache_path: String,
    pub temp_dir: String,
    pub memory_mb: String,
    pub disk_mb: String,
    pub consul_cluster: String,
    pub log_level: String,
    #[serde(flatten)]
    pub client_locket_config: ClientLocketConfig,
}

impl ComponentConfig for RepConfig {
    const FLAG_RENAMES: &'static [(&'static str, &'static str)] = &[
        ("cell_id", "cellID"),
        ("bbs_ca_cert_file", "bbsCACert"),
        ("bbs_client_cert_file", "bbsClientCert"),
        ("bbs_client_key_file", "bbsClientKey"),
        ("preloaded_root_fs", "preloadedRootFS"),
        ("supported_providers", "rootFSProvider"),
        ("memory_mb", "memoryMB"),
        ("disk_mb", "diskMB"),
    ];

    const FLAG_OMITTED: &'static [&'static str] = &[
        "ca_cert_file",
        "server_cert_file",
        "server_key_file",
        "require_tls",
        "export_network_env_vars",
        "locket_address",
        "locket_ca_cert_file",
        "locket_client_cert_file",
        "locket_client_key_file",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteEmitterConfig {
    /// Set to run as a cell-local emitter for that cell; empty runs globally.
    pub cell_id: String,
    pub bbs_address: String,
    pub bbs_ca_cert_file: String,
    pub bbs_client_cert_file: String,
    pub bbs_client_key_file: String,
    /// Comma-separated `host:port` list.
    pub nats_addresses: String,
    pub nats_username: String,
    pub nats_password: String,
    pub health_check_address: String,
    pub consul_cluster: String,
    #[serde(with = "crate::duration_json")]
    pub sync_interval: Duration,
    #[serde(with = "crate::duration_json")]
    pub lock_retry_interval: Duration,
    pub log_level: String,
    #[serde(flatten)]
    pub client_locket_config: ClientLocketConfig,
}

impl ComponentConfig for RouteEmitterConfig {
    const FLAG_RENAMES: &'static [(&'static str, &'static str)] = &[
        ("bbs_ca_cert_file", "bbsCACert"),
        ("bbs_client_cert_file", "bbsClientCert"),
        ("bbs_client_key_file", "bbsClientKey"),
    ];

    const FLAG_OMITTED: &'static [&'static str] = &[
        "cell_id",
        "health_check_address",
        "locket_address",
        "locket_ca_cert_file",
        "locket_client_cert_file",
        "locket_client_key_file",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SshProxyConfig {
    pub address: String,
    pub health_check_address: String,
    /// PEM contents, not a path.
    pub host_key: String,
    pub bbs_address: String,
    pub bbs_ca_cert: String,
    pub bbs_client_cert: String,
    pub bbs_client_key: String,
    pub enable_cf_auth: bool,
    pub enable_diego_auth: bool,
    pub diego_credentials: String,
    pub consul_cluster: String,
    pub log_level: String,
}

impl ComponentConfig for SshProxyConfig {
    const FLAG_RENAMES: &'static [(&'static str, &'static str)] = &[
        ("bbs_ca_cert", "bbsCACert"),
        ("enable_cf_auth", "enableCFAuth"),
    ];

    const FLAG_OMITTED: &'static [&'static str] = &["health_check_address"];
}
