//! Configs for the supporting services every deployment needs.

use serde::{Deserialize, Serialize};

use super::ComponentConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileServerConfig {
    pub server_address: String,
    pub static_directory: String,
    pub consul_cluster: String,
    pub log_level: String,
}

impl ComponentConfig for FileServerConfig {
    const FLAG_RENAMES: &'static [(&'static str, &'static str)] =
        &[("server_address", "address")];
}

/// Guardian server settings, passed as `gdn server` arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GardenConfig {
    pub bind_ip: String,
    pub bind_port: u16,
    pub depot_dir: String,
    pub default_rootfs: String,
    pub network_pool: String,
    pub port_pool_start: u16,
    pub port_pool_size: Option<u32>,
    pub tag: String,
    pub log_level: String,
}

impl GardenConfig {
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "server".to_string(),
            format!("--bind-ip={}", self.bind_ip),
            format!("--bind-port={}", self.bind_port),
            format!("--depot={}", self.depot_dir),
            format!("--port-pool-start={}", self.port_pool_start),
            format!("--log-level={}", self.log_level),
        ];
        if let Some(size) = self.port_pool_size {
            args.push(format!("--port-pool-size={size}"));
        }
        if !self.default_rootfs.is_empty() {
            args.push(format!("--default-rootfs={}", self.default_rootfs));
        }
        if !self.network_pool.is_empty() {
            args.push(format!("--network-pool={}", self.network_pool));
        }
        if !self.tag.is_empty() {
            args.push(format!("--tag={}", self.tag));
        }
        args
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterStatus {
    pub port: u16,
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterNats {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterLogging {
    pub level: String,
}

/// gorouter YAML config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    pub port: u16,
    pub index: u32,
    pub status: RouterStatus,
    pub nats: Vec<RouterNats>,
    pub logging: RouterLogging,
    pub drain_wait: String,
    pub start_response_delay_interval: String,
    pub publish_start_message_interval: String,
    pub prune_stale_droplets_interval: String,
    pub droplet_stale_threshold: String,
}

/// Consul agent JSON config for a single-node server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsulConfig {
    pub node_name: String,
    pub datacenter: String,
    pub data_dir: String,
    pub server: bool,
    pub bootstrap_expect: u32,
    pub bind_addr: String,
    pub client_addr: String,
    pub ports: ConsulPorts,
}

/// Consul listens on five consecutive ports starting at its base port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsulPorts {
    pub dns: u16,
    pub http: u16,
    pub serf_lan: u16,
    pub serf_wan: u16,
    pub server: u16,
}

impl ConsulPorts {
    pub fn from_base(base: u16) -> Self {
        Self {
            dns: base,
            http: base + 1,
            serf_lan: base + 2,
            serf_wan: base + 3,
            server: base + 4,
        }
    }
}
