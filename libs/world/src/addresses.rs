//! Listen addresses for every component of a deployment.
//!
//! Ports are derived from the parallel node index so several suites can run
//! side by side. The file server and router are pinned to fixed ports, which
//! still prevents two suites on one host from running concurrently.

use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Number of consecutive ports consul needs (dns, http, serf lan, serf wan, server).
pub const CONSUL_PORT_OFFSET_LENGTH: u32 = 5;

/// Offset of consul's HTTP port from its base port.
pub const CONSUL_HTTP_PORT_OFFSET: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAddresses {
    pub garden: String,
    pub nats: String,
    pub consul: String,
    pub rep: String,
    pub file_server: String,
    pub router: String,
    pub bbs: String,
    pub health: String,
    pub auctioneer: String,
    pub ssh_proxy: String,
    pub ssh_proxy_health_check: String,
    pub fake_volman_driver: String,
    pub local_node_plugin: String,
    pub locket: String,
    /// Connection string of the node's database, e.g. `postgres://.../diego_1`.
    pub sql: String,
}

impl ComponentAddresses {
    /// Addresses for a parallel node. `sql_base` ends with the separator the
    /// database name is appended to.
    pub fn for_node(node: u32, sql_base: &str) -> Self {
        let local = |port: u32| format!("127.0.0.1:{port}");

        Self {
            garden: local(10000 + node),
            nats: local(11000 + node),
            consul: local(12750 + node * CONSUL_PORT_OFFSET_LENGTH),
            rep: local(14000 + node),
            file_server: local(8080),
            router: local(80),
            bbs: local(20500 + node * 2),
            health: local(20500 + node * 2 + 1),
            auctioneer: local(23000 + node),
            ssh_proxy: local(23500 + node),
            ssh_proxy_health_check: local(24500 + node),
            fake_volman_driver: local(25500 + node),
            local_node_plugin: local(25550 + node),
            locket: local(26500 + node),
            sql: format!("{sql_base}diego_{node}"),
        }
    }

    /// Base URL of consul's HTTP API.
    pub fn consul_http_url(&self) -> Result<String, WorldError> {
        Ok(format!(
            "http://{}",
            offset_port(&self.consul, CONSUL_HTTP_PORT_OFFSET)?
        ))
    }

    /// Cluster URL handed to components that register with consul.
    pub fn consul_cluster(&self) -> Result<String, WorldError> {
        self.consul_http_url()
    }
}

/// Split `host:port`.
pub fn split_host_port(address: &str) -> Result<(&str, u16), WorldError> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| WorldError::InvalidAddress(address.to_string()))?;
    let port = port
        .parse()
        .map_err(|_| WorldError::InvalidAddress(address.to_string()))?;
    Ok((host, port))
}

/// Shift the port of `host:port` by `offset`.
pub fn offset_port(address: &str, offset: u16) -> Result<String, WorldError> {
    let (host, port) = split_host_port(address)?;
    let port = port
        .checked_add(offset)
        .ok_or_else(|| WorldError::InvalidAddress(format!("{address} + {offset}")))?;
    Ok(format!("{host}:{port}"))
}
