//! Configuration models for the orchestrated components.
//!
//! Newer releases read a JSON file passed with `-config`; the GA release
//! takes one command-line flag per setting (see [`legacy`]).

pub mod diego;
pub mod legacy;
pub mod plumbing;

use serde::{Deserialize, Serialize};

pub use diego::{
    AuctioneerConfig, BbsConfig, LocketConfig, RepConfig, RouteEmitterConfig, SshProxyConfig,
};
pub use plumbing::{ConsulConfig, FileServerConfig, GardenConfig, RouterConfig};

/// A configuration that can be rendered as a JSON file or as legacy flags.
pub trait ComponentConfig: Serialize {
    /// Fields whose flag name is not the lowerCamel form of the field name.
    const FLAG_RENAMES: &'static [(&'static str, &'static str)] = &[];

    /// Fields the flag-configured release does not accept.
    const FLAG_OMITTED: &'static [&'static str] = &[];
}

/// Connection to the locket server shared by every locket client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientLocketConfig {
    /// Empty disables locket for the client.
    pub locket_address: String,
    pub locket_ca_cert_file: String,
    pub locket_client_cert_file: String,
    pub locket_client_key_file: String,
}
