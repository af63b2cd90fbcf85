//! The world a test deployment runs in.
//!
//! ## Overview
//!
//! - [`ComponentAddresses`] and [`PortAllocator`]: where each component of a node listens
//! - [`CertAuthority`]: certificates for mutual TLS between components
//! - [`compile`]: lazily built executables and lifecycle bundles
//! - [`config`]: component configuration models, rendered as JSON files or legacy flags
//! - [`ComponentMaker`]: runners for every component of one release

pub mod addresses;
pub mod archive;
pub mod artifacts;
pub mod certs;
pub mod compile;
pub mod config;
pub mod duration_json;
pub mod error;
pub mod maker;
pub mod ports;
pub mod sql;
pub mod version;

pub use addresses::{offset_port, split_host_port, ComponentAddresses};
pub use archive::write_tgz;
pub use artifacts::{BuiltArtifacts, BuiltExecutables, BuiltLifecycles};
pub use certs::{CertAuthority, SslConfig};
pub use compile::{
    build_lifecycle, compile_executables, compile_healthcheck, lazy_build, v0_packages,
    v1_packages, GoPackage, GoToolchain, SourcePaths,
};
pub use error::WorldError;
pub use maker::{unchanged, ComponentFactory, ComponentMaker};
pub use ports::PortAllocator;
pub use sql::SqlRunner;
pub use version::{ConfigStyle, DiegoVersion};
