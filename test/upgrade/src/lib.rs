//! Upgrade stability scenarios for a diego deployment.
//!
//! ## Overview
//!
//! - [`SuiteConfig`] / [`Suite`]: environment, built artifacts and component makers
//! - [`Upgrader`]: per-release strategies for replacing old components with new ones
//! - [`RoutePoller`]: proves a route stays reachable while components are swapped
//! - [`scenarios`]: rolling upgrade, vizzini matrix and API exercise
//! - [`bosh`], [`cf`], [`manifests`]: the old BOSH-lite based deployment flow

pub mod cf;
pub mod upgrader;

pub use config::SuiteConfig;
pub use error::SuiteError;
pub use poller::RoutePoller;
pub use suite::Suite;
pub use upgrader::{
    upgrade_rep, upgrader_for, Checkpoint, GaUpgrader, LocketLocalReUpgrader, NoCheckpoint,
    PollerKeepsRunning, Upgrader,
};
pub use vizzini::VizziniRun;
