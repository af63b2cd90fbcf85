//! Clients for the components a scenario talks to directly.

pub mod bbs;
pub mod consul;
pub mod error;
pub mod garden;
pub mod models;
pub mod router;

pub use bbs::{default_lrp_create_request, BbsClient, DEFAULT_HOST};
pub use consul::{consul_wait_until_ready, wait_for_leader, CONSUL_READY_TIMEOUT};
pub use error::ClientError;
pub use garden::GardenClient;
pub use router::{response_body_and_status_code_from_host, RouterClient};
