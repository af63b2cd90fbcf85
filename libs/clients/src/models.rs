//! BBS wire messages used by the suite.
//!
//! Only the fields the suite reads or writes are declared; prost skips the
//! rest when decoding.

use std::collections::HashMap;

pub const ACTUAL_LRP_STATE_UNCLAIMED: &str = "UNCLAIMED";
pub const ACTUAL_LRP_STATE_CLAIMED: &str = "CLAIMED";
pub const ACTUAL_LRP_STATE_RUNNING: &str = "RUNNING";
pub const ACTUAL_LRP_STATE_CRASHED: &str = "CRASHED";

#[derive(Clone, PartialEq, prost::Message)]
pub struct BbsError {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(string, tag = "2")]
    pub message: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct EnvironmentVariable {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

impl EnvironmentVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DownloadAction {
    #[prost(string, tag = "1")]
    pub artifact: String,
    #[prost(string, tag = "2")]
    pub from: String,
    #[prost(string, tag = "3")]
    pub to: String,
    #[prost(string, tag = "4")]
    pub cache_key: String,
    #[prost(string, tag = "6")]
    pub user: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RunAction {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(string, repeated, tag = "2")]
    pub args: Vec<String>,
    #[prost(string, tag = "3")]
    pub dir: String,
    #[prost(message, repeated, tag = "4")]
    pub env: Vec<EnvironmentVariable>,
    #[prost(string, tag = "6")]
    pub user: String,
}

/// Wrapper holding exactly one action.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Action {
    #[prost(message, optional, tag = "1")]
    pub download_action: Option<DownloadAction>,
    #[prost(message, optional, tag = "3")]
    pub run_action: Option<RunAction>,
}

impl Action {
    pub fn download(action: DownloadAction) -> Self {
        Self {
            download_action: Some(action),
            ..Default::default()
        }
    }

    pub fn run(action: RunAction) -> Self {
        Self {
            run_action: Some(action),
            ..Default::default()
        }
    }
}

/// Routing information keyed by router type, each value a JSON document.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtoRoutes {
    #[prost(map = "string, bytes", tag = "1")]
    pub routes: HashMap<String, Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DesiredLrp {
    #[prost(string, tag = "1")]
    pub process_guid: String,
    #[prost(string, tag = "2")]
    pub domain: String,
    #[prost(string, tag = "3")]
    pub root_fs: String,
    #[prost(int32, tag = "4")]
    pub instances: i32,
    #[prost(message, repeated, tag = "5")]
    pub environment_variables: Vec<EnvironmentVariable>,
    #[prost(message, optional, tag = "6")]
    pub setup: Option<Action>,
    #[prost(message, optional, tag = "7")]
    pub action: Option<Action>,
    #[prost(message, optional, tag = "9")]
    pub monitor: Option<Action>,
    #[prost(int32, tag = "10")]
    pub disk_mb: i32,
    #[prost(int32, tag = "11")]
    pub memory_mb: i32,
    #[prost(uint32, repeated, tag = "14")]
    pub ports: Vec<u32>,
    #[prost(message, optional, tag = "15")]
    pub routes: Option<ProtoRoutes>,
    #[prost(string, tag = "17")]
    pub log_guid: String,
    #[prost(int64, tag = "27")]
    pub start_timeout_ms: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DesireLrpRequest {
    #[prost(message, optional, tag = "1")]
    pub desired_lrp: Option<DesiredLrp>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DesiredLrpLifecycleResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<BbsError>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ActualLrpGroupsByProcessGuidRequest {
    #[prost(string, tag = "1")]
    pub process_guid: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ActualLrpKey {
    #[prost(string, tag = "1")]
    pub process_guid: String,
    #[prost(int32, tag = "2")]
    pub index: i32,
    #[prost(string, tag = "3")]
    pub domain: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ActualLrpInstanceKey {
    #[prost(string, tag = "1")]
    pub instance_guid: String,
    #[prost(string, tag = "2")]
    pub cell_id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ActualLrp {
    #[prost(message, optional, tag = "1")]
    pub actual_lrp_key: Option<ActualLrpKey>,
    #[prost(message, optional, tag = "2")]
    pub actual_lrp_instance_key: Option<ActualLrpInstanceKey>,
    #[prost(int32, tag = "4")]
    pub crash_count: i32,
    #[prost(string, tag = "5")]
    pub crash_reason: String,
    #[prost(string, tag = "6")]
    pub state: String,
    #[prost(int64, tag = "8")]
    pub since: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ActualLrpGroup {
    #[prost(message, optional, tag = "1")]
    pub instance: Option<ActualLrp>,
    #[prost(message, optional, tag = "2")]
    pub evacuating: Option<ActualLrp>,
}

impl ActualLrpGroup {
    /// The LRP that represents the group: the instance, else the evacuating one.
    pub fn resolve(&self) -> Option<&ActualLrp> {
        self.instance.as_ref().or(self.evacuating.as_ref())
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ActualLrpGroupsResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<BbsError>,
    #[prost(message, repeated, tag = "2")]
    pub actual_lrp_groups: Vec<ActualLrpGroup>,
}
