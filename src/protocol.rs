//! Request and response bodies of the Gym HTTP API.
//!
//! One type per endpoint body, named after the operation. Field names are the
//! server's and must not change. All endpoints are rooted at the client's base
//! URL; see [`paths`] for the route table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{Info, InstanceId, Value, null_as_default};

/// Route table.
pub mod paths {
    use crate::core::InstanceId;

    pub const ENVS: &str = "/v1/envs/";
    pub const UPLOAD: &str = "/v1/upload/";

    pub fn close(id: &InstanceId) -> String { format!("/v1/envs/{id}/close/") }
    pub fn action_space(id: &InstanceId) -> String { format!("/v1/envs/{id}/action_space/") }
    pub fn observation_space(id: &InstanceId) -> String { format!("/v1/envs/{id}/observation_space/") }
    pub fn sample(id: &InstanceId) -> String { format!("/v1/envs/{id}/action_space/sample") }
    pub fn contains(id: &InstanceId) -> String { format!("/v1/envs/{id}/action_space/contains/") }
    pub fn reset(id: &InstanceId) -> String { format!("/v1/envs/{id}/reset/") }
    pub fn step(id: &InstanceId) -> String { format!("/v1/envs/{id}/step/") }
    pub fn monitor_start(id: &InstanceId) -> String { format!("/v1/envs/{id}/monitor/start/") }
    pub fn monitor_close(id: &InstanceId) -> String { format!("/v1/envs/{id}/monitor/close/") }
}

/// `POST /v1/envs/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub env_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateResponse {
    pub instance_id: InstanceId,
}

/// `GET /v1/envs/`: instance id to environment id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    pub all_envs: BTreeMap<InstanceId, String>,
}

/// Body of both space queries. The descriptor stays raw here and is decoded
/// by [`Space::decode`](crate::spaces::Space::decode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceResponse {
    pub info: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleResponse {
    pub action: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainsRequest {
    pub x: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainsResponse {
    pub member: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetResponse {
    pub observation: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRequest {
    pub action: Value,
    pub render: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResponse {
    pub observation: Value,
    pub reward: f64,
    pub done: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub info: Info,
}

/// `POST /v1/envs/{id}/monitor/start/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorStartRequest {
    pub directory: String,
    pub force: bool,
    pub resume: bool,
    pub video_callable: bool,
}

/// `POST /v1/upload/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub training_dir: String,
    pub api_key: String,
    /// Omitted from the body when unset; the server treats it as optional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm_id: Option<String>,
}

/// Error body the server attaches to non-success responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
