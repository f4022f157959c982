//! The session client: one method per endpoint, one round trip per call.
//!
//! The client is a stateless pass-through keyed by [`InstanceId`]. It holds
//! only the base URL and the transport, never caches per-instance state, and
//! never retries. Whether a handle is closed, reset or being monitored is
//! decided by the server on every call.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::core::{GymError, InstanceId, Result, Step, Value};
use crate::protocol::{
    ContainsRequest, ContainsResponse, CreateRequest, CreateResponse, ErrorResponse, ListResponse,
    ResetResponse, SampleResponse, SpaceResponse, StepRequest, StepResponse, paths,
};
use crate::spaces::Space;
use crate::transport::{HttpResponse, Method, Transport};

/// A client bound to one Gym HTTP service.
///
/// Safe to share between threads; each instance's calls must still be
/// serialized by the caller since the server does not guard concurrent
/// mutation of one instance.
pub struct Client {
    config: ClientConfig,
    transport: Box<dyn Transport>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("base_url", &self.base_url()).finish_non_exhaustive()
    }
}

impl Client {
    /// Client for `base_url` over the default HTTP transport.
    #[cfg(feature = "http")]
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self::from_config(ClientConfig::new(base_url))
    }

    #[cfg(feature = "http")]
    pub fn from_config(config: ClientConfig) -> Self {
        let transport = crate::transport::HttpTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }

    /// Client over a caller-supplied transport.
    pub fn with_transport<T: Transport + 'static>(config: ClientConfig, transport: T) -> Self {
        Self { config, transport: Box::new(transport) }
    }

    pub fn base_url(&self) -> &str { self.config.normalized_base_url() }

    pub fn config(&self) -> &ClientConfig { &self.config }

    /// Create an instance of `env_id`. The id is opaque to the client.
    pub fn create(&self, env_id: &str) -> Result<InstanceId> {
        let body = CreateRequest { env_id: env_id.to_string() };
        let resp: CreateResponse = self.request(Method::Post, paths::ENVS, Some(&body))?;
        if resp.instance_id.is_empty() {
            return Err(GymError::Decode("server returned an empty instance_id".into()));
        }
        info!(instance = %resp.instance_id, env_id, "created instance");
        Ok(resp.instance_id)
    }

    /// List live instances as `instance_id -> env_id`.
    pub fn list_envs(&self) -> Result<std::collections::BTreeMap<InstanceId, String>> {
        let resp: ListResponse = self.request::<(), _>(Method::Get, paths::ENVS, None)?;
        Ok(resp.all_envs)
    }

    /// Close an instance. Closing twice is a remote error.
    pub fn close(&self, id: &InstanceId) -> Result<()> {
        self.request_empty::<()>(Method::Post, &paths::close(id), None)?;
        info!(instance = %id, "closed instance");
        Ok(())
    }

    pub fn action_space(&self, id: &InstanceId) -> Result<Space> {
        self.space(&paths::action_space(id))
    }

    pub fn observation_space(&self, id: &InstanceId) -> Result<Space> {
        self.space(&paths::observation_space(id))
    }

    fn space(&self, path: &str) -> Result<Space> {
        let resp: SpaceResponse = self.request::<(), _>(Method::Get, path, None)?;
        Space::decode(&resp.info)
    }

    /// A random action drawn by the server from the instance's action space.
    pub fn sample_action(&self, id: &InstanceId) -> Result<Value> {
        let resp: SampleResponse = self.request::<(), _>(Method::Get, &paths::sample(id), None)?;
        Ok(resp.action)
    }

    /// Ask the server whether `action` is a member of the action space.
    pub fn contains_action(&self, id: &InstanceId, action: &Value) -> Result<bool> {
        let body = ContainsRequest { x: action.clone() };
        let resp: ContainsResponse = self.request(Method::Post, &paths::contains(id), Some(&body))?;
        Ok(resp.member)
    }

    /// Start a new episode. Required before the first step and after `done`.
    pub fn reset(&self, id: &InstanceId) -> Result<Value> {
        let resp: ResetResponse = self.request::<(), _>(Method::Post, &paths::reset(id), None)?;
        Ok(resp.observation)
    }

    /// Advance one step. With `render` the server embeds a frame in the
    /// observation; its layout follows the observation space shape.
    pub fn step(&self, id: &InstanceId, action: &Value, render: bool) -> Result<Step<Value>> {
        let body = StepRequest { action: action.clone(), render };
        let resp: StepResponse = self.request(Method::Post, &paths::step(id), Some(&body))?;
        Ok(Step::new(resp.observation, resp.reward, resp.done, resp.info))
    }

    /// Send a request and decode a JSON response body.
    pub(crate) fn request<B, R>(&self, method: Method, path: &str, body: Option<&B>) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let resp = self.exchange(method, path, body)?;
        let resp = self.expect_success(path, resp)?;
        serde_json::from_str(&resp.body).map_err(|e| GymError::Decode(format!("{method} {path}: {e}")))
    }

    /// Send a request whose success body carries nothing of interest.
    pub(crate) fn request_empty<B: Serialize>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()> {
        let resp = self.exchange(method, path, body)?;
        self.expect_success(path, resp).map(|_| ())
    }

    /// One round trip. Non-success statuses come back as responses.
    pub(crate) fn exchange<B: Serialize>(&self, method: Method, path: &str, body: Option<&B>) -> Result<HttpResponse> {
        let url = format!("{}{}", self.base_url(), path);
        let json = body.map(serde_json::to_value).transpose().map_err(|e| GymError::Decode(e.to_string()))?;
        let resp = self.transport.send(method, &url, json.as_ref())?;
        debug!(%method, path, status = resp.status, "gym round trip");
        Ok(resp)
    }

    pub(crate) fn expect_success(&self, path: &str, resp: HttpResponse) -> Result<HttpResponse> {
        if resp.is_success() {
            return Ok(resp);
        }
        debug!(path, status = resp.status, body = %resp.body, "gym request rejected");
        Err(GymError::Remote { status: Some(resp.status), message: server_message(&resp) })
    }
}

/// The server's diagnostic text: `message` from a JSON error body, else the
/// raw body, else the status line.
pub(crate) fn server_message(resp: &HttpResponse) -> String {
    if let Ok(err) = serde_json::from_str::<ErrorResponse>(&resp.body) {
        return err.message;
    }
    let raw = resp.body.trim();
    if raw.is_empty() {
        format!("HTTP {}", resp.status)
    } else {
        raw.to_string()
    }
}
