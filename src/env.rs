//! A handle-bound view over the client.

use crate::client::Client;
use crate::core::{Env, InstanceId, Result, Step, Value};
use crate::monitor::MonitorOptions;
use crate::spaces::Space;

/// One server-side instance together with the client that reaches it.
///
/// Every method forwards to the matching [`Client`] call. Dropping a
/// `RemoteEnv` does not close the instance; call [`RemoteEnv::close`], which
/// consumes the value so the same view cannot close twice.
#[derive(Debug)]
pub struct RemoteEnv<'c> {
    client: &'c Client,
    id: InstanceId,
    render: bool,
}

impl Client {
    /// Create an instance of `env_id` and bind it to this client.
    pub fn make(&self, env_id: &str) -> Result<RemoteEnv<'_>> {
        let id = self.create(env_id)?;
        Ok(RemoteEnv::attach(self, id))
    }
}

impl<'c> RemoteEnv<'c> {
    /// Bind an existing instance id.
    pub fn attach(client: &'c Client, id: InstanceId) -> Self {
        Self { client, id, render: false }
    }

    pub fn id(&self) -> &InstanceId { &self.id }

    pub fn client(&self) -> &'c Client { self.client }

    /// Request a rendered frame in every observation returned by [`Env::step`].
    pub fn set_render(&mut self, render: bool) { self.render = render; }

    pub fn action_space(&self) -> Result<Space> { self.client.action_space(&self.id) }

    pub fn observation_space(&self) -> Result<Space> { self.client.observation_space(&self.id) }

    pub fn sample_action(&self) -> Result<Value> { self.client.sample_action(&self.id) }

    pub fn contains_action(&self, action: &Value) -> Result<bool> { self.client.contains_action(&self.id, action) }

    /// Step with an explicit render flag.
    pub fn step_with(&self, action: &Value, render: bool) -> Result<Step<Value>> {
        self.client.step(&self.id, action, render)
    }

    pub fn start_monitor(&self, directory: &str, options: MonitorOptions) -> Result<()> {
        self.client.start_monitor(&self.id, directory, options)
    }

    pub fn close_monitor(&self) -> Result<()> { self.client.close_monitor(&self.id) }

    /// Release the view without closing the instance.
    pub fn detach(self) -> InstanceId { self.id }
}

impl Env for RemoteEnv<'_> {
    type Obs = Value;
    type Act = Value;

    fn reset(&mut self) -> Result<Value> { self.client.reset(&self.id) }

    fn step(&mut self, action: Value) -> Result<Step<Value>> { self.client.step(&self.id, &action, self.render) }

    fn close(self) -> Result<()> { self.client.close(&self.id) }
}
