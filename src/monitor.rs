//! Episode recording around an instance's lifetime, and upload of the
//! recorded results.
//!
//! Monitor state (`not started -> recording -> stopped`) lives on the server
//! and is never mirrored here: starting twice or closing a monitor that was
//! never started is rejected by the server and surfaces as
//! [`GymError::Remote`].

use tracing::{info, warn};

use crate::client::{Client, server_message};
use crate::config::ENV_API_KEY;
use crate::core::{GymError, InstanceId, Result};
use crate::protocol::{MonitorStartRequest, UploadRequest, paths};
use crate::transport::Method;

/// How a monitor treats an output directory that already holds recordings.
///
/// `force` clears previous results and `resume` appends to them; the two are
/// alternatives and at most one should be set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonitorOptions {
    pub force: bool,
    pub resume: bool,
    /// Sent as `video_callable`.
    pub write_upfront_manifest: bool,
}

impl MonitorOptions {
    pub fn new() -> Self { Self::default() }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn resume(mut self) -> Self {
        self.resume = true;
        self
    }

    pub fn write_upfront_manifest(mut self) -> Self {
        self.write_upfront_manifest = true;
        self
    }
}

impl Client {
    /// Start recording episodes of `id` into `directory` on the server host.
    pub fn start_monitor(&self, id: &InstanceId, directory: &str, options: MonitorOptions) -> Result<()> {
        if options.force && options.resume {
            warn!(instance = %id, directory, "both force and resume requested; the server decides which applies");
        }
        let body = MonitorStartRequest {
            directory: directory.to_string(),
            force: options.force,
            resume: options.resume,
            video_callable: options.write_upfront_manifest,
        };
        self.request_empty(Method::Post, &paths::monitor_start(id), Some(&body))?;
        info!(instance = %id, directory, "monitor started");
        Ok(())
    }

    /// Stop recording and let the server flush results. Call before `close`
    /// if the recording should be finalized.
    pub fn close_monitor(&self, id: &InstanceId) -> Result<()> {
        self.request_empty::<()>(Method::Post, &paths::monitor_close(id), None)?;
        info!(instance = %id, "monitor closed");
        Ok(())
    }

    /// Upload a finished recording directory to the scoreboard.
    ///
    /// The key is the first non-empty of `api_key`, the configured key and
    /// `OPENAI_GYM_API_KEY`. Without one this fails with [`GymError::Auth`]
    /// before any request is sent. Independent of any live instance.
    pub fn upload(&self, training_dir: &str, api_key: Option<&str>, algorithm_id: Option<&str>) -> Result<()> {
        self.upload_with_lookup(training_dir, api_key, algorithm_id, |k| std::env::var(k).ok())
    }

    pub(crate) fn upload_with_lookup<F: Fn(&str) -> Option<String>>(
        &self,
        training_dir: &str,
        api_key: Option<&str>,
        algorithm_id: Option<&str>,
        lookup: F,
    ) -> Result<()> {
        let ambient = lookup(ENV_API_KEY);
        let api_key = resolve_api_key(api_key, self.config().api_key.as_deref(), ambient.as_deref())
            .ok_or_else(|| GymError::Auth(format!("no API key given and {ENV_API_KEY} is not set")))?;
        let body = UploadRequest {
            training_dir: training_dir.to_string(),
            api_key,
            algorithm_id: algorithm_id.filter(|a| !a.is_empty()).map(str::to_string),
        };
        let resp = self.exchange(Method::Post, paths::UPLOAD, Some(&body))?;
        if matches!(resp.status, 401 | 403) {
            return Err(GymError::Auth(server_message(&resp)));
        }
        self.expect_success(paths::UPLOAD, resp)?;
        info!(training_dir, "upload accepted");
        Ok(())
    }
}

fn resolve_api_key(explicit: Option<&str>, configured: Option<&str>, ambient: Option<&str>) -> Option<String> {
    [explicit, configured, ambient]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|k| !k.is_empty())
        .map(str::to_string)
}
