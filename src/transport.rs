//! The HTTP collaborator the client issues requests through.
//!
//! A [`Transport`] turns `{method, url, JSON body}` into `{status, body}`.
//! Non-success statuses are returned as responses, not errors, so that the
//! client can extract the server's message. Only the absence of any response
//! is a [`GymError::Transport`].

use std::fmt;

use crate::core::{GymError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Status and raw body of a completed exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new<S: Into<String>>(status: u16, body: S) -> Self { Self { status, body: body.into() } }

    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// Issues a single request. Implementations must not retry.
pub trait Transport: Send + Sync {
    fn send(&self, method: Method, url: &str, body: Option<&serde_json::Value>) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, method: Method, url: &str, body: Option<&serde_json::Value>) -> Result<HttpResponse> {
        (**self).send(method, url, body)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, method: Method, url: &str, body: Option<&serde_json::Value>) -> Result<HttpResponse> {
        (**self).send(method, url, body)
    }
}

/// Blocking transport backed by a `ureq` agent.
#[cfg(feature = "http")]
pub struct HttpTransport {
    agent: ureq::Agent,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a transport, optionally bounding each request's total duration.
    pub fn new(timeout: Option<std::time::Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Self { agent: builder.build() }
    }
}

#[cfg(feature = "http")]
impl Default for HttpTransport {
    fn default() -> Self { Self::new(None) }
}

#[cfg(feature = "http")]
impl Transport for HttpTransport {
    fn send(&self, method: Method, url: &str, body: Option<&serde_json::Value>) -> Result<HttpResponse> {
        let request = self.agent.request(method.as_str(), url);
        let outcome = match body {
            Some(json) => request.send_json(json),
            None => request.call(),
        };
        let response = match outcome {
            Ok(r) => r,
            Err(ureq::Error::Status(_, r)) => r,
            Err(ureq::Error::Transport(t)) => return Err(GymError::Transport(t.to_string())),
        };
        let status = response.status();
        let body = response
            .into_string()
            .map_err(|e| GymError::Transport(format!("Failed to read response body: {e}")))?;
        Ok(HttpResponse { status, body })
    }
}
