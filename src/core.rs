// Core types shared by the client, spaces and wrappers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque identifier of a server-side environment instance.
///
/// Issued by the server on creation and passed through verbatim on every
/// later call. The client never tracks or reclaims it; closing is explicit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new<S: Into<String>>(id: S) -> Self { Self(id.into()) }

    pub fn as_str(&self) -> &str { &self.0 }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl AsRef<str> for InstanceId {
    fn as_ref(&self) -> &str { &self.0 }
}

impl From<&str> for InstanceId { fn from(v: &str) -> Self { InstanceId(v.to_string()) } }
impl From<String> for InstanceId { fn from(v: String) -> Self { InstanceId(v) } }

/// A dynamically shaped action or observation.
///
/// The concrete shape is dictated by the instance's spaces but is not known
/// statically, so values travel as a closed tagged union. Integers and floats
/// are kept apart so that a discrete action `3` goes over the wire as `3`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Integer payload. Floats are not coerced, even when integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric payload as a float (integers widen).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    /// Flatten a scalar or nested numeric sequence in row-major order.
    /// Returns `None` if any leaf is not a number.
    pub fn flatten_f64(&self) -> Option<Vec<f64>> {
        let mut out = Vec::new();
        self.flatten_into(&mut out)?;
        Some(out)
    }

    fn flatten_into(&self, out: &mut Vec<f64>) -> Option<()> {
        match self {
            Value::Seq(items) => {
                for item in items {
                    item.flatten_into(out)?;
                }
                Some(())
            }
            other => {
                out.push(other.as_f64()?);
                Some(())
            }
        }
    }

    /// Dimensions of a rectangular nested sequence; `[]` for a scalar.
    /// Returns `None` for ragged sequences or non-numeric leaves.
    ///
    /// A rendered frame typically has shape `[height, width, channels]`,
    /// while a flat observation vector has shape `[len]`.
    pub fn shape(&self) -> Option<Vec<usize>> {
        match self {
            Value::Int(_) | Value::Float(_) => Some(Vec::new()),
            Value::Seq(items) => {
                let Some(first) = items.first() else { return Some(vec![0]) };
                let inner = first.shape()?;
                for item in &items[1..] {
                    if item.shape()? != inner {
                        return None;
                    }
                }
                let mut dims = Vec::with_capacity(inner.len() + 1);
                dims.push(items.len());
                dims.extend(inner);
                Some(dims)
            }
            _ => None,
        }
    }
}

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int(v as i64) } }
impl From<u32> for Value { fn from(v: u32) -> Self { Value::Int(v as i64) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<f32> for Value { fn from(v: f32) -> Self { Value::Float(v as f64) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::Str(v.to_string()) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::Str(v) } }

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self { Value::Seq(v.into_iter().map(Into::into).collect()) }
}

/// Per-step diagnostic map returned by the server alongside each step.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Info {
    entries: BTreeMap<String, Value>,
}

impl Info {
    /// Create an empty Info map.
    pub fn new() -> Self { Self { entries: BTreeMap::new() } }

    /// Insert or replace a key with the given value.
    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) {
        self.entries.insert(key.into(), value.into());
    }

    /// Get a reference to a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> { self.entries.get(key) }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }
}

/// Treats an explicit JSON `null` like an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The outcome of a single step. Values are passed through exactly as the
/// server reported them.
#[derive(Clone, Debug, PartialEq)]
pub struct Step<Obs> {
    pub observation: Obs,
    pub reward: f64,
    pub done: bool,
    pub info: Info,
}

impl<Obs> Step<Obs> {
    pub fn new(observation: Obs, reward: f64, done: bool, info: Info) -> Self {
        Self { observation, reward, done, info }
    }
}

/// Failure categories surfaced by every client operation.
#[derive(thiserror::Error, Debug)]
pub enum GymError {
    /// No response was obtained (connection refused, timeout, broken body).
    #[error("Transport error: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("Remote error: {message}")]
    Remote { status: Option<u16>, message: String },
    /// The response body did not match the expected schema.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Upload rejected because the API key was missing or invalid.
    #[error("Auth error: {0}")]
    Auth(String),
}

impl GymError {
    /// HTTP status attached to a remote error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            GymError::Remote { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GymError {
    fn from(e: serde_json::Error) -> Self { GymError::Decode(e.to_string()) }
}

/// Convenience alias for results using GymError.
pub type Result<T> = std::result::Result<T, GymError>;

/// A steppable episode source.
///
/// Implemented by [`RemoteEnv`](crate::env::RemoteEnv) and by the wrappers.
/// Every call may fail since the state lives on the server.
pub trait Env {
    type Obs;
    type Act;

    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Apply an action and advance by one step.
    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>>;

    /// Release the environment. Consumes it so it cannot be closed twice.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}
