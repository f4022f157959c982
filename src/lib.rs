pub mod core;
pub mod spaces;
pub mod protocol;
pub mod transport;
pub mod config;
pub mod client;
pub mod monitor;
pub mod env;
pub mod wrappers;

pub use crate::core::{Env, GymError, Info, InstanceId, Result, Step, Value};
pub use crate::spaces::Space;
pub use crate::config::ClientConfig;
pub use crate::client::Client;
pub use crate::monitor::MonitorOptions;
pub use crate::env::RemoteEnv;
pub use crate::transport::{HttpResponse, Method, Transport};
#[cfg(feature = "http")]
pub use crate::transport::HttpTransport;
pub use crate::wrappers::{RecordEpisodeStatistics, TimeLimit};
