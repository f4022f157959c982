// In-process stand-in for the Gym HTTP server.
//
// Mirrors the server's per-instance state machine closely enough to exercise
// the client: unknown ids, step before reset, step after done, monitor
// bracketing and upload credentials.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use gym_http_client::{ClientConfig, Client, GymError, HttpResponse, Method, Result, Transport};
use serde_json::{Value as Json, json};

pub const BASE_URL: &str = "http://stub.local:5000";
pub const GOOD_KEY: &str = "sk-good";

/// Rewards handed out by the discrete environment, one per step.
pub const COPY_REWARDS: [f64; 5] = [0.5, -0.25, 1.0, 0.0, 2.75];
pub const COPY_ACTIONS: i64 = 6;

struct Instance {
    env_id: String,
    needs_reset: bool,
    t: usize,
    samples: i64,
    monitoring: bool,
}

#[derive(Default)]
struct State {
    next_id: u64,
    instances: HashMap<String, Instance>,
    requests: Vec<(Method, String)>,
}

#[derive(Default)]
pub struct StubServer {
    state: Mutex<State>,
}

pub fn client() -> Client {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Client::with_transport(ClientConfig::new(BASE_URL), StubServer::default())
}

fn ok(body: Json) -> Result<HttpResponse> {
    Ok(HttpResponse::new(200, body.to_string()))
}

fn no_content() -> Result<HttpResponse> {
    Ok(HttpResponse::new(204, ""))
}

fn err(status: u16, message: &str) -> Result<HttpResponse> {
    Ok(HttpResponse::new(status, json!({ "message": message }).to_string()))
}

fn action_space(env_id: &str) -> Json {
    match env_id {
        "Pendulum-v0" => json!({"name": "Box", "shape": [1], "low": [-2.0], "high": [2.0]}),
        _ => json!({"name": "Discrete", "n": COPY_ACTIONS}),
    }
}

fn observation_space(env_id: &str) -> Json {
    match env_id {
        "Pendulum-v0" => json!({"name": "Box", "shape": [3], "low": [-1.0, -1.0, -8.0], "high": [1.0, 1.0, 8.0]}),
        _ => json!({"name": "Discrete", "n": COPY_ACTIONS}),
    }
}

fn contains(env_id: &str, x: &Json) -> bool {
    match env_id {
        "Pendulum-v0" => x
            .as_array()
            .is_some_and(|a| a.len() == 1 && a[0].as_f64().is_some_and(|v| (-2.0..=2.0).contains(&v))),
        _ => x.as_i64().is_some_and(|v| (0..COPY_ACTIONS).contains(&v)),
    }
}

impl StubServer {
    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    fn route(&self, method: Method, path: &str, body: Option<&Json>) -> Result<HttpResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push((method, path.to_string()));

        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match (method, segments.as_slice()) {
            (Method::Post, ["v1", "envs"]) => {
                let env_id = body.and_then(|b| b["env_id"].as_str()).unwrap_or_default().to_string();
                if !["Copy-v0", "Pendulum-v0"].contains(&env_id.as_str()) {
                    return err(400, &format!("Attempted to look up malformed environment ID '{env_id}'"));
                }
                state.next_id += 1;
                let id = format!("{:08x}", state.next_id * 0x9e37);
                state.instances.insert(
                    id.clone(),
                    Instance { env_id, needs_reset: true, t: 0, samples: 0, monitoring: false },
                );
                ok(json!({ "instance_id": id }))
            }
            (Method::Get, ["v1", "envs"]) => {
                let all: serde_json::Map<String, Json> =
                    state.instances.iter().map(|(k, v)| (k.clone(), json!(v.env_id))).collect();
                ok(json!({ "all_envs": all }))
            }
            (Method::Post, ["v1", "upload"]) => match body.and_then(|b| b["api_key"].as_str()) {
                Some(GOOD_KEY) => no_content(),
                _ => err(401, "invalid api_key"),
            },
            (_, ["v1", "envs", id, rest @ ..]) => {
                let id = id.to_string();
                let Some(inst) = state.instances.get_mut(&id) else {
                    return err(400, &format!("Instance_id {id} unknown"));
                };
                match (method, rest) {
                    (Method::Post, ["close"]) => {
                        state.instances.remove(&id);
                        no_content()
                    }
                    (Method::Get, ["action_space"]) => ok(json!({ "info": action_space(&inst.env_id) })),
                    (Method::Get, ["observation_space"]) => ok(json!({ "info": observation_space(&inst.env_id) })),
                    (Method::Get, ["action_space", "sample"]) => {
                        inst.samples += 1;
                        let action = match inst.env_id.as_str() {
                            "Pendulum-v0" => json!([(inst.samples % 5) as f64 * 0.5 - 1.0]),
                            _ => json!(inst.samples % COPY_ACTIONS),
                        };
                        ok(json!({ "action": action }))
                    }
                    (Method::Post, ["action_space", "contains"]) => {
                        let x = body.map(|b| b["x"].clone()).unwrap_or(Json::Null);
                        ok(json!({ "member": contains(&inst.env_id, &x) }))
                    }
                    (Method::Post, ["reset"]) => {
                        inst.needs_reset = false;
                        inst.t = 0;
                        match inst.env_id.as_str() {
                            "Pendulum-v0" => ok(json!({ "observation": [1.0, 0.0, 0.0] })),
                            _ => ok(json!({ "observation": 0 })),
                        }
                    }
                    (Method::Post, ["step"]) => {
                        if inst.needs_reset {
                            return err(500, "Cannot call env.step() before calling reset()");
                        }
                        let action = body.map(|b| b["action"].clone()).unwrap_or(Json::Null);
                        if !contains(&inst.env_id, &action) {
                            return err(500, &format!("{action} is not a valid action"));
                        }
                        let render = body.and_then(|b| b["render"].as_bool()).unwrap_or(false);
                        let reward = COPY_REWARDS[inst.t];
                        inst.t += 1;
                        let done = inst.t == COPY_REWARDS.len();
                        inst.needs_reset = done;
                        let observation = if render {
                            json!([[[255, 0, 0], [0, 255, 0]], [[0, 0, 255], [9, 9, 9]]])
                        } else {
                            action
                        };
                        ok(json!({
                            "observation": observation,
                            "reward": reward,
                            "done": done,
                            "info": { "t": inst.t }
                        }))
                    }
                    (Method::Post, ["monitor", "start"]) => {
                        if inst.monitoring {
                            return err(500, "Monitor already running");
                        }
                        inst.monitoring = true;
                        no_content()
                    }
                    (Method::Post, ["monitor", "close"]) => {
                        if !inst.monitoring {
                            return err(500, "Monitor not started");
                        }
                        inst.monitoring = false;
                        no_content()
                    }
                    _ => err(404, "Not Found"),
                }
            }
            _ => err(404, "Not Found"),
        }
    }
}

impl Transport for StubServer {
    fn send(&self, method: Method, url: &str, body: Option<&Json>) -> Result<HttpResponse> {
        let Some(path) = url.strip_prefix(BASE_URL) else {
            return Err(GymError::Transport(format!("connection refused: {url}")));
        };
        self.route(method, path, body)
    }
}
