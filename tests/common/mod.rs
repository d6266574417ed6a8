//! Scripted in-memory game server shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pcr_protocol::config::{ClientConfig, RuntimeConfig};
use pcr_protocol::core::crypto::ProtocolCrypto;
use pcr_protocol::error::{ProtocolError, Result};
use pcr_protocol::protocol::endpoints::{
    GAME_START_PATH, HOME_INDEX_PATH, LOAD_INDEX_PATH, MAINTENANCE_STATUS_PATH, SDK_LOGIN_PATH,
    SOURCE_INI_INDEX_PATH,
};
use pcr_protocol::service::{SdkAccount, SessionEngine};
use pcr_protocol::transport::{HttpRequest, HttpResponse, HttpTransport, VersionProbe};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const VIEWER_ID: u64 = 1_000_001;
pub const DAILY_RESET: u64 = 1_700_000_000;

/// Scripted outcome for one call to an endpoint
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Code(i32),
    Status(u16),
    /// Never answer
    Hang,
}

/// One request as the server saw it
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub endpoint: String,
    pub headers: Vec<(String, String)>,
    pub viewer_id: u64,
}

impl RecordedCall {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

struct State {
    calls: Vec<RecordedCall>,
    script: HashMap<&'static str, VecDeque<Reply>>,
    now_tutorial: bool,
    manifest_ver: String,
    serial: u64,
}

pub struct MockGameServer {
    crypto: ProtocolCrypto,
    state: Mutex<State>,
}

impl MockGameServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            crypto: ProtocolCrypto::new(),
            state: Mutex::new(State {
                calls: Vec::new(),
                script: HashMap::new(),
                now_tutorial: true,
                manifest_ver: String::from("10002200"),
                serial: 0,
            }),
        })
    }

    /// Queue replies for the next calls to `endpoint`; unscripted calls succeed
    pub fn script(&self, endpoint: &'static str, replies: &[Reply]) {
        let mut state = self.state.lock().unwrap();
        state
            .script
            .entry(endpoint)
            .or_default()
            .extend(replies.iter().copied());
    }

    pub fn set_tutorial_done(&self, done: bool) {
        self.state.lock().unwrap().now_tutorial = done;
    }

    pub fn set_manifest_ver(&self, ver: &str) {
        self.state.lock().unwrap().manifest_ver = ver.to_string();
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.endpoint == endpoint)
            .collect()
    }

    fn read_viewer_id(&self, encrypted: bool, body: &[u8]) -> u64 {
        let fields: Value = if encrypted {
            self.crypto.open_envelope(body).unwrap()
        } else {
            serde_json::from_slice(body).unwrap()
        };
        let raw = fields["viewer_id"].as_str().unwrap_or_default();
        if encrypted {
            self.crypto.decrypt_viewer_id(raw).unwrap()
        } else {
            raw.parse().unwrap()
        }
    }
}

fn known_endpoint(endpoint: &str) -> Option<&'static str> {
    [
        SOURCE_INI_INDEX_PATH,
        MAINTENANCE_STATUS_PATH,
        SDK_LOGIN_PATH,
        GAME_START_PATH,
        LOAD_INDEX_PATH,
        HOME_INDEX_PATH,
    ]
    .into_iter()
    .find(|known| *known == endpoint)
}

#[async_trait]
impl HttpTransport for MockGameServer {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let endpoint = known_endpoint(&request.endpoint)
            .ok_or_else(|| ProtocolError::Transport(format!("no route for {}", request.endpoint)))?;
        let encrypted = request.header("Content-Type") == Some("application/octet-stream");
        let viewer_id = self.read_viewer_id(encrypted, &request.body);

        let reply = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(RecordedCall {
                endpoint: endpoint.to_string(),
                headers: request.headers.clone(),
                viewer_id,
            });
            state
                .script
                .get_mut(endpoint)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Reply::Code(1))
        };
        let code = match reply {
            Reply::Hang => return std::future::pending().await,
            Reply::Status(status) => {
                return Ok(HttpResponse {
                    status,
                    body: Default::default(),
                })
            }
            Reply::Code(code) => code,
        };

        let mut state = self.state.lock().unwrap();
        state.serial += 1;
        let serial = state.serial;
        let data = match endpoint {
            SOURCE_INI_INDEX_PATH => json!({ "server": ["gs1"] }),
            MAINTENANCE_STATUS_PATH => json!({ "manifest_ver": state.manifest_ver }),
            SDK_LOGIN_PATH => json!({ "is_risk": false }),
            GAME_START_PATH => json!({ "now_tutorial": state.now_tutorial, "now_team_level": 80 }),
            _ => json!({ "daily_reset_time": DAILY_RESET }),
        };
        let reply_viewer = if endpoint == SDK_LOGIN_PATH { VIEWER_ID } else { viewer_id };
        let envelope = json!({
            "data_headers": {
                "sid": format!("sid-{serial}"),
                "request_id": format!("req-{serial}"),
                "result_code": code,
                "viewer_id": reply_viewer,
            },
            "data": data,
        });

        let body = if encrypted {
            BASE64
                .encode(self.crypto.encrypt_payload(&envelope)?)
                .into_bytes()
        } else {
            serde_json::to_vec(&envelope).unwrap()
        };
        Ok(HttpResponse {
            status: 200,
            body: body.into(),
        })
    }
}

/// Version probe that counts how often it was asked
pub struct CountingProbe {
    version: String,
    calls: AtomicUsize,
}

impl CountingProbe {
    pub fn new(version: &str) -> Arc<Self> {
        Arc::new(Self {
            version: version.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VersionProbe for CountingProbe {
    async fn fetch(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.version.clone())
    }
}

pub fn account() -> SdkAccount {
    SdkAccount::new("10086", "access-key", "2", "1")
}

pub async fn connect(
    server: &Arc<MockGameServer>,
    probe: &Arc<CountingProbe>,
) -> Result<(SessionEngine, Arc<RuntimeConfig>)> {
    let config = ClientConfig::default();
    let runtime = Arc::new(config.runtime());
    let engine = SessionEngine::with_transport(
        account(),
        &config,
        Arc::clone(&runtime),
        server.clone(),
        probe.clone(),
    )
    .await?;
    Ok((engine, runtime))
}
