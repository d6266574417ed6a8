//! Endpoints used by the startup probe, the login handshake and the client
//! facade. Field names are the game client's wire names.

use crate::protocol::message::ApiRequest;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const SOURCE_INI_INDEX_PATH: &str = "source_ini/index?format=json";
pub const MAINTENANCE_STATUS_PATH: &str = "source_ini/get_maintenance_status?format=json";
pub const SDK_LOGIN_PATH: &str = "tool/sdk_login";
pub const GAME_START_PATH: &str = "check/game_start";
pub const LOAD_INDEX_PATH: &str = "load/index";
pub const HOME_INDEX_PATH: &str = "home/index";

macro_rules! api_request {
    ($name:ident, $path:expr) => {
        api_request!($name, $path, true);
    };
    ($name:ident, $path:expr, $encrypted:expr) => {
        impl ApiRequest for $name {
            fn needs_encryption(&self) -> bool {
                $encrypted
            }

            fn endpoint(&self) -> &'static str {
                $path
            }

            fn set_viewer_id(&mut self, viewer_id: String) {
                self.viewer_id = viewer_id;
            }
        }
    };
}

/// Server list probe (unencrypted)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceIniIndexRequest {
    pub viewer_id: String,
}
api_request!(SourceIniIndexRequest, SOURCE_INI_INDEX_PATH, false);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceIniIndexResponse {
    #[serde(default)]
    pub server: Vec<String>,
}

/// Maintenance status probe (unencrypted)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceStatusRequest {
    pub viewer_id: String,
}
api_request!(MaintenanceStatusRequest, MAINTENANCE_STATUS_PATH, false);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceStatusResponse {
    #[serde(default)]
    pub manifest_ver: String,
    #[serde(default)]
    pub required_manifest_ver: String,
}

/// First handshake step: trade SDK credentials for a viewer id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SdkLoginRequest {
    pub viewer_id: String,
    pub uid: String,
    pub access_key: String,
    pub platform: String,
    pub channel_id: String,
    pub challenge: String,
    pub validate: String,
    pub seccode: String,
    pub captcha_type: String,
    pub image_token: String,
    pub captcha_code: String,
}
api_request!(SdkLoginRequest, SDK_LOGIN_PATH);

impl SdkLoginRequest {
    pub fn new(uid: &str, access_key: &str, platform: &str, channel_id: &str) -> Self {
        Self {
            uid: uid.to_string(),
            access_key: access_key.to_string(),
            platform: platform.to_string(),
            channel_id: channel_id.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SdkLoginResponse {
    #[serde(default)]
    pub is_risk: Option<bool>,
}

/// Second handshake step; carries the tutorial flag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStartRequest {
    pub viewer_id: String,
    pub app_type: i32,
    pub campaign_data: String,
    pub campaign_user: u32,
}
api_request!(GameStartRequest, GAME_START_PATH);

impl GameStartRequest {
    /// Game start request with a random even campaign user in `0..=100000`
    pub fn new() -> Self {
        Self {
            campaign_user: rand::rng().random_range(0..=50_000u32) * 2,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStartResponse {
    #[serde(default)]
    pub now_tutorial: bool,
    #[serde(default)]
    pub now_name: String,
    #[serde(default)]
    pub now_team_level: i32,
}

/// Third handshake step; reports the daily reset deadline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadIndexRequest {
    pub viewer_id: String,
    pub carrier: String,
}
api_request!(LoadIndexRequest, LOAD_INDEX_PATH);

impl Default for LoadIndexRequest {
    fn default() -> Self {
        Self {
            viewer_id: String::new(),
            carrier: String::from("LN_NMSL"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadIndexResponse {
    #[serde(default)]
    pub daily_reset_time: u64,
}

/// Home screen; last handshake step and the facade's first business call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeIndexRequest {
    pub viewer_id: String,
    pub message_id: i32,
    pub tips_id_list: Vec<i32>,
    pub is_first: i32,
    pub gold_history: i32,
}
api_request!(HomeIndexRequest, HOME_INDEX_PATH);

impl HomeIndexRequest {
    /// The request the game sends when the home screen opens after login
    pub fn first_visit() -> Self {
        Self {
            message_id: 1,
            tips_id_list: Vec::new(),
            is_first: 1,
            gold_history: 0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeIndexResponse {
    #[serde(default)]
    pub daily_reset_time: u64,
}
