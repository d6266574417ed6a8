//! Session headers negotiated with the game server.
//!
//! The static part comes from the device profile and the account; `APP-VER`,
//! `MANIFEST-VER`, `REQUEST-ID` and `SID` are written as the server hands out
//! new values. Entries are only ever inserted or overwritten.

use crate::config::{DeviceConfig, ServerKind};
use std::collections::BTreeMap;

pub const APP_VER: &str = "APP-VER";
pub const RES_KEY: &str = "RES-KEY";
pub const PLATFORM: &str = "PLATFORM";
pub const PLATFORM_ID: &str = "PLATFORM-ID";
pub const CHANNEL_ID: &str = "CHANNEL-ID";
pub const MANIFEST_VER: &str = "MANIFEST-VER";
pub const REQUEST_ID: &str = "REQUEST-ID";
pub const SID: &str = "SID";
pub const CONTENT_TYPE: &str = "Content-Type";

/// Ordered header set attached to every outgoing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NegotiatedHeaders {
    entries: BTreeMap<String, String>,
}

impl NegotiatedHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial header set for one account on one server
    pub fn initial(
        device: &DeviceConfig,
        kind: ServerKind,
        app_ver: &str,
        platform: &str,
        channel: &str,
    ) -> Self {
        let mut headers = Self::new();
        for (name, value) in device.headers() {
            headers.insert(name, value);
        }
        headers.insert(APP_VER, app_ver);
        headers.insert(RES_KEY, kind.res_key());
        headers.insert(PLATFORM, platform);
        headers.insert(PLATFORM_ID, kind.platform_id_override().unwrap_or(platform));
        headers.insert(CHANNEL_ID, channel);
        headers
    }

    /// Insert or overwrite a header
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
