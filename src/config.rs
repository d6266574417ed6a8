//! # Configuration Management
//!
//! Static configuration for the game API engine and the shared runtime option
//! store.
//!
//! [`ClientConfig`] is loaded once (TOML file, TOML string, environment, or
//! defaults) and describes the server variant, timeouts, the device identity
//! headers the game client sends, and logging.
//!
//! [`RuntimeConfig`] holds the values that change while the process runs: the
//! current client version and the API host. It is constructed explicitly and
//! shared through an `Arc` by every engine that needs it.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()`

use crate::error::{constants, ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, warn, Level};

/// Fixed CBC initialization vector shared by every game client
pub const PROTOCOL_IV: &[u8; 16] = b"ha4nBYA2APUD6Uv1";

/// Salt appended to the session token before hashing it into the `SID` header
pub const SID_SALT: &str = "c!SID!n";

/// Client version used until the server reports a newer one
pub const DEFAULT_APP_VER: &str = "8.1.0";

/// API host of the default server
pub const DEFAULT_API_HOST: &str = "le1-prod-all-gs-gzlj.bilibiligame.net";

/// API host of the channel server
pub const DEFAULT_CHANNEL_API_HOST: &str = "l1-prod-uo-gs-gzlj.bilibiligame.net";

/// Per-call HTTP timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Published game detail endpoint carrying the current client version
pub const DEFAULT_VERSION_PROBE_URL: &str =
    "https://line1-h5-pc-api.biligame.com/game/detail/content?game_base_id=102216";

/// Number of full handshake attempts before login gives up
pub const LOGIN_ATTEMPTS: u32 = 3;

const DEFAULT_RES_KEY: &str = "ab00a0a6dd915a052a2ef7fd649083e5";
const CHANNEL_RES_KEY: &str = "d145b29050641dac2f8b19df0afe0e59";

/// Which game server an engine talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    #[default]
    Default,
    Channel,
}

impl ServerKind {
    /// Resource key header value for this server
    pub fn res_key(self) -> &'static str {
        match self {
            ServerKind::Default => DEFAULT_RES_KEY,
            ServerKind::Channel => CHANNEL_RES_KEY,
        }
    }

    /// Fixed `PLATFORM-ID` override, if the server imposes one
    pub fn platform_id_override(self) -> Option<&'static str> {
        match self {
            ServerKind::Default => None,
            ServerKind::Channel => Some("4"),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ProtocolError::Config(format!("Failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::Config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(kind) = std::env::var("PCR_SERVER") {
            config.server.kind = match kind.to_ascii_lowercase().as_str() {
                "default" => ServerKind::Default,
                "channel" => ServerKind::Channel,
                other => {
                    return Err(ProtocolError::Config(format!(
                        "Unknown server kind in PCR_SERVER: '{other}'"
                    )))
                }
            };
        }

        if let Ok(host) = std::env::var("PCR_API_HOST") {
            config.server.api_host = host;
        }

        if let Ok(timeout) = std::env::var("PCR_REQUEST_TIMEOUT_MS") {
            if let Ok(val) = timeout.parse::<u64>() {
                config.server.request_timeout = Duration::from_millis(val);
            }
        }

        if let Ok(ver) = std::env::var("PCR_APP_VER") {
            config.server.app_ver = ver;
        }

        if let Ok(level) = std::env::var("PCR_LOG_LEVEL") {
            if let Ok(val) = level.parse::<Level>() {
                config.logging.log_level = val;
            }
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Validate the configuration. An empty list means the configuration is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.device.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }

    /// Runtime option store seeded from this configuration
    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig::with_defaults(&self.server.app_ver, &self.server.api_host)
    }
}

/// Server selection and HTTP behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Default or channel server
    pub kind: ServerKind,

    /// Host of the default server, without scheme
    pub api_host: String,

    /// Host of the channel server, without scheme
    pub channel_api_host: String,

    /// Client version to start with
    pub app_ver: String,

    /// Timeout applied to every API call
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,

    /// Endpoint queried for the published client version
    pub version_probe_url: String,

    /// Timeout for the version probe
    #[serde(with = "duration_serde")]
    pub version_probe_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            kind: ServerKind::Default,
            api_host: String::from(DEFAULT_API_HOST),
            channel_api_host: String::from(DEFAULT_CHANNEL_API_HOST),
            app_ver: String::from(DEFAULT_APP_VER),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            version_probe_url: String::from(DEFAULT_VERSION_PROBE_URL),
            version_probe_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, host) in [
            ("api_host", &self.api_host),
            ("channel_api_host", &self.channel_api_host),
        ] {
            if host.is_empty() {
                errors.push(format!("{name} cannot be empty"));
            } else if host.contains("://") {
                errors.push(format!("{name} must not include a scheme: '{host}'"));
            }
        }

        if self.app_ver.is_empty() {
            errors.push("app_ver cannot be empty".to_string());
        }

        if self.request_timeout.as_millis() < 100 {
            errors.push("Request timeout too short (minimum: 100ms)".to_string());
        } else if self.request_timeout.as_secs() > 300 {
            errors.push("Request timeout too long (maximum: 300s)".to_string());
        }

        if !self.version_probe_url.starts_with("http://")
            && !self.version_probe_url.starts_with("https://")
        {
            errors.push(format!(
                "Invalid version probe URL: '{}' (expected http:// or https://)",
                self.version_probe_url
            ));
        }

        if self.version_probe_timeout.as_millis() < 100 {
            errors.push("Version probe timeout too short (minimum: 100ms)".to_string());
        }

        errors
    }

    /// Host the engine should address, given the current runtime options
    pub fn resolve_host(&self, runtime: &RuntimeConfig) -> String {
        match self.kind {
            ServerKind::Default => runtime.get(OptionKey::ApiHost),
            ServerKind::Channel => self.channel_api_host.clone(),
        }
    }
}

/// Device identity the game client reports on every request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    pub user_agent: String,
    pub unity_version: String,
    pub battle_logic_version: String,
    pub device: String,
    pub device_id: String,
    pub device_name: String,
    pub excel_ver: String,
    pub graphics_device_name: String,
    pub ip_address: String,
    pub locale: String,
    pub platform_os_version: String,
    pub region_code: String,
    pub res_ver: String,
    pub short_udid: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            user_agent: String::from(
                "UnityPlayer/2021.3.36f1c1 (UnityWebRequest/1.0, libcurl/8.5.0-DEV)",
            ),
            unity_version: String::from("2021.3.36f1c1"),
            battle_logic_version: String::from("4"),
            device: String::from("2"),
            device_id: String::from("ln-nmsl"),
            device_name: String::from("LN_NMSL"),
            excel_ver: String::from("1.0.0"),
            graphics_device_name: String::from("LN_NMSL"),
            ip_address: String::from("0.0.0.0"),
            locale: String::from("Jpn"),
            platform_os_version: String::from("RedStar OS - GoPcr"),
            region_code: String::from("CN"),
            res_ver: String::from("10002200"),
            short_udid: String::from("0"),
        }
    }
}

impl DeviceConfig {
    pub fn validate(&self) -> Vec<String> {
        self.headers()
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| format!("Device header {name} cannot be empty"))
            .collect()
    }

    /// Header name/value pairs describing this device
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("User-Agent", self.user_agent.clone()),
            ("X-Unity-Version", self.unity_version.clone()),
            ("BATTLE-LOGIC-VERSION", self.battle_logic_version.clone()),
            ("DEVICE", self.device.clone()),
            ("DEVICE-ID", self.device_id.clone()),
            ("DEVICE-NAME", self.device_name.clone()),
            ("EXCEL-VER", self.excel_ver.clone()),
            ("GRAPHICS-DEVICE-NAME", self.graphics_device_name.clone()),
            ("IP-ADDRESS", self.ip_address.clone()),
            ("LOCALE", self.locale.clone()),
            ("PLATFORM-OS-VERSION", self.platform_os_version.clone()),
            ("REGION-CODE", self.region_code.clone()),
            ("RES-VER", self.res_ver.clone()),
            ("SHORT-UDID", self.short_udid.clone()),
        ]
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level used when `RUST_LOG` is not set
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("pcr-protocol"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Keys of the runtime option store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    /// Client version sent as `APP-VER`
    AppVer,
    /// Host of the default API server
    ApiHost,
}

/// Process-wide mutable options shared by every engine
///
/// Reads take a shared lock so many engines can read concurrently; the only
/// writer in practice is the version-refresh path. A lock poisoned by a
/// panicking holder is recovered on both reads and writes.
#[derive(Debug)]
pub struct RuntimeConfig {
    defaults: HashMap<OptionKey, String>,
    options: RwLock<HashMap<OptionKey, String>>,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::with_defaults(DEFAULT_APP_VER, DEFAULT_API_HOST)
    }

    pub fn with_defaults(app_ver: &str, api_host: &str) -> Self {
        let defaults = HashMap::from([
            (OptionKey::AppVer, app_ver.to_string()),
            (OptionKey::ApiHost, api_host.to_string()),
        ]);
        Self {
            defaults,
            options: RwLock::new(HashMap::new()),
        }
    }

    /// Current value of `key`, falling back to its default
    pub fn get(&self, key: OptionKey) -> String {
        let stored = match self.options.read() {
            Ok(options) => options.get(&key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(&key).cloned(),
        };
        stored
            .or_else(|| self.defaults.get(&key).cloned())
            .unwrap_or_default()
    }

    /// Replace the value of `key`
    pub fn set(&self, key: OptionKey, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        if self.get(key) == value {
            return Ok(());
        }

        let mut options = match self.options.write() {
            Ok(options) => options,
            Err(poisoned) => {
                warn!(?key, "{}", constants::ERR_LOCK_POISONED);
                poisoned.into_inner()
            }
        };
        debug!(?key, value = %value, "Runtime option updated");
        options.insert(key, value);
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_runtime_defaults_and_overrides() {
        let runtime = RuntimeConfig::new();
        assert_eq!(runtime.get(OptionKey::AppVer), DEFAULT_APP_VER);
        assert_eq!(runtime.get(OptionKey::ApiHost), DEFAULT_API_HOST);

        runtime.set(OptionKey::AppVer, "8.2.0").unwrap();
        assert_eq!(runtime.get(OptionKey::AppVer), "8.2.0");
        assert_eq!(runtime.get(OptionKey::ApiHost), DEFAULT_API_HOST);
    }

    #[test]
    fn test_runtime_concurrent_readers() {
        let runtime = Arc::new(RuntimeConfig::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let runtime = Arc::clone(&runtime);
                std::thread::spawn(move || runtime.get(OptionKey::AppVer))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), DEFAULT_APP_VER);
        }
    }

    #[test]
    fn test_runtime_survives_poisoned_lock() {
        let runtime = Arc::new(RuntimeConfig::new());
        runtime.set(OptionKey::AppVer, "8.2.0").unwrap();

        let poisoner = Arc::clone(&runtime);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.options.write().unwrap();
            panic!("poison the option store");
        })
        .join();
        assert!(joined.is_err());
        assert!(runtime.options.is_poisoned());

        assert_eq!(runtime.get(OptionKey::AppVer), "8.2.0");
        runtime.set(OptionKey::AppVer, "8.3.0").unwrap();
        assert_eq!(runtime.get(OptionKey::AppVer), "8.3.0");
    }

    #[test]
    fn test_channel_server_overrides() {
        assert_eq!(ServerKind::Channel.platform_id_override(), Some("4"));
        assert_eq!(ServerKind::Default.platform_id_override(), None);
        assert_ne!(ServerKind::Channel.res_key(), ServerKind::Default.res_key());
    }

    #[test]
    fn test_resolve_host_follows_runtime_for_default_server() {
        let runtime = RuntimeConfig::new();
        let mut server = ServerConfig::default();
        runtime.set(OptionKey::ApiHost, "mirror.example.net").unwrap();
        assert_eq!(server.resolve_host(&runtime), "mirror.example.net");

        server.kind = ServerKind::Channel;
        assert_eq!(server.resolve_host(&runtime), DEFAULT_CHANNEL_API_HOST);
    }
}
