use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Server settings (operator-facing, read once at startup)
///
/// Distinct from [`crate::RelayConfig`], which is edited at runtime through
/// the control API and persisted under `paths.data_dir`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub relay: RelayProcessConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Holds `config.json`
    pub data_dir: PathBuf,
    /// Playlist and segments written by ffmpeg
    pub output_dir: PathBuf,
    /// `index.html` and browser assets
    pub static_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            output_dir: PathBuf::from("./stream_output"),
            static_dir: PathBuf::from("./static"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayProcessConfig {
    pub ffmpeg_path: String,
    /// Grace period between SIGTERM and SIGKILL
    pub stop_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// How long to wait for the exit status after SIGKILL
    pub kill_wait_ms: u64,
    /// Launch the persisted configuration when the server boots
    pub auto_start: bool,
}

impl Default for RelayProcessConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            stop_timeout_ms: 4000,
            poll_interval_ms: 100,
            kill_wait_ms: 1000,
            auto_start: true,
        }
    }
}

impl RelayProcessConfig {
    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn kill_wait(&self) -> Duration {
        Duration::from_millis(self.kill_wait_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Settings {
    /// Load settings from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Settings file (if provided and present)
    /// 3. Defaults (lowest priority)
    pub fn load(settings_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = settings_file {
            if path.exists() {
                builder = builder.add_source(File::from(path));
            }
        }

        // HLSRELAY_SERVER__PORT, HLSRELAY_RELAY__FFMPEG_PATH, ...
        builder = builder.add_source(
            Environment::with_prefix("HLSRELAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Path of the persisted relay configuration
    #[must_use]
    pub fn relay_config_path(&self) -> PathBuf {
        self.paths.data_dir.join("config.json")
    }

    /// Get HTTP address
    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Check settings that would otherwise fail late at runtime.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.host.trim().is_empty() {
            errors.push("server.host must not be empty".to_string());
        }
        if self.server.port == 0 {
            errors.push("server.port must not be 0".to_string());
        }
        if self.relay.ffmpeg_path.trim().is_empty() {
            errors.push("relay.ffmpeg_path must not be empty".to_string());
        }
        if self.relay.poll_interval_ms == 0 {
            errors.push("relay.poll_interval_ms must be greater than 0".to_string());
        }
        if self.relay.stop_timeout_ms < self.relay.poll_interval_ms {
            errors.push("relay.stop_timeout_ms must be at least relay.poll_interval_ms".to_string());
        }
        if self.paths.data_dir == self.paths.output_dir {
            errors.push("paths.data_dir and paths.output_dir must differ".to_string());
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be \"json\" or \"pretty\", got {:?}",
                self.logging.format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
