use crate::marker::MarkerSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    #[serde(default = "default_serial_path")]
    pub path: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Upper bound on how long draining inbound bytes may block.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub device_index: i32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    #[default]
    Camera,
    /// Replays image files from a directory instead of opening the camera.
    Replay,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub mode: SourceMode,
    #[serde(default)]
    pub replay_dir: Option<PathBuf>,
    /// Cycle through the replay directory forever instead of stopping at the end.
    #[serde(default)]
    pub repeat: bool,
}

/// Predefined ArUco dictionaries the detector can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum MarkerDictionary {
    #[default]
    #[serde(rename = "aruco_original")]
    ArucoOriginal,
    #[serde(rename = "4x4_50")]
    Dict4x4_50,
    #[serde(rename = "4x4_100")]
    Dict4x4_100,
    #[serde(rename = "4x4_250")]
    Dict4x4_250,
    #[serde(rename = "4x4_1000")]
    Dict4x4_1000,
    #[serde(rename = "5x5_50")]
    Dict5x5_50,
    #[serde(rename = "5x5_100")]
    Dict5x5_100,
    #[serde(rename = "5x5_250")]
    Dict5x5_250,
    #[serde(rename = "5x5_1000")]
    Dict5x5_1000,
    #[serde(rename = "6x6_50")]
    Dict6x6_50,
    #[serde(rename = "6x6_100")]
    Dict6x6_100,
    #[serde(rename = "6x6_250")]
    Dict6x6_250,
    #[serde(rename = "6x6_1000")]
    Dict6x6_1000,
    #[serde(rename = "7x7_50")]
    Dict7x7_50,
    #[serde(rename = "7x7_100")]
    Dict7x7_100,
    #[serde(rename = "7x7_250")]
    Dict7x7_250,
    #[serde(rename = "7x7_1000")]
    Dict7x7_1000,
    #[serde(rename = "apriltag_36h11")]
    AprilTag36h11,
}

/// Which rule turns a detected marker set into the presence signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Signal when at least one marker of any id is visible.
    AnyMarker,
    /// Signal when at least one of the interest ids is not visible.
    MissingInterest,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionConfig {
    #[serde(default)]
    pub dictionary: MarkerDictionary,
    #[serde(default)]
    pub interest_ids: Vec<i32>,
    #[serde(default)]
    pub policy: Option<PolicyKind>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebugConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: default_serial_path(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            warmup_ms: default_warmup_ms(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dump_dir: default_dump_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl CameraConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }
}

impl ControlConfig {
    /// Minimum spacing between two transmissions.
    pub fn period(&self) -> Result<Duration, ConfigError> {
        if !(self.rate_hz.is_finite() && self.rate_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "control.rate_hz must be positive, got {}",
                self.rate_hz
            )));
        }
        Duration::try_from_secs_f64(1.0 / self.rate_hz).map_err(|_| {
            ConfigError::Invalid(format!(
                "control.rate_hz {} gives a period too long to represent",
                self.rate_hz
            ))
        })
    }
}

impl DetectionConfig {
    pub fn interest_set(&self) -> MarkerSet {
        self.interest_ids.iter().copied().collect()
    }

    /// The configured policy, or the one implied by the interest list:
    /// no ids means any marker counts, otherwise the ids are tracked.
    pub fn effective_policy(&self) -> PolicyKind {
        match self.policy {
            Some(kind) => kind,
            None if self.interest_ids.is_empty() => PolicyKind::AnyMarker,
            None => PolicyKind::MissingInterest,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Invalid("serial.baud_rate must be non-zero".into()));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "camera resolution {}x{} has a zero dimension",
                self.camera.width, self.camera.height
            )));
        }
        if !(self.camera.fps.is_finite() && self.camera.fps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fps must be positive, got {}",
                self.camera.fps
            )));
        }
        self.control.period()?;
        if self.source.mode == SourceMode::Replay && self.source.replay_dir.is_none() {
            return Err(ConfigError::Invalid(
                "source.replay_dir is required when source.mode = \"replay\"".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// Default value functions
fn default_serial_path() -> String {
    "/dev/ttyACM0".into()
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_read_timeout_ms() -> u64 {
    1000
}
fn default_width() -> u32 {
    1920
}
fn default_height() -> u32 {
    1080
}
fn default_fps() -> f64 {
    10.0
}
fn default_warmup_ms() -> u64 {
    100
}
fn default_rate_hz() -> f64 {
    10.0
}
fn default_dump_dir() -> PathBuf {
    PathBuf::from("debug")
}
fn default_log_level() -> String {
    "info".into()
}
