//! Loader configuration: geometry of the DAC waveform RAM, sample rate, trigger
//! settings and per-event defaults, loaded from YAML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::loader::RunMode;

/// File name of the recorded SiPM waveform table, relative to `config/`.
pub const RECORDED_WAVEFORM_FILE: &str = "SipmWave8GSPS.csv";

/// Widest RAM address bus accepted by [`LoaderConfig::validate`].
const MAX_RAM_ADDR_WIDTH: u32 = 24;

/// Most DAC samples per RAM word accepted by [`LoaderConfig::validate`].
const MAX_SAMPLES_PER_CYCLE: usize = 64;

/// Errors raised while reading or validating a [`LoaderConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(std::io::Error),
    /// The config file is not valid YAML for this schema.
    Parse(serde_yaml::Error),
    /// A field holds a value the loader cannot work with.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Invalid(s) => write!(f, "invalid config: {s}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Initial value of every event slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDefaults {
    /// Pulse amplitude in DAC counts.
    pub amplitude: i16,
    /// Decay time constant in seconds.
    pub decay: f64,
    /// Rise time constant in seconds.
    pub rise: f64,
    /// Photon arrival time in seconds from the start of the buffer.
    pub incident_time: f64,
}

impl Default for EventDefaults {
    fn default() -> Self {
        Self {
            amplitude: 5000,
            decay: 100.0e-9,
            rise: 10.0e-9,
            incident_time: 4.0e-6,
        }
    }
}

/// Signal-generator loader configuration.
///
/// `ram_addr_width` and `samples_per_cycle` must match the firmware build
/// (`RAM_ADDR_WIDTH_G` / `SAMPLE_PER_CYCLE_G`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Install root; recorded waveforms are resolved against it when set.
    pub top_level: Option<PathBuf>,
    /// Number of simultaneous photon events in a synthesized waveform.
    pub max_events: usize,
    /// Address width of the signal generator's waveform RAM.
    pub ram_addr_width: u32,
    /// DAC samples per RAM word.
    pub samples_per_cycle: usize,
    /// DAC sample rate in Hz.
    pub sample_rate: f64,
    /// Source used by `LoadWaveform` until changed at runtime.
    pub run_mode: RunMode,
    /// Whether `getWaveformBurst` is allowed to pulse the start flag.
    pub enable_soft_trig: bool,
    /// Period of the polled soft trigger in milliseconds. 0 disables polling.
    pub poll_interval_ms: u64,
    /// Initial parameters for every event slot.
    pub events: EventDefaults,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            top_level: None,
            max_events: 4,
            ram_addr_width: 9,
            samples_per_cycle: 16,
            sample_rate: 8.128e9,
            run_mode: RunMode::Synthesize,
            enable_soft_trig: true,
            poll_interval_ms: 1000,
            events: EventDefaults::default(),
        }
    }
}

impl LoaderConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: LoaderConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from the standard path (~/.photon-siggen/loader.yaml).
    /// Returns None if the file doesn't exist or is rejected; a rejected file
    /// is logged.
    pub fn load_default() -> Option<Self> {
        Self::load_if_present(&default_config_path()?)
    }

    fn load_if_present(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load(path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("ignoring {}: {e}", path.display());
                None
            }
        }
    }

    /// Check the fields that the synthesizer and loader depend on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_events == 0 {
            return Err(ConfigError::Invalid("max_events must be at least 1".into()));
        }
        if self.samples_per_cycle == 0 {
            return Err(ConfigError::Invalid(
                "samples_per_cycle must be at least 1".into(),
            ));
        }
        if self.samples_per_cycle > MAX_SAMPLES_PER_CYCLE {
            return Err(ConfigError::Invalid(format!(
                "samples_per_cycle {} exceeds {MAX_SAMPLES_PER_CYCLE}",
                self.samples_per_cycle
            )));
        }
        if self.ram_addr_width > MAX_RAM_ADDR_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "ram_addr_width {} exceeds {MAX_RAM_ADDR_WIDTH}",
                self.ram_addr_width
            )));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "sample_rate must be a positive number of Hz, got {}",
                self.sample_rate
            )));
        }
        Ok(())
    }

    /// Number of RAM words in the signal generator.
    pub fn ram_depth(&self) -> usize {
        1usize << self.ram_addr_width
    }

    /// Number of DAC samples in one waveform.
    pub fn buffer_length(&self) -> usize {
        self.samples_per_cycle * self.ram_depth()
    }

    /// Location of the recorded waveform table.
    ///
    /// `<top_level>/config/SipmWave8GSPS.csv` when an install root is set,
    /// otherwise `config/SipmWave8GSPS.csv` relative to the working directory.
    pub fn recorded_waveform_path(&self) -> PathBuf {
        let relative = Path::new("config").join(RECORDED_WAVEFORM_FILE);
        match &self.top_level {
            Some(top) if !top.as_os_str().is_empty() => top.join(relative),
            _ => relative,
        }
    }
}

/// Standard config location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".photon-siggen").join("loader.yaml"))
}
