//! Configuration management

use crate::speech::backends::cloud::DEFAULT_ENDPOINT;
use crate::{NarratorError, Result};
use ini::Ini;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration for the narrator
///
/// Speech backend and rate, spotlight geometry, the capture grace period
/// and the sample beacons seeded at start-up.
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path (~/.beacon-narrator.cfg)
    path: PathBuf,

    /// Sample beacon texts, in key order
    pub sample_texts: Vec<String>,
}

impl Config {
    /// Load configuration from the default path, creating it if absent
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path`, creating it with defaults if absent
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| NarratorError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| NarratorError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        let mut config = Self {
            ini,
            path,
            sample_texts: Vec::new(),
        };
        config.parse_sample_texts();

        Ok(config)
    }

    /// In-memory defaults, never written to disk
    pub fn defaults() -> Self {
        let mut config = Self {
            ini: Self::default_config(),
            path: PathBuf::new(),
            sample_texts: Vec::new(),
        };
        config.parse_sample_texts();
        config
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| NarratorError::Config(format!("Failed to save config: {}", e)))
    }

    fn config_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".beacon-narrator.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("speech"))
            .set("backend", "silent")
            .set("rate", "1.0")
            .set("rate_step", "0.25")
            .set("min_rate", "0.25")
            .set("max_rate", "4.0")
            .set("words_per_minute", "160")
            .set("endpoint", DEFAULT_ENDPOINT)
            .set("language_code", "en-US");

        ini.with_section(Some("narration"))
            .set("capture_grace_secs", "5.0")
            .set("spotlight_radius", "1.0")
            .set("spotlight_depth", "20")
            .set("spotlight_angle", "120");

        ini.with_section(Some("beacons"))
            .set("0", "Exit")
            .set("1", "Restrooms")
            .set("2", "Elevator to floors 2 through 5");

        ini
    }

    fn parse_sample_texts(&mut self) {
        let mut texts: Vec<(u32, String)> = self
            .ini
            .section(Some("beacons"))
            .map(|section| {
                section
                    .iter()
                    .filter_map(|(key, value)| key.parse::<u32>().ok().map(|k| (k, value.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        texts.sort_by_key(|(k, _)| *k);
        self.sample_texts = texts.into_iter().map(|(_, text)| text).collect();
        debug!("Loaded {} sample beacons", self.sample_texts.len());
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get a float value from config; non-finite values fall back to `default`
    pub fn get_float(&self, section: &str, key: &str, default: f32) -> f32 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse::<f32>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
        if section == "beacons" {
            self.parse_sample_texts();
        }
    }

    // Speech

    /// Speech backend name (silent, cloud, native)
    pub fn backend(&self) -> String {
        self.get_string("speech", "backend", "silent").to_lowercase()
    }

    pub fn rate(&self) -> f32 {
        self.get_float("speech", "rate", 1.0)
    }

    pub fn rate_step(&self) -> f32 {
        self.get_float("speech", "rate_step", 0.25)
    }

    /// Allowed speaking-rate range, always positive and ordered
    pub fn rate_bounds(&self) -> (f32, f32) {
        let min = self.get_float("speech", "min_rate", 0.25).max(0.05);
        let max = self.get_float("speech", "max_rate", 4.0).max(min);
        (min, max)
    }

    pub fn words_per_minute(&self) -> f32 {
        self.get_float("speech", "words_per_minute", 160.0)
    }

    pub fn endpoint(&self) -> String {
        self.get_string("speech", "endpoint", DEFAULT_ENDPOINT)
    }

    /// API key for the cloud backend; the environment overrides the file
    pub fn api_key(&self) -> Option<String> {
        std::env::var("BEACON_NARRATOR_API_KEY")
            .ok()
            .or_else(|| self.ini.get_from(Some("speech"), "api_key").map(str::to_string))
            .filter(|k| !k.trim().is_empty())
    }

    pub fn language_code(&self) -> String {
        self.get_string("speech", "language_code", "en-US")
    }

    // Narration

    /// Pause before a first-time-only pass, letting capture settle
    pub fn capture_grace(&self) -> Duration {
        let secs = self.get_float("narration", "capture_grace_secs", 5.0).max(0.0);
        Duration::try_from_secs_f32(secs).unwrap_or(Duration::from_secs(5))
    }

    pub fn spotlight_radius(&self) -> f32 {
        self.get_float("narration", "spotlight_radius", 1.0)
    }

    pub fn spotlight_depth(&self) -> f32 {
        self.get_float("narration", "spotlight_depth", 20.0)
    }

    pub fn spotlight_angle(&self) -> f32 {
        self.get_float("narration", "spotlight_angle", 120.0)
    }
}
