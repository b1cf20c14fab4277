//! Configuration management for deployment parameters
//!
//! This module provides runtime configuration loading from JSON files.
//! Only deployment concerns live here (channel count, artifact locations,
//! replay cadence, relay window, HTTP binding). The detection pipeline
//! constants (filter band, thresholds, peak windows) are fixed in
//! `analysis` and deliberately absent from this file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    pub source: SourceConfig,
    pub relay: RelayConfig,
    pub http: HttpConfig,
}

/// Channel detector pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Number of physical channels (one detector each)
    pub channel_count: usize,
    /// Directory holding the pre-fitted artifacts
    pub models_dir: PathBuf,
    /// Classifier artifact file name inside `models_dir`
    pub model_file: String,
    /// Scaler artifact file name inside `models_dir`
    pub scaler_file: String,
    /// Upper bound on channels computed at the same time
    pub max_parallel_channels: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            channel_count: 6,
            models_dir: PathBuf::from("models"),
            model_file: "model.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            max_parallel_channels: 6,
        }
    }
}

impl DetectorConfig {
    pub fn model_path(&self) -> PathBuf {
        self.models_dir.join(&self.model_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.models_dir.join(&self.scaler_file)
    }
}

/// Recorded channel replay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory with one CSV recording per channel
    pub data_dir: PathBuf,
    /// Rows emitted per channel per poll
    pub page_size: usize,
    /// Delay between polls in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            page_size: 2000,
            poll_interval_ms: 100,
        }
    }
}

/// Window relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Samples per channel handed to the detector
    pub window_len: usize,
    /// Frames accumulated between readiness checks
    pub frames_per_check: u32,
    /// Channel (1-based) whose decimated readings are previewed, if any
    pub preview_channel: Option<usize>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            window_len: 21_000,
            frames_per_check: 4,
            preview_channel: None,
        }
    }
}

/// HTTP request layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
    /// Detection events buffered for slow stream subscribers
    pub stream_buffer: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:10002".to_string(),
            stream_buffer: 64,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults when the file is missing or
    /// its JSON is invalid (a warning is logged in both cases)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the conventional location
    pub fn load() -> Self {
        Self::load_from_file("config/detector.json")
    }
}
