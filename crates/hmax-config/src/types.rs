// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `hmax_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HmaxConfig {
    pub simulation: SimulationConfig,
    pub s2: S2Config,
    pub plasticity: PlasticityConfig,
    pub c2: C2Config,
    pub checkpoint: CheckpointConfig,
    pub reconstruction: ReconstructionConfig,
    pub plots: PlotsConfig,
    pub classifier: ClassifierConfig,
    pub logging: LoggingConfig,
}

/// Simulation loop configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated time per image in ms
    pub sim_time_ms: f64,
    /// Worker threads for the simulator (rayon pool size)
    pub threads: usize,
    /// Seed for weight initialization; `None` draws from OS entropy
    pub seed: Option<u64>,
    /// Base directory for relative input paths
    pub data_dir: PathBuf,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sim_time_ms: 50.0,
            threads: 1,
            seed: None,
            data_dir: PathBuf::from(""),
        }
    }
}

impl SimulationConfig {
    /// Resolve a command-line input path against `data_dir`.
    ///
    /// Absolute paths are returned unchanged.
    pub fn input_path(&self, path: &Path) -> PathBuf {
        self.data_dir.join(path)
    }
}

/// S2 layer construction
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct S2Config {
    /// Receptive field edge length
    pub feature_size: usize,
    /// Number of S2 prototypes to learn
    pub prototype_cells: usize,
    pub refractory_ms: f64,
    pub threshold: f64,
    /// Lower bound of the uniform initial weight distribution
    pub weight_init_low: f32,
    /// Upper bound of the uniform initial weight distribution
    pub weight_init_high: f32,
}

impl Default for S2Config {
    fn default() -> Self {
        Self {
            feature_size: 3,
            prototype_cells: 3,
            refractory_ms: 0.1,
            threshold: 1.0,
            weight_init_low: 0.0,
            weight_init_high: 0.3,
        }
    }
}

/// STDP parameters handed to the simulator for S2 connections
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlasticityConfig {
    pub tau_plus_ms: f64,
    pub tau_minus_ms: f64,
    pub a_plus: f32,
    pub a_minus: f32,
    pub w_min: f32,
    pub w_max: f32,
    pub learning_rate: f32,
}

impl Default for PlasticityConfig {
    fn default() -> Self {
        Self {
            tau_plus_ms: 20.0,
            tau_minus_ms: 20.0,
            a_plus: 0.01,
            a_minus: 0.012,
            w_min: 0.0,
            w_max: 1.0,
            learning_rate: 1.0,
        }
    }
}

/// C2 pooling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct C2Config {
    /// "max" or "sum"
    pub pooling: String,
}

impl Default for C2Config {
    fn default() -> Self {
        Self {
            pooling: "max".to_string(),
        }
    }
}

/// Weight checkpoint cadence
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Trials between periodic checkpoints (0 disables periodic checkpoints)
    pub interval_trials: u64,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            interval_trials: 10,
        }
    }
}

/// Feature reconstruction output
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    pub enabled: bool,
    /// Directory of oriented Gabor template images
    pub features_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            features_dir: PathBuf::from("features_gabor"),
            output_dir: PathBuf::from("S2_reconstructions"),
        }
    }
}

/// Spike raster output
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlotsConfig {
    pub output_dir: PathBuf,
}

impl Default for PlotsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("plots"),
        }
    }
}

/// Linear SVM training
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Inverse regularization strength
    pub c: f64,
    pub epochs: usize,
    pub learning_rate: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            epochs: 1000,
            learning_rate: 0.01,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for rolling log files; empty means console only
    pub log_dir: PathBuf,
    pub file_logging: bool,
    /// Days to keep old run folders
    pub retention_days: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            file_logging: false,
            retention_days: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_path_resolution() {
        let mut sim = SimulationConfig::default();
        assert_eq!(sim.input_path(Path::new("weights.hmaxw")), PathBuf::from("weights.hmaxw"));

        sim.data_dir = PathBuf::from("/data/run1");
        assert_eq!(
            sim.input_path(Path::new("weights.hmaxw")),
            PathBuf::from("/data/run1/weights.hmaxw")
        );
        assert_eq!(
            sim.input_path(Path::new("/tmp/weights.hmaxw")),
            PathBuf::from("/tmp/weights.hmaxw")
        );
    }
}
