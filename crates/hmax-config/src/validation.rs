// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that configuration values are within range and consistent with
//! each other before any layer is built.

use crate::{ConfigError, ConfigResult, HmaxConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    OutOfRange { field: String, reason: String },
    InconsistentBounds { low: String, high: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { field, reason } => {
                write!(f, "{} is out of range: {}", field, reason)
            }
            Self::InconsistentBounds { low, high } => {
                write!(f, "{} must not exceed {}", low, high)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation found
pub fn validate_config(config: &HmaxConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_simulation(config, &mut errors);
    validate_s2(config, &mut errors);
    validate_plasticity(config, &mut errors);
    validate_pooling(config, &mut errors);
    validate_classifier(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn positive(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(ConfigValidationError::OutOfRange {
            field: field.to_string(),
            reason: format!("must be a positive number, got {}", value),
        });
    }
}

fn validate_simulation(config: &HmaxConfig, errors: &mut Vec<ConfigValidationError>) {
    positive("simulation.sim_time_ms", config.simulation.sim_time_ms, errors);
    if config.simulation.threads == 0 {
        errors.push(ConfigValidationError::OutOfRange {
            field: "simulation.threads".to_string(),
            reason: "at least one thread is required".to_string(),
        });
    }
}

fn validate_s2(config: &HmaxConfig, errors: &mut Vec<ConfigValidationError>) {
    let s2 = &config.s2;
    if s2.feature_size == 0 {
        errors.push(ConfigValidationError::OutOfRange {
            field: "s2.feature_size".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if s2.prototype_cells == 0 {
        errors.push(ConfigValidationError::OutOfRange {
            field: "s2.prototype_cells".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    positive("s2.refractory_ms", s2.refractory_ms, errors);
    positive("s2.threshold", s2.threshold, errors);
    if s2.weight_init_low > s2.weight_init_high {
        errors.push(ConfigValidationError::InconsistentBounds {
            low: "s2.weight_init_low".to_string(),
            high: "s2.weight_init_high".to_string(),
        });
    }
}

fn validate_plasticity(config: &HmaxConfig, errors: &mut Vec<ConfigValidationError>) {
    let p = &config.plasticity;
    positive("plasticity.tau_plus_ms", p.tau_plus_ms, errors);
    positive("plasticity.tau_minus_ms", p.tau_minus_ms, errors);
    if p.a_plus < 0.0 || p.a_minus < 0.0 {
        errors.push(ConfigValidationError::OutOfRange {
            field: "plasticity.a_plus/a_minus".to_string(),
            reason: "amplitudes must be non-negative".to_string(),
        });
    }
    if p.w_min > p.w_max {
        errors.push(ConfigValidationError::InconsistentBounds {
            low: "plasticity.w_min".to_string(),
            high: "plasticity.w_max".to_string(),
        });
    }
    if p.learning_rate < 0.0 {
        errors.push(ConfigValidationError::OutOfRange {
            field: "plasticity.learning_rate".to_string(),
            reason: "must be non-negative".to_string(),
        });
    }
}

fn validate_pooling(config: &HmaxConfig, errors: &mut Vec<ConfigValidationError>) {
    match config.c2.pooling.to_lowercase().as_str() {
        "max" | "sum" => {}
        other => errors.push(ConfigValidationError::InvalidValue {
            field: "c2.pooling".to_string(),
            reason: format!("expected \"max\" or \"sum\", got \"{}\"", other),
        }),
    }
}

fn validate_classifier(config: &HmaxConfig, errors: &mut Vec<ConfigValidationError>) {
    positive("classifier.c", config.classifier.c, errors);
    positive("classifier.learning_rate", config.classifier.learning_rate, errors);
    if config.classifier.epochs == 0 {
        errors.push(ConfigValidationError::OutOfRange {
            field: "classifier.epochs".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
}
