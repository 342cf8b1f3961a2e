// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! STDP parameters for S2 connections
//!
//! The update rule itself runs inside the simulator. This module turns the
//! `[plasticity]` configuration section into [`StdpParams`] and rejects
//! parameter sets no backend can use.

use crate::{PlasticityError, PlasticityResult};
use hmax_config::PlasticityConfig;
use hmax_simulator::StdpParams;

/// Build STDP parameters from configuration
pub fn stdp_params(config: &PlasticityConfig) -> PlasticityResult<StdpParams> {
    let params = StdpParams {
        tau_plus_ms: config.tau_plus_ms,
        tau_minus_ms: config.tau_minus_ms,
        a_plus: config.a_plus,
        a_minus: config.a_minus,
        w_min: config.w_min,
        w_max: config.w_max,
        learning_rate: config.learning_rate,
    };
    validate_stdp_params(&params)?;
    Ok(params)
}

/// Check time constants, amplitudes and weight bounds
pub fn validate_stdp_params(params: &StdpParams) -> PlasticityResult<()> {
    let positive = |name: &str, value: f64| {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(PlasticityError::InvalidParams(format!(
                "{} must be positive, got {}",
                name, value
            )))
        }
    };
    let non_negative = |name: &str, value: f32| {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(PlasticityError::InvalidParams(format!(
                "{} must be non-negative, got {}",
                name, value
            )))
        }
    };

    positive("tau_plus_ms", params.tau_plus_ms)?;
    positive("tau_minus_ms", params.tau_minus_ms)?;
    non_negative("a_plus", params.a_plus)?;
    non_negative("a_minus", params.a_minus)?;
    non_negative("learning_rate", params.learning_rate)?;

    if !(params.w_min.is_finite() && params.w_max.is_finite() && params.w_min <= params.w_max) {
        return Err(PlasticityError::InvalidParams(format!(
            "weight bounds [{}, {}] are empty",
            params.w_min, params.w_max
        )));
    }
    Ok(())
}
