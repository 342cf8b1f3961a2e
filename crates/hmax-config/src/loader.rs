// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, HmaxConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for by [`find_config_file`]
pub const CONFIG_FILE_NAME: &str = "hmax_configuration.toml";

/// Find the HMAX configuration file
///
/// Search order:
/// 1. `HMAX_CONFIG_PATH` environment variable
/// 2. Current working directory: `./hmax_configuration.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("HMAX_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by HMAX_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "HMAX configuration file '{}' not found in any of these locations:\n{}\n\nSet HMAX_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<HmaxConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: HmaxConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults (with overrides applied).
///
/// Returns the configuration and the file it was read from, if any. An explicit
/// `config_path` that does not exist is still an error.
pub fn load_config_or_default(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<(HmaxConfig, Option<PathBuf>)> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => match find_config_file() {
            Ok(path) => path,
            Err(ConfigError::FileNotFound(_)) if env::var_os("HMAX_CONFIG_PATH").is_none() => {
                let mut config = HmaxConfig::default();
                apply_environment_overrides(&mut config);
                if let Some(cli) = cli_args {
                    apply_cli_overrides(&mut config, cli);
                }
                return Ok((config, None));
            }
            Err(e) => return Err(e),
        },
    };
    let config = load_config(Some(&config_file), cli_args)?;
    Ok((config, Some(config_file)))
}

fn parse_into<T: std::str::FromStr>(value: &str, target: &mut T) {
    if let Ok(parsed) = value.parse::<T>() {
        *target = parsed;
    }
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `HMAX_SIM_TIME` -> `simulation.sim_time_ms`
/// - `HMAX_THREADS` -> `simulation.threads`
/// - `HMAX_DATA_DIR` -> `simulation.data_dir`
/// - `HMAX_FEATURE_SIZE` -> `s2.feature_size`
/// - `HMAX_PROTOTYPE_CELLS` -> `s2.prototype_cells`
/// - `HMAX_CHECKPOINT_INTERVAL` -> `checkpoint.interval_trials`
/// - `HMAX_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut HmaxConfig) {
    if let Ok(value) = env::var("HMAX_SIM_TIME") {
        parse_into(&value, &mut config.simulation.sim_time_ms);
    }
    if let Ok(value) = env::var("HMAX_THREADS") {
        parse_into(&value, &mut config.simulation.threads);
    }
    if let Ok(value) = env::var("HMAX_DATA_DIR") {
        config.simulation.data_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("HMAX_FEATURE_SIZE") {
        parse_into(&value, &mut config.s2.feature_size);
    }
    if let Ok(value) = env::var("HMAX_PROTOTYPE_CELLS") {
        parse_into(&value, &mut config.s2.prototype_cells);
    }
    if let Ok(value) = env::var("HMAX_CHECKPOINT_INTERVAL") {
        parse_into(&value, &mut config.checkpoint.interval_trials);
    }
    if let Ok(value) = env::var("HMAX_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"feature_size": "5", "sim_time": "100"}`)
pub fn apply_cli_overrides(config: &mut HmaxConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("sim_time") {
        parse_into(value, &mut config.simulation.sim_time_ms);
    }
    if let Some(value) = cli_args.get("threads") {
        parse_into(value, &mut config.simulation.threads);
    }
    if let Some(value) = cli_args.get("seed") {
        if let Ok(seed) = value.parse::<u64>() {
            config.simulation.seed = Some(seed);
        }
    }
    if let Some(value) = cli_args.get("feature_size") {
        parse_into(value, &mut config.s2.feature_size);
    }
    if let Some(value) = cli_args.get("s2_prototype_cells") {
        parse_into(value, &mut config.s2.prototype_cells);
    }
    if let Some(value) = cli_args.get("refrac_s2") {
        parse_into(value, &mut config.s2.refractory_ms);
    }
    if let Some(value) = cli_args.get("pooling") {
        config.c2.pooling = value.clone();
    }
    if let Some(value) = cli_args.get("checkpoint_interval") {
        parse_into(value, &mut config.checkpoint.interval_trials);
    }
    if let Some(value) = cli_args.get("features_dir") {
        config.reconstruction.features_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 7] = [
        "HMAX_SIM_TIME",
        "HMAX_THREADS",
        "HMAX_DATA_DIR",
        "HMAX_FEATURE_SIZE",
        "HMAX_PROTOTYPE_CELLS",
        "HMAX_CHECKPOINT_INTERVAL",
        "HMAX_LOG_LEVEL",
    ];

    fn clear_override_vars() {
        for var in OVERRIDE_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("HMAX_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("HMAX_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        env::set_var("HMAX_CONFIG_PATH", dir.path().join("absent.toml"));
        let result = find_config_file();
        env::remove_var("HMAX_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[s2]").unwrap();
        writeln!(file, "feature_size = 5").unwrap();
        writeln!(file, "[c2]").unwrap();
        writeln!(file, "pooling = \"sum\"").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.s2.feature_size, 5);
        assert_eq!(config.s2.prototype_cells, 3);
        assert_eq!(config.c2.pooling, "sum");
        assert_eq!(config.checkpoint.interval_trials, 10);
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[s2\nfeature_size = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = HmaxConfig::default();

        env::set_var("HMAX_SIM_TIME", "75.5");
        env::set_var("HMAX_CHECKPOINT_INTERVAL", "25");
        env::set_var("HMAX_THREADS", "not-a-number");

        apply_environment_overrides(&mut config);
        clear_override_vars();

        assert_eq!(config.simulation.sim_time_ms, 75.5);
        assert_eq!(config.checkpoint.interval_trials, 25);
        // Unparseable values leave the previous setting in place
        assert_eq!(config.simulation.threads, 1);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = HmaxConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("feature_size".to_string(), "4".to_string());
        cli_args.insert("refrac_s2".to_string(), "0.5".to_string());
        cli_args.insert("seed".to_string(), "42".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.s2.feature_size, 4);
        assert_eq!(config.s2.refractory_ms, 0.5);
        assert_eq!(config.simulation.seed, Some(42));
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[s2]").unwrap();
        writeln!(file, "feature_size = 2").unwrap();
        writeln!(file, "prototype_cells = 2").unwrap();

        env::set_var("HMAX_FEATURE_SIZE", "6");
        env::set_var("HMAX_PROTOTYPE_CELLS", "8");

        let mut cli_args = HashMap::new();
        cli_args.insert("feature_size".to_string(), "4".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();
        clear_override_vars();

        // CLI wins for feature size, env wins for prototypes (no CLI override)
        assert_eq!(config.s2.feature_size, 4);
        assert_eq!(config.s2.prototype_cells, 8);
    }

    #[test]
    fn test_load_config_or_default_with_explicit_path() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[checkpoint]\ninterval_trials = 3\n").unwrap();

        let (config, source) = load_config_or_default(Some(&config_path), None).unwrap();
        assert_eq!(config.checkpoint.interval_trials, 3);
        assert_eq!(source, Some(config_path));
    }
}
