// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-crate debug flags
//!
//! `--debug-hmax-plasticity` and its short form `--debug-plasticity` both
//! raise the `hmax-plasticity` tracing target to `debug`.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Crates whose tracing target is raised to `debug`
///
/// # Example
/// ```rust
/// use hmax_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(std::env::args());
/// if flags.is_enabled("bdu") {
///     // debug logging for topology construction
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrateDebugFlags {
    /// Canonical target names
    pub enabled_crates: BTreeSet<String>,
}

/// `plasticity` -> `hmax-plasticity`; unknown names pass through unchanged
pub fn canonical_crate_name(name: &str) -> String {
    let prefixed = format!("hmax-{}", name);
    if KNOWN_CRATES.contains(&prefixed.as_str()) {
        prefixed
    } else {
        name.to_string()
    }
}

impl CrateDebugFlags {
    /// Collect `--debug-<crate>` arguments; `--debug-all` enables every known crate.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            match arg.strip_prefix("--debug-") {
                Some("all") => flags.enable_all(),
                Some(name) => flags.enable(name),
                None => {}
            }
        }
        flags
    }

    pub fn enable(&mut self, crate_name: &str) {
        self.enabled_crates.insert(canonical_crate_name(crate_name));
    }

    pub fn enable_all(&mut self) {
        self.enabled_crates
            .extend(KNOWN_CRATES.iter().map(|c| c.to_string()));
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(&canonical_crate_name(crate_name))
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `tracing::Level::DEBUG` if enabled, `tracing::Level::INFO` otherwise.
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Filter string for `EnvFilter` with `info` as the default level.
    ///
    /// Format: "hmax-bdu=debug,hmax-plasticity=debug,info".
    pub fn to_filter_string(&self) -> String {
        self.to_filter_string_with("info")
    }

    /// Filter string for `EnvFilter` with a custom default level
    pub fn to_filter_string_with(&self, base_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name))
            .collect();
        filters.push(base_level.to_lowercase());
        filters.join(",")
    }
}

/// Parse debug flags from the process arguments and `HMAX_DEBUG`.
///
/// `HMAX_DEBUG` holds comma-separated crate names, or `all`.
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var("HMAX_DEBUG") {
        for name in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            if name == "all" {
                flags.enable_all();
            } else {
                flags.enable(name);
            }
        }
    }
    flags
}

/// Remove `--debug-*` arguments so the rest can go to clap
pub fn strip_debug_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .filter(|arg| !arg.starts_with("--debug-"))
        .collect()
}

/// Help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug logging:
  --debug-all              every crate below
  --debug-<crate>          one crate; the hmax- prefix may be omitted
  HMAX_DEBUG=<crate>,...   same, from the environment (or HMAX_DEBUG=all)

Crates:
  {}
"#,
        KNOWN_CRATES.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_names() {
        let flags = CrateDebugFlags::from_args(vec![
            "--debug-hmax-bdu".to_string(),
            "--debug-classifier".to_string(),
        ]);
        assert!(flags.is_enabled("hmax-bdu"));
        assert!(flags.is_enabled("bdu"));
        assert!(flags.is_enabled("hmax-classifier"));
        assert!(!flags.is_enabled("hmax-plasticity"));
        assert_eq!(flags.enabled_crates.len(), 2);
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        assert_eq!(flags.enabled_crates.len(), KNOWN_CRATES.len());
        assert!(flags.is_enabled("pipeline"));
    }

    #[test]
    fn test_unknown_crate_passes_through() {
        assert_eq!(canonical_crate_name("serialization"), "hmax-serialization");
        assert_eq!(canonical_crate_name("ndarray"), "ndarray");
    }

    #[test]
    fn test_filter_string() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-plasticity".to_string()]);
        assert_eq!(flags.to_filter_string(), "hmax-plasticity=debug,info");
        assert_eq!(
            flags.to_filter_string_with("WARN"),
            "hmax-plasticity=debug,warn"
        );
        assert_eq!(CrateDebugFlags::default().to_filter_string(), "info");
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-hmax-bdu".to_string()]);
        assert_eq!(flags.log_level("hmax-bdu"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("hmax-classifier"), tracing::Level::INFO);
    }

    #[test]
    fn test_strip_debug_args() {
        let args = vec![
            "hmax-s2-train".to_string(),
            "--debug-all".to_string(),
            "--image-count".to_string(),
            "5".to_string(),
        ];
        assert_eq!(
            strip_debug_args(args),
            vec!["hmax-s2-train", "--image-count", "5"]
        );
    }
}
