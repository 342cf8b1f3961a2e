// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! hmax-s2-train - learn S2 prototypes from a C1 spike dump and checkpoint
//! their weights

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use hmax::config::validate_config;
use hmax::observability::{
    debug_flags_help, init_logging, parse_debug_flags, strip_debug_args, LoggingOptions,
};
use hmax::prelude::*;
use hmax::visualization::FeatureImageDictionary;

/// Train S2 prototypes with STDP over pre-computed C1 spike trains
#[derive(Parser, Debug)]
#[command(name = "hmax-s2-train", version, author, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// C1 spike dump to replay
    #[arg(long)]
    c1_dumpfile: PathBuf,

    /// Dataset name used in output file names
    #[arg(long)]
    dataset_label: String,

    /// Number of images (trials) in the dump
    #[arg(long)]
    image_count: u64,

    /// Checkpoint file the weights are appended to (relative to `simulation.data_dir`)
    #[arg(long)]
    weights_to: PathBuf,

    /// Seed S2 from the last snapshot of this checkpoint file (relative to `simulation.data_dir`)
    #[arg(long)]
    weights_from: Option<PathBuf>,

    /// Receptive field size of S2 units (default: 3)
    #[arg(long)]
    feature_size: Option<usize>,

    /// Number of S2 prototypes (default: 3)
    #[arg(long)]
    s2_prototype_cells: Option<usize>,

    /// Refractory period of S2 units in ms (default: 0.1)
    #[arg(long)]
    refrac_s2: Option<f64>,

    /// Simulated time per image in ms (default: 50)
    #[arg(long)]
    sim_time: Option<f64>,

    /// Worker threads (default: 1)
    #[arg(long)]
    threads: Option<usize>,

    /// Seed for the initial S2 weights
    #[arg(long)]
    seed: Option<u64>,

    /// Images between periodic checkpoints, 0 = final checkpoint only (default: 10)
    #[arg(long)]
    checkpoint_interval: Option<u64>,

    /// Directory of per-orientation feature images used for reconstruction
    #[arg(long)]
    features_dir: Option<PathBuf>,

    /// Write a C1 spike-count raster per image
    #[arg(long, default_value_t = false)]
    plot_c1_spikes: bool,

    /// Write an S2 spike-count raster per image
    #[arg(long, default_value_t = false)]
    plot_s2_spikes: bool,

    /// Configuration file (default: search for hmax_configuration.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    /// Options given on the command line, keyed the way the config loader expects
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                overrides.insert(key.to_string(), value);
            }
        };
        put("feature_size", self.feature_size.map(|v| v.to_string()));
        put("s2_prototype_cells", self.s2_prototype_cells.map(|v| v.to_string()));
        put("refrac_s2", self.refrac_s2.map(|v| v.to_string()));
        put("sim_time", self.sim_time.map(|v| v.to_string()));
        put("threads", self.threads.map(|v| v.to_string()));
        put("seed", self.seed.map(|v| v.to_string()));
        put("checkpoint_interval", self.checkpoint_interval.map(|v| v.to_string()));
        put(
            "features_dir",
            self.features_dir.as_ref().map(|p| p.display().to_string()),
        );
        overrides
    }
}

fn logging_options(config: &HmaxConfig) -> LoggingOptions {
    LoggingOptions {
        level: config.logging.level.clone(),
        log_dir: config
            .logging
            .file_logging
            .then(|| config.logging.log_dir.clone()),
        retention_days: config.logging.retention_days,
        ..LoggingOptions::default()
    }
}

fn main() -> Result<()> {
    let args = Args::parse_from(strip_debug_args(std::env::args()));
    let debug_flags = parse_debug_flags();

    let (config, config_file) = load_config_or_default(args.config.as_deref(), Some(&args.overrides()))
        .context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;
    let _log_guard = init_logging(&debug_flags, &logging_options(&config))?;
    match &config_file {
        Some(path) => info!(target: "hmax-pipeline", "Configuration loaded from {}", path.display()),
        None => info!(target: "hmax-pipeline", "No configuration file found, using defaults"),
    }

    let role = CoordinationRole::resolve().context("Failed to resolve the coordination role")?;
    info!(target: "hmax-pipeline", "Running as {}", role);

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.simulation.threads)
        .build_global()
        .context("Failed to size the worker thread pool")?;

    run(&args, &config, role)
}

fn run(args: &Args, config: &HmaxConfig, role: CoordinationRole) -> Result<()> {
    let dumpfile = config.simulation.input_path(&args.c1_dumpfile);
    let weights_to = config.simulation.input_path(&args.weights_to);
    let dump = load_c1_dump(&dumpfile)
        .with_context(|| format!("Failed to load C1 spikes from {}", dumpfile.display()))?;
    dump.validate()
        .with_context(|| format!("Malformed C1 spike dump {}", dumpfile.display()))?;
    info!(
        target: "hmax-pipeline",
        "C1 spikes: {} layers over scales {:?}",
        dump.layer_count(),
        dump.scale_keys().collect::<Vec<_>>()
    );

    let initial = match &args.weights_from {
        Some(path) => {
            let path = config.simulation.input_path(path);
            let snapshots = load_weight_checkpoints(&path)
                .with_context(|| format!("Failed to load weights from {}", path.display()))?;
            let last = snapshots
                .into_iter()
                .last()
                .ok_or(PipelineError::NoSnapshots)
                .with_context(|| format!("No weights to resume from in {}", path.display()))?;
            Some(last)
        }
        None => None,
    };

    let mut plan = TrainingPlan::from_config(config, &args.dataset_label, args.image_count, &dump)?;
    if args.plot_c1_spikes || args.plot_s2_spikes {
        plan.plots = Some(RasterPlots {
            output_dir: config.plots.output_dir.clone(),
            c1: args.plot_c1_spikes,
            s2: args.plot_s2_spikes,
        });
    }
    if config.reconstruction.enabled && role.is_root() {
        let features_dir = &config.reconstruction.features_dir;
        let dictionary = FeatureImageDictionary::load_dir(features_dir).with_context(|| {
            format!("Failed to load feature images from {}", features_dir.display())
        })?;
        plan.reconstruction = Some(Reconstruction {
            dictionary,
            output_dir: config.reconstruction.output_dir.clone(),
        });
    }
    info!(target: "hmax-pipeline", "Dataset label: {}", plan.dataset_label);

    let mut sim = ReferenceSimulator::new();
    let layers = build_training_network(&mut sim, &dump, &plan, initial.as_ref())
        .context("Failed to build the C1/S2 network")?;

    let (emergency, _signal_guard) = if role.is_root() {
        let writer = WeightCheckpointWriter::open(&weights_to)
            .with_context(|| format!("Failed to open {}", weights_to.display()))?;
        let emergency = Arc::new(EmergencyDump::new(writer));
        let guard = install_fatal_signal_hook(Arc::clone(&emergency))
            .context("Failed to install the fatal-signal weight dump")?;
        (Some(emergency), Some(guard))
    } else {
        (None, None)
    };

    let mut manager = WeightLifecycleManager::new(
        role,
        CheckpointPolicy::from(&config.checkpoint),
        plan.prototype_count,
        emergency,
    );
    let weights = train(&mut sim, role, &layers, &plan, &mut manager).context("Training failed")?;

    info!(
        target: "hmax-pipeline",
        "Learned {} prototypes over {} images",
        weights.prototype_count(),
        weights.epoch
    );
    if role.is_root() {
        info!(target: "hmax-pipeline", "Weights written to {}", weights_to.display());
    }
    Ok(())
}
