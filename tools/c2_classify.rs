// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! hmax-c2-classify - score every checkpointed S2 weight snapshot with a
//! linear SVM over C2 responses

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use hmax::config::{validate_config, SimulationConfig};
use hmax::observability::{
    debug_flags_help, init_logging, parse_debug_flags, strip_debug_args, LoggingOptions,
};
use hmax::prelude::*;

/// Classify C2 responses of a trained S2 layer for every weight checkpoint
#[derive(Parser, Debug)]
#[command(name = "hmax-c2-classify", version, author, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// C1 spike dump of the training images
    #[arg(long)]
    training_c1_dumpfile: PathBuf,

    /// C1 spike dump of the validation images
    #[arg(long)]
    validation_c1_dumpfile: PathBuf,

    #[arg(long)]
    training_image_count: usize,

    #[arg(long)]
    validation_image_count: usize,

    /// Labels of the training images, one per line
    #[arg(long)]
    training_labels: PathBuf,

    /// Labels of the validation images, one per line
    #[arg(long)]
    validation_labels: PathBuf,

    /// Checkpoint file written by hmax-s2-train (relative to `simulation.data_dir`)
    #[arg(long)]
    weights_from: PathBuf,

    /// Report destination (default: stdout)
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// Simulated time per image in ms (default: 50)
    #[arg(long)]
    sim_time: Option<f64>,

    /// Worker threads (default: 1)
    #[arg(long)]
    threads: Option<usize>,

    /// C2 pooling operation, max or sum (default: max)
    #[arg(long)]
    pooling: Option<String>,

    /// Configuration file (default: search for hmax_configuration.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(sim_time) = self.sim_time {
            overrides.insert("sim_time".to_string(), sim_time.to_string());
        }
        if let Some(threads) = self.threads {
            overrides.insert("threads".to_string(), threads.to_string());
        }
        if let Some(pooling) = &self.pooling {
            overrides.insert("pooling".to_string(), pooling.clone());
        }
        overrides
    }
}

fn load_dump(path: &Path) -> Result<C1SpikeDump> {
    let dump = load_c1_dump(path)
        .with_context(|| format!("Failed to load C1 spikes from {}", path.display()))?;
    dump.validate()
        .with_context(|| format!("Malformed C1 spike dump {}", path.display()))?;
    Ok(dump)
}

fn load_label_file(path: &Path) -> Result<Vec<String>> {
    load_labels(path).with_context(|| format!("Failed to read labels from {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse_from(strip_debug_args(std::env::args()));
    let debug_flags = parse_debug_flags();

    let (config, config_file) = load_config_or_default(args.config.as_deref(), Some(&args.overrides()))
        .context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;
    let logging = LoggingOptions {
        level: config.logging.level.clone(),
        log_dir: config
            .logging
            .file_logging
            .then(|| config.logging.log_dir.clone()),
        retention_days: config.logging.retention_days,
        ..LoggingOptions::default()
    };
    let _log_guard = init_logging(&debug_flags, &logging)?;
    match &config_file {
        Some(path) => info!(target: "hmax-pipeline", "Configuration loaded from {}", path.display()),
        None => info!(target: "hmax-pipeline", "No configuration file found, using defaults"),
    }

    let role = CoordinationRole::resolve().context("Failed to resolve the coordination role")?;
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.simulation.threads)
        .build_global()
        .context("Failed to size the worker thread pool")?;

    let plan = ClassificationPlan::from_config(&config)?;
    run(&args, &config.simulation, &plan, role)
}

fn run(args: &Args, sim_config: &SimulationConfig, plan: &ClassificationPlan, role: CoordinationRole) -> Result<()> {
    let training_dump = load_dump(&sim_config.input_path(&args.training_c1_dumpfile))?;
    let validation_dump = load_dump(&sim_config.input_path(&args.validation_c1_dumpfile))?;
    let training_labels = load_label_file(&sim_config.input_path(&args.training_labels))?;
    let validation_labels = load_label_file(&sim_config.input_path(&args.validation_labels))?;

    let weights_from = sim_config.input_path(&args.weights_from);
    let snapshots = load_weight_checkpoints(&weights_from)
        .with_context(|| format!("Failed to load weights from {}", weights_from.display()))?;
    info!(
        target: "hmax-pipeline",
        "Loaded {} weight snapshots from {}",
        snapshots.len(),
        weights_from.display()
    );

    let mut sim = ReferenceSimulator::new();
    let layers = build_validation_network(&mut sim, &training_dump, &snapshots, plan)
        .context("Failed to build the C1/S2/C2 network")?;

    let mut report: Box<dyn Write> = match &args.logfile {
        Some(path) if role.is_root() => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        _ => Box::new(io::stdout().lock()),
    };

    let training = LabeledDump {
        dump: &training_dump,
        labels: &training_labels,
        image_count: args.training_image_count,
    };
    let validation = LabeledDump {
        dump: &validation_dump,
        labels: &validation_labels,
        image_count: args.validation_image_count,
    };
    for snapshot in &snapshots {
        let evaluation = evaluate_snapshot(&mut sim, &layers, snapshot, training, validation, plan)
            .with_context(|| format!("Classification of epoch {} failed", snapshot.epoch))?;
        if role.is_root() {
            write!(report, "{}", evaluation)?;
            report.flush()?;
        }
    }
    Ok(())
}
