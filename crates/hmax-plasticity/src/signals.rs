// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fatal-signal hook for the emergency weight dump.
//!
//! On SIGFPE, SIGILL, SIGSEGV, SIGBUS or SIGABRT the hook runs one
//! [`EmergencyDump::dump`], reports the outcome on stderr with a raw
//! `write(2)` and terminates the process with status 2. With
//! `panic = "abort"` a panic also ends here.

use crate::{DumpOutcome, EmergencyDump, PlasticityError, PlasticityResult};
use libc::c_int;
use signal_hook::consts::{SIGABRT, SIGBUS, SIGFPE, SIGILL, SIGSEGV};
use signal_hook_registry::SigId;
use std::sync::Arc;
use tracing::{debug, info};

/// Signals that trigger the emergency dump
pub const FATAL_SIGNALS: [(c_int, &str); 5] = [
    (SIGFPE, "SIGFPE"),
    (SIGILL, "SIGILL"),
    (SIGSEGV, "SIGSEGV"),
    (SIGBUS, "SIGBUS"),
    (SIGABRT, "SIGABRT"),
];

/// Exit status after a fatal signal
pub const FATAL_EXIT_STATUS: c_int = 2;

/// Keeps the hook installed; dropping it removes the hook
#[derive(Debug)]
pub struct FatalSignalGuard {
    ids: Vec<SigId>,
}

impl Drop for FatalSignalGuard {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            signal_hook_registry::unregister(id);
        }
        debug!(target: "hmax-plasticity", "Fatal-signal hook removed");
    }
}

fn write_stderr(message: &[u8]) {
    // SAFETY: write(2) is async-signal-safe and `message` outlives the call
    unsafe {
        libc::write(libc::STDERR_FILENO, message.as_ptr().cast(), message.len());
    }
}

fn on_fatal_signal(dump: &EmergencyDump) -> ! {
    let message: &[u8] = match dump.dump() {
        DumpOutcome::Written { .. } => b"hmax: fatal signal, emergency weight checkpoint written\n",
        DumpOutcome::NoSnapshot => b"hmax: fatal signal, no weights published yet, nothing dumped\n",
        DumpOutcome::Busy => b"hmax: fatal signal during a checkpoint write, last committed checkpoint kept\n",
        DumpOutcome::Failed => b"hmax: fatal signal, emergency weight checkpoint failed\n",
    };
    write_stderr(message);
    signal_hook::low_level::exit(FATAL_EXIT_STATUS)
}

/// Hook every signal in [`FATAL_SIGNALS`] to `dump`.
///
/// The handler closes over `dump`; nothing global is involved. Install it
/// on the process that owns the checkpoint file.
pub fn install_fatal_signal_hook(dump: Arc<EmergencyDump>) -> PlasticityResult<FatalSignalGuard> {
    let mut guard = FatalSignalGuard { ids: Vec::new() };
    for (signal, name) in FATAL_SIGNALS {
        let dump = Arc::clone(&dump);
        // SAFETY: the action only calls `EmergencyDump::dump` (try_lock, write,
        // fsync), write(2) and _exit(2). signal-hook refuses SIGSEGV, SIGILL and
        // SIGFPE through its checked API, hence `register_unchecked`.
        let id = unsafe {
            signal_hook_registry::register_unchecked(signal, move |_: &libc::siginfo_t| {
                on_fatal_signal(&dump);
            })
        }
        .map_err(|e| PlasticityError::SignalFault(format!("cannot hook {}: {}", name, e)))?;
        guard.ids.push(id);
    }
    info!(
        target: "hmax-plasticity",
        "Emergency weight dump armed for {}",
        FATAL_SIGNALS.map(|(_, name)| name).join(", ")
    );
    Ok(guard)
}
