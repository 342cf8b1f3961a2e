// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Coordination role of this process in a (possibly distributed) simulation
//!
//! The role is resolved once at startup from the launcher environment and
//! passed explicitly to every component doing singleton I/O (checkpoints,
//! reconstructions, plots, reports).

use crate::{SimulatorError, SimulatorResult};
use std::fmt;
use tracing::info;

/// Rank of the process that performs singleton I/O
pub const ROOT_RANK: u32 = 0;

/// `(rank, size)` variable pairs, in lookup order
const RANK_ENVIRONMENTS: [(&str, &str); 3] = [
    ("HMAX_RANK", "HMAX_SIZE"),
    ("OMPI_COMM_WORLD_RANK", "OMPI_COMM_WORLD_SIZE"),
    ("PMI_RANK", "PMI_SIZE"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinationRole {
    Root { world_size: u32 },
    Worker { rank: u32, world_size: u32 },
}

impl CoordinationRole {
    /// A single-process run
    pub const fn single_process() -> Self {
        CoordinationRole::Root { world_size: 1 }
    }

    /// Resolve the role from the process environment
    pub fn resolve() -> SimulatorResult<Self> {
        let role = Self::resolve_from(|key| std::env::var(key).ok())?;
        info!(target: "hmax-simulator", "Coordination role: {}", role);
        Ok(role)
    }

    /// Resolve the role from an arbitrary variable lookup.
    ///
    /// No rank variable means a single-process root. A rank without a size,
    /// an unparseable value or a rank outside the world is a
    /// [`SimulatorError::ChannelFailure`].
    pub fn resolve_from<F>(lookup: F) -> SimulatorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some((rank_var, size_var, rank)) = RANK_ENVIRONMENTS
            .iter()
            .find_map(|(rank_var, size_var)| lookup(rank_var).map(|r| (*rank_var, *size_var, r)))
        else {
            return Ok(Self::single_process());
        };

        let parse = |var: &str, value: &str| {
            value.trim().parse::<u32>().map_err(|_| {
                SimulatorError::ChannelFailure(format!("{}='{}' is not a valid integer", var, value))
            })
        };

        let rank = parse(rank_var, &rank)?;
        let world_size = match lookup(size_var) {
            Some(size) => parse(size_var, &size)?,
            None => {
                return Err(SimulatorError::ChannelFailure(format!(
                    "{} is set but {} is missing",
                    rank_var, size_var
                )))
            }
        };

        if rank >= world_size {
            return Err(SimulatorError::ChannelFailure(format!(
                "rank {} is outside a world of size {}",
                rank, world_size
            )));
        }

        Ok(if rank == ROOT_RANK {
            CoordinationRole::Root { world_size }
        } else {
            CoordinationRole::Worker { rank, world_size }
        })
    }

    pub fn is_root(&self) -> bool {
        matches!(self, CoordinationRole::Root { .. })
    }

    pub fn rank(&self) -> u32 {
        match self {
            CoordinationRole::Root { .. } => ROOT_RANK,
            CoordinationRole::Worker { rank, .. } => *rank,
        }
    }

    pub fn world_size(&self) -> u32 {
        match self {
            CoordinationRole::Root { world_size } | CoordinationRole::Worker { world_size, .. } => {
                *world_size
            }
        }
    }
}

impl fmt::Display for CoordinationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinationRole::Root { world_size } => write!(f, "root (world size {})", world_size),
            CoordinationRole::Worker { rank, world_size } => {
                write!(f, "worker {} (world size {})", rank, world_size)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_absent_environment_is_single_root() {
        let role = CoordinationRole::resolve_from(env(&[])).unwrap();
        assert_eq!(role, CoordinationRole::single_process());
        assert!(role.is_root());
    }

    #[test]
    fn test_openmpi_worker() {
        let role = CoordinationRole::resolve_from(env(&[
            ("OMPI_COMM_WORLD_RANK", "2"),
            ("OMPI_COMM_WORLD_SIZE", "4"),
        ]))
        .unwrap();
        assert_eq!(role, CoordinationRole::Worker { rank: 2, world_size: 4 });
        assert!(!role.is_root());
        assert_eq!(role.rank(), 2);
    }

    #[test]
    fn test_explicit_variables_take_precedence() {
        let role = CoordinationRole::resolve_from(env(&[
            ("HMAX_RANK", "0"),
            ("HMAX_SIZE", "2"),
            ("PMI_RANK", "1"),
            ("PMI_SIZE", "2"),
        ]))
        .unwrap();
        assert_eq!(role, CoordinationRole::Root { world_size: 2 });
    }

    #[test]
    fn test_inconsistent_environment_fails() {
        for pairs in [
            vec![("PMI_RANK", "x"), ("PMI_SIZE", "2")],
            vec![("PMI_RANK", "1")],
            vec![("PMI_RANK", "3"), ("PMI_SIZE", "3")],
        ] {
            let result = CoordinationRole::resolve_from(env(&pairs));
            assert!(
                matches!(result, Err(SimulatorError::ChannelFailure(_))),
                "{:?} should fail",
                pairs
            );
        }
    }
}
