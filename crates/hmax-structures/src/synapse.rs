// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of one directed C1 → S2 connection.
///
/// The key does not depend on simulator handles, so weights saved by one run
/// can be matched against a topology rebuilt by another run from the same
/// C1 shapes, labels and feature size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SynapseId {
    /// C1 scale the connection belongs to
    pub scale: u32,
    /// Label of the presynaptic C1 layer (orientation identifier)
    pub source: String,
    /// Presynaptic unit index inside the C1 layer
    pub pre: u32,
    /// Postsynaptic unit index inside the S2 layer
    pub post: u32,
}

impl SynapseId {
    pub fn new(scale: u32, source: impl Into<String>, pre: u32, post: u32) -> Self {
        Self {
            scale,
            source: source.into(),
            pre,
            post,
        }
    }
}

impl fmt::Display for SynapseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}:{}[{}->{}]", self.scale, self.source, self.pre, self.post)
    }
}
