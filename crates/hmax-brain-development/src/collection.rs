// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
The staged layer collection of one run.
*/

use crate::{BduError, BduResult, C1Layers, C2Layers, Layer, S2Layers};
use std::fmt;

/// Processing stage of the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    C1,
    S2,
    C2,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::C1 => f.write_str("C1"),
            Stage::S2 => f.write_str("S2"),
            Stage::C2 => f.write_str("C2"),
        }
    }
}

/// All layers of a run, grown stage by stage.
///
/// Every C1 scale has an S2 entry, and C2 has one layer per S2 prototype.
#[derive(Debug, Clone)]
pub struct LayerCollection {
    c1: C1Layers,
    s2: Option<S2Layers>,
    c2: Option<C2Layers>,
}

impl LayerCollection {
    pub fn new(c1: C1Layers) -> Self {
        Self { c1, s2: None, c2: None }
    }

    pub fn attach_s2(&mut self, s2: S2Layers) -> BduResult<()> {
        let c1_scales: Vec<u32> = self.c1.scales().keys().copied().collect();
        let s2_scales: Vec<u32> = s2.scales().keys().copied().collect();
        if c1_scales != s2_scales {
            return Err(BduError::InvalidParameter(format!(
                "S2 scales {:?} do not match C1 scales {:?}",
                s2_scales, c1_scales
            )));
        }
        self.s2 = Some(s2);
        Ok(())
    }

    pub fn attach_c2(&mut self, c2: C2Layers) -> BduResult<()> {
        let prototypes = self
            .s2
            .as_ref()
            .map(S2Layers::prototype_count)
            .ok_or_else(|| BduError::InvalidParameter("C2 attached before S2".to_string()))?;
        if c2.len() != prototypes {
            return Err(BduError::InvalidParameter(format!(
                "{} C2 layers for {} prototypes",
                c2.len(),
                prototypes
            )));
        }
        self.c2 = Some(c2);
        Ok(())
    }

    pub fn c1(&self) -> &C1Layers {
        &self.c1
    }

    pub fn s2(&self) -> Option<&S2Layers> {
        self.s2.as_ref()
    }

    pub fn c2(&self) -> Option<&C2Layers> {
        self.c2.as_ref()
    }

    /// Layers of one stage, in scale then creation order
    pub fn layers(&self, stage: Stage) -> Vec<&Layer> {
        match stage {
            Stage::C1 => self.c1.layers().map(|(_, l)| l).collect(),
            Stage::S2 => self
                .s2
                .iter()
                .flat_map(|s2| s2.layers().map(|(_, l)| l))
                .collect(),
            Stage::C2 => self.c2.iter().flat_map(|c2| c2.layers()).collect(),
        }
    }
}
