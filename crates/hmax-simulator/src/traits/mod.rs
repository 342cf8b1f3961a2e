// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

mod simulator;

pub use simulator::Simulator;
