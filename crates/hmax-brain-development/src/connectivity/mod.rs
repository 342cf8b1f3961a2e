// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connectivity rules between layers.
*/

mod receptive_field;

pub use receptive_field::{s2_grid, window_connections};
