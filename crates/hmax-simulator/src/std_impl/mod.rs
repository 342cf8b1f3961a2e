// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process reference backend
//!
//! Uses `Vec` storage and an `AHashMap` target index.

mod connection_array;
mod reference;

pub use connection_array::ConnectionArray;
pub use reference::ReferenceSimulator;
