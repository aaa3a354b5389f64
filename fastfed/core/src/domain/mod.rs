// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! FastFed metadata model: providers, profiles, contracts and proposals.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure, synchronous model over in-memory metadata trees; no I/O

pub mod tree;
pub mod keys;
pub mod errors;
pub mod metadata;
pub mod config;
pub mod profile;
pub mod registry;
pub mod profiles;
pub mod desired_attributes;
pub mod provider_details;
pub mod provider;
pub mod contract;
pub mod proposal;
pub mod events;
