// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod metadata_service;
pub mod negotiation;
pub mod propose_contract;

// Re-export use cases for convenience
pub use metadata_service::MetadataService;
pub use negotiation::CapabilityNegotiator;
pub use propose_contract::{ProposeContractUseCase, ProposedContract, StandardProposeContractUseCase};
