// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! FastFed Core
//!
//! Metadata model and capability-negotiation engine for the FastFed
//! federation handshake between an identity provider and an application
//! provider.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Hydrate, validate and serialize provider metadata; negotiate
//!   contracts and drive the contract-proposal lifecycle
//!
//! ```no_run
//! use fastfed_core::application::{ProposeContractUseCase, StandardProposeContractUseCase};
//! use fastfed_core::infrastructure::config_manifest::FastFedConfigManifest;
//!
//! # fn run(idp_document: serde_json::Value, app_document: serde_json::Value) -> anyhow::Result<()> {
//! let config = FastFedConfigManifest::load_or_default(None)?.to_configuration()?;
//! let proposed = StandardProposeContractUseCase::new(config)
//!     .propose_contract(&idp_document, &app_document)?;
//! println!("{}", proposed.proposal.to_document());
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::config::{FastFedConfiguration, FastFedConfigurationBuilder};
pub use domain::errors::{ErrorAccumulator, FastFedError, FieldError, FieldRule, Result};
pub use domain::metadata::Metadata;
pub use domain::provider::{ApplicationProvider, IdentityProvider, ProviderSide};
pub use domain::contract::{Contract, EnabledProfiles};
pub use domain::proposal::{ContractProposal, ProposalStatus};
