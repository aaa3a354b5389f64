// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Propose Contract Use Case
//!
//! Application service that opens a contract proposal between two providers.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Orchestrate loading, negotiation and proposal creation
//! - **Collaborators:**
//!   - Application: MetadataService, CapabilityNegotiator
//!   - Domain: ContractProposal, ContractProposalEvent
//!
//! # Flow
//!
//! 1. Load and validate the identity provider document
//! 2. Load and validate the application provider document
//! 3. Negotiate the contract (all declared profiles, or an explicit request)
//! 4. Open a proposal expiring after the configured TTL
//! 5. Return the proposal with its `Proposed` event
//!
//! # Error Handling
//!
//! - MalformedMetadata: either document failed validation
//! - IncompatibleProviders: a requested profile or a signing algorithm is not shared
//! - Security: the agreed signing algorithms include a disallowed one

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use crate::application::metadata_service::MetadataService;
use crate::application::negotiation::CapabilityNegotiator;
use crate::domain::config::FastFedConfiguration;
use crate::domain::errors::{FastFedError, Result};
use crate::domain::events::ContractProposalEvent;
use crate::domain::proposal::ContractProposal;

/// A freshly opened proposal and the event recording it.
#[derive(Debug, Clone)]
pub struct ProposedContract {
    pub proposal: ContractProposal,
    pub event: ContractProposalEvent,
}

/// Propose Contract Use Case
pub trait ProposeContractUseCase: Send + Sync {
    /// Propose a contract enabling every profile either side declares.
    ///
    /// # Arguments
    ///
    /// * `identity_provider` - `{"identity_provider": {...}}` document
    /// * `application_provider` - `{"application_provider": {...}}` document
    fn propose_contract(
        &self,
        identity_provider: &Value,
        application_provider: &Value,
    ) -> Result<ProposedContract>;

    /// Propose a contract enabling exactly `requested`.
    fn propose_contract_with_profiles(
        &self,
        identity_provider: &Value,
        application_provider: &Value,
        requested: &[&str],
    ) -> Result<ProposedContract>;
}

/// Standard implementation of ProposeContractUseCase
pub struct StandardProposeContractUseCase {
    config: Arc<FastFedConfiguration>,
    metadata_service: MetadataService,
    negotiator: CapabilityNegotiator,
}

impl StandardProposeContractUseCase {
    pub fn new(config: Arc<FastFedConfiguration>) -> Self {
        Self {
            metadata_service: MetadataService::new(config.clone()),
            negotiator: CapabilityNegotiator::new(config.clone()),
            config,
        }
    }

    fn propose(
        &self,
        identity_provider: &Value,
        application_provider: &Value,
        requested: Option<&[&str]>,
    ) -> Result<ProposedContract> {
        let identity_provider = Arc::new(
            self.metadata_service
                .load_identity_provider(identity_provider)?,
        );
        let application_provider = Arc::new(
            self.metadata_service
                .load_application_provider(application_provider)?,
        );

        let contract = match requested {
            Some(requested) => self.negotiator.negotiate_profiles(
                identity_provider,
                application_provider,
                requested.iter().copied(),
            )?,
            None => self
                .negotiator
                .negotiate(identity_provider, application_provider)?,
        };

        let ttl = self.config.contract_proposal_ttl();
        let expires_at = Utc::now().checked_add_signed(ttl).ok_or_else(|| {
            FastFedError::Internal(format!(
                "contract proposal TTL of {} seconds overflows the expiration date",
                ttl.num_seconds()
            ))
        })?;
        let (proposal, event) = ContractProposal::propose(contract, expires_at);
        Ok(ProposedContract { proposal, event })
    }
}

impl ProposeContractUseCase for StandardProposeContractUseCase {
    fn propose_contract(
        &self,
        identity_provider: &Value,
        application_provider: &Value,
    ) -> Result<ProposedContract> {
        self.propose(identity_provider, application_provider, None)
    }

    fn propose_contract_with_profiles(
        &self,
        identity_provider: &Value,
        application_provider: &Value,
        requested: &[&str],
    ) -> Result<ProposedContract> {
        self.propose(identity_provider, application_provider, Some(requested))
    }
}
