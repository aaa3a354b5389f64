// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Metadata Service
//!
//! Turns raw FastFed documents into validated domain objects.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** hydrate → validate → aggregate failure
//! - **Collaborators:**
//!   - Domain: IdentityProvider, ApplicationProvider, ContractProposal
//!
//! # Error Handling
//!
//! A document that fails validation yields one
//! [`FastFedError::MalformedMetadata`] carrying every field error and the
//! offending document. A document without its wrapper key (`identity_provider`,
//! `application_provider`, `contract_proposal`) reports that key as required.
//! A contract agreeing on a disallowed signing algorithm is a
//! [`FastFedError::Security`] failure instead.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::config::FastFedConfiguration;
use crate::domain::errors::{ErrorAccumulator, FastFedError, FieldRule, Result};
use crate::domain::keys;
use crate::domain::metadata::Metadata;
use crate::domain::proposal::ContractProposal;
use crate::domain::provider::{ApplicationProvider, IdentityProvider};

pub struct MetadataService {
    config: Arc<FastFedConfiguration>,
}

impl MetadataService {
    pub fn new(config: Arc<FastFedConfiguration>) -> Self {
        Self { config }
    }

    /// Load and validate a `{"identity_provider": {...}}` document.
    pub fn load_identity_provider(&self, document: &Value) -> Result<IdentityProvider> {
        let provider = IdentityProvider::new(self.config.clone());
        self.load(keys::IDENTITY_PROVIDER, document, provider)
    }

    /// Load and validate an `{"application_provider": {...}}` document.
    pub fn load_application_provider(&self, document: &Value) -> Result<ApplicationProvider> {
        let provider = ApplicationProvider::new(self.config.clone());
        self.load(keys::APPLICATION_PROVIDER, document, provider)
    }

    /// Load and validate a `{"contract_proposal": {...}}` document.
    pub fn load_contract_proposal(&self, document: &Value) -> Result<ContractProposal> {
        let proposal = ContractProposal::new(self.config.clone());
        self.load(keys::CONTRACT_PROPOSAL, document, proposal)
    }

    fn load<M: Metadata>(&self, key: &str, document: &Value, mut target: M) -> Result<M> {
        let mut errors = ErrorAccumulator::new();
        match document.get(key).filter(|tree| tree.is_object()) {
            Some(tree) => {
                target.hydrate(tree)?;
                errors.scope(key, |errors| target.validate(errors));
            }
            None => errors.add(key, FieldRule::Required),
        }

        if errors.is_empty() {
            debug!(document = key, "Loaded FastFed metadata");
            return Ok(target);
        }

        if let Some(disallowed) = errors
            .errors()
            .iter()
            .find(|error| matches!(error.rule, FieldRule::DisallowedAlgorithm(_)))
        {
            warn!(
                document = key,
                error = %disallowed,
                "Rejected FastFed metadata agreeing on a disallowed algorithm"
            );
            return Err(FastFedError::Security(disallowed.to_string()));
        }

        warn!(
            document = key,
            error_count = errors.len(),
            "Rejected malformed FastFed metadata"
        );
        errors.into_result(Some(document.clone()))?;
        Ok(target)
    }
}
