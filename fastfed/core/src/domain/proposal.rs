// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Contract Proposal
//!
//! A time-bounded offer of a [`Contract`] awaiting the peer's decision.
//!
//! ```text
//!              ┌──accept()──▶ Accepted
//!              │
//! Proposed ────┼──reject()──▶ Rejected
//!    │  ▲      │
//!    │  │      └─withdraw()─▶ Withdrawn
//!    └──┘
//!  extend_expiration()
//! ```
//!
//! Accepted, rejected and withdrawn are terminal: any further transition is
//! [`FastFedError::InvalidChange`]. Expiration is advisory;
//! [`ContractProposal::is_expired_at`] never changes the status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::info;

use crate::domain::config::FastFedConfiguration;
use crate::domain::contract::Contract;
use crate::domain::errors::{ErrorAccumulator, FastFedError, FieldRule, Result};
use crate::domain::events::ContractProposalEvent;
use crate::domain::keys;
use crate::domain::metadata::{hydrate_nested, require, require_nested, Metadata, Recognized};
use crate::domain::tree::{as_tree, hash_tree, put_string, put_tree, read_i64, read_string, JsonTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Proposed,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 4] = [
        ProposalStatus::Proposed,
        ProposalStatus::Accepted,
        ProposalStatus::Rejected,
        ProposalStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(value: &str) -> Recognized<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .map(Recognized::Known)
            .unwrap_or_else(|| Recognized::Unknown(value.to_string()))
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Proposed)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ContractProposal {
    config: Arc<FastFedConfiguration>,
    pub status: Option<Recognized<ProposalStatus>>,
    /// Unix seconds.
    pub expiration_date: Option<i64>,
    pub contract: Option<Contract>,
}

impl ContractProposal {
    /// An empty proposal, ready to be hydrated.
    pub fn new(config: Arc<FastFedConfiguration>) -> Self {
        Self {
            config,
            status: None,
            expiration_date: None,
            contract: None,
        }
    }

    /// Offer `contract` until `expires_at`.
    pub fn propose(contract: Contract, expires_at: DateTime<Utc>) -> (Self, ContractProposalEvent) {
        let proposal = Self {
            config: contract.config().clone(),
            status: Some(Recognized::Known(ProposalStatus::Proposed)),
            expiration_date: Some(expires_at.timestamp()),
            contract: Some(contract),
        };
        let (identity_provider, application_provider) = proposal.parties();
        info!(
            identity_provider = ?identity_provider,
            application_provider = ?application_provider,
            expiration_date = expires_at.timestamp(),
            "Contract proposed"
        );
        let event = ContractProposalEvent::Proposed {
            identity_provider,
            application_provider,
            expiration_date: expires_at.timestamp(),
            proposed_at: Utc::now(),
        };
        (proposal, event)
    }

    /// Hydrate from a `{"contract_proposal": {...}}` document. Does not validate.
    pub fn from_document(config: Arc<FastFedConfiguration>, document: &Value) -> Result<Self> {
        let mut proposal = Self::new(config);
        proposal.hydrate(document.get(keys::CONTRACT_PROPOSAL).unwrap_or(&Value::Null))?;
        Ok(proposal)
    }

    pub fn to_document(&self) -> Value {
        let mut document = JsonTree::new();
        document.insert(keys::CONTRACT_PROPOSAL.to_string(), Value::Object(self.to_tree()));
        Value::Object(document)
    }

    /// The recognized status, if any.
    pub fn current_status(&self) -> Option<ProposalStatus> {
        self.status.as_ref().and_then(Recognized::known).copied()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiration_date
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
    }

    /// Whether the proposal had expired at `now`. A proposal without an
    /// expiration date never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date
            .is_some_and(|expiration| now.timestamp() >= expiration)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn accept(&mut self) -> Result<ContractProposalEvent> {
        self.finish(ProposalStatus::Accepted)
    }

    pub fn reject(&mut self) -> Result<ContractProposalEvent> {
        self.finish(ProposalStatus::Rejected)
    }

    pub fn withdraw(&mut self) -> Result<ContractProposalEvent> {
        self.finish(ProposalStatus::Withdrawn)
    }

    /// Push the expiration date to `expires_at`, which must be later than the current one.
    pub fn extend_expiration(&mut self, expires_at: DateTime<Utc>) -> Result<ContractProposalEvent> {
        self.ensure_proposed("extend the expiration of")?;
        let expiration_date = expires_at.timestamp();
        if self.expiration_date.is_some_and(|current| expiration_date <= current) {
            return Err(FastFedError::InvalidChange(format!(
                "new expiration date {expiration_date} is not later than the current one"
            )));
        }

        let previous_expiration_date = self.expiration_date.replace(expiration_date);
        let (identity_provider, application_provider) = self.parties();
        info!(
            expiration_date = expiration_date,
            "Contract proposal expiration extended"
        );
        Ok(ContractProposalEvent::ExpirationExtended {
            identity_provider,
            application_provider,
            previous_expiration_date,
            expiration_date,
            extended_at: Utc::now(),
        })
    }

    fn ensure_proposed(&self, action: &str) -> Result<()> {
        match &self.status {
            Some(Recognized::Known(ProposalStatus::Proposed)) => Ok(()),
            Some(Recognized::Known(status)) => Err(FastFedError::InvalidChange(format!(
                "cannot {action} a contract proposal that is already {status}"
            ))),
            Some(Recognized::Unknown(status)) => Err(FastFedError::InvalidChange(format!(
                "cannot {action} a contract proposal with unrecognized status '{status}'"
            ))),
            None => Err(FastFedError::InvalidChange(format!(
                "cannot {action} a contract proposal without a status"
            ))),
        }
    }

    fn finish(&mut self, status: ProposalStatus) -> Result<ContractProposalEvent> {
        let action = match status {
            ProposalStatus::Accepted => "accept",
            ProposalStatus::Rejected => "reject",
            ProposalStatus::Withdrawn => "withdraw",
            ProposalStatus::Proposed => {
                return Err(FastFedError::Internal(
                    "proposed is not a terminal status".to_string(),
                ))
            }
        };
        self.ensure_proposed(action)?;
        self.status = Some(Recognized::Known(status));

        let (identity_provider, application_provider) = self.parties();
        info!(
            identity_provider = ?identity_provider,
            application_provider = ?application_provider,
            status = %status,
            "Contract proposal {}", status
        );

        let now = Utc::now();
        Ok(match status {
            ProposalStatus::Accepted => ContractProposalEvent::Accepted {
                identity_provider,
                application_provider,
                accepted_at: now,
            },
            ProposalStatus::Rejected => ContractProposalEvent::Rejected {
                identity_provider,
                application_provider,
                rejected_at: now,
            },
            _ => ContractProposalEvent::Withdrawn {
                identity_provider,
                application_provider,
                withdrawn_at: now,
            },
        })
    }

    fn parties(&self) -> (Option<String>, Option<String>) {
        let contract = self.contract.as_ref();
        (
            contract
                .and_then(Contract::identity_provider_entity_id)
                .map(str::to_string),
            contract
                .and_then(Contract::application_provider_entity_id)
                .map(str::to_string),
        )
    }
}

impl Metadata for ContractProposal {
    fn hydrate(&mut self, tree: &Value) -> Result<()> {
        let Some(tree) = as_tree(tree) else {
            return Ok(());
        };
        if let Some(status) = read_string(tree, keys::STATUS) {
            self.status = Some(ProposalStatus::parse(&status));
        }
        if let Some(expiration_date) = read_i64(tree, keys::EXPIRATION_DATE) {
            self.expiration_date = Some(expiration_date);
        }
        let config = self.config.clone();
        hydrate_nested(tree, keys::CONTRACT, &mut self.contract, || Contract::new(config))
    }

    fn validate(&self, errors: &mut ErrorAccumulator) {
        match &self.status {
            None => errors.add(keys::STATUS, FieldRule::Required),
            Some(Recognized::Unknown(value)) => {
                errors.add(keys::STATUS, FieldRule::Unrecognized(value.clone()))
            }
            Some(Recognized::Known(_)) => {}
        }
        require(errors, keys::EXPIRATION_DATE, &self.expiration_date);
        require_nested(errors, keys::CONTRACT, &self.contract);
    }

    fn to_tree(&self) -> JsonTree {
        let mut tree = JsonTree::new();
        let status = self.status.as_ref().map(|status| match status {
            Recognized::Known(status) => status.as_str().to_string(),
            Recognized::Unknown(value) => value.clone(),
        });
        put_string(&mut tree, keys::STATUS, &status);
        if let Some(expiration_date) = self.expiration_date {
            tree.insert(keys::EXPIRATION_DATE.to_string(), Value::from(expiration_date));
        }
        put_tree(
            &mut tree,
            keys::CONTRACT,
            self.contract.as_ref().map(|contract| contract.to_tree()),
        );
        tree
    }
}

impl PartialEq for ContractProposal {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status
            && self.expiration_date == other.expiration_date
            && self.contract == other.contract
    }
}

impl Eq for ContractProposal {}

impl Hash for ContractProposal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_tree(&self.to_tree(), state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn config() -> Arc<FastFedConfiguration> {
        FastFedConfiguration::builder().build().unwrap()
    }

    fn proposal() -> ContractProposal {
        let (proposal, _) = ContractProposal::propose(
            Contract::new(config()),
            Utc::now() + Duration::hours(1),
        );
        proposal
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    #[test]
    fn test_proposed_accepts_exactly_one_transition() {
        type Transition = fn(&mut ContractProposal) -> Result<ContractProposalEvent>;
        let transitions: [(Transition, ProposalStatus); 3] = [
            (ContractProposal::accept, ProposalStatus::Accepted),
            (ContractProposal::reject, ProposalStatus::Rejected),
            (ContractProposal::withdraw, ProposalStatus::Withdrawn),
        ];
        for (first, expected) in transitions {
            let mut proposal = proposal();
            let event = first(&mut proposal).unwrap();
            assert_eq!(event.name(), expected.as_str());
            assert_eq!(proposal.current_status(), Some(expected));

            for (second, _) in transitions {
                assert!(matches!(
                    second(&mut proposal),
                    Err(FastFedError::InvalidChange(_))
                ));
            }
            assert!(proposal
                .extend_expiration(Utc::now() + Duration::days(7))
                .is_err());
            assert_eq!(proposal.current_status(), Some(expected));
        }
    }

    #[test]
    fn test_accepted_proposal_rejects_reject() {
        let mut proposal = proposal();
        proposal.accept().unwrap();
        let err = proposal.reject().unwrap_err();
        assert!(err.to_string().contains("already accepted"));
    }

    #[test]
    fn test_unknown_status_cannot_transition() {
        let mut proposal = ContractProposal::new(config());
        proposal.hydrate(&json!({"status": "pending"})).unwrap();
        assert!(matches!(proposal.accept(), Err(FastFedError::InvalidChange(_))));
        assert_eq!(proposal.to_tree()["status"], json!("pending"));
    }

    // ── Expiration ──────────────────────────────────────────────────────

    #[test]
    fn test_is_expired_is_pure() {
        let proposal = proposal();
        let expiration = proposal.expires_at().unwrap();
        assert!(!proposal.is_expired_at(expiration - Duration::seconds(1)));
        assert!(proposal.is_expired_at(expiration));
        assert!(proposal.is_expired_at(expiration + Duration::days(1)));
        assert_eq!(proposal.current_status(), Some(ProposalStatus::Proposed));
    }

    #[test]
    fn test_extend_expiration_must_move_forward() {
        let mut proposal = proposal();
        let current = proposal.expires_at().unwrap();
        assert!(proposal.extend_expiration(current).is_err());

        let event = proposal.extend_expiration(current + Duration::hours(1)).unwrap();
        match event {
            ContractProposalEvent::ExpirationExtended {
                previous_expiration_date,
                expiration_date,
                ..
            } => {
                assert_eq!(previous_expiration_date, Some(current.timestamp()));
                assert_eq!(expiration_date, current.timestamp() + 3600);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    // ── Wire form ───────────────────────────────────────────────────────

    #[test]
    fn test_missing_fields_are_all_reported() {
        let proposal = ContractProposal::new(config());
        let err = proposal.check().unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["status", "expiration_date", "contract"]);
    }

    #[test]
    fn test_document_roundtrip() {
        let document = json!({
            "contract_proposal": {
                "status": "withdrawn",
                "expiration_date": 1_700_000_000,
                "contract": {
                    "signing_algorithms": ["RS256"],
                    "enabled_profiles": {
                        "authentication_profiles": [],
                        "provisioning_profiles": []
                    }
                }
            }
        });
        let proposal = ContractProposal::from_document(config(), &document).unwrap();
        assert_eq!(proposal.current_status(), Some(ProposalStatus::Withdrawn));
        assert_eq!(proposal.to_document(), document);
    }
}
