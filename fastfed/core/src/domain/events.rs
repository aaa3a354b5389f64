// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contract proposal lifecycle events
///
/// Returned by every successful [`crate::domain::proposal::ContractProposal`]
/// transition. Parties are identified by their provider `entity_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractProposalEvent {
    Proposed {
        identity_provider: Option<String>,
        application_provider: Option<String>,
        expiration_date: i64,
        proposed_at: DateTime<Utc>,
    },
    Accepted {
        identity_provider: Option<String>,
        application_provider: Option<String>,
        accepted_at: DateTime<Utc>,
    },
    Rejected {
        identity_provider: Option<String>,
        application_provider: Option<String>,
        rejected_at: DateTime<Utc>,
    },
    Withdrawn {
        identity_provider: Option<String>,
        application_provider: Option<String>,
        withdrawn_at: DateTime<Utc>,
    },
    ExpirationExtended {
        identity_provider: Option<String>,
        application_provider: Option<String>,
        previous_expiration_date: Option<i64>,
        expiration_date: i64,
        extended_at: DateTime<Utc>,
    },
}

impl ContractProposalEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Proposed { .. } => "proposed",
            Self::Accepted { .. } => "accepted",
            Self::Rejected { .. } => "rejected",
            Self::Withdrawn { .. } => "withdrawn",
            Self::ExpirationExtended { .. } => "expiration_extended",
        }
    }
}
