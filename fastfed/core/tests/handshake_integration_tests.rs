// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end tests for the FastFed handshake model.
//!
//! Exercises the public API the way an integrating service would: raw JSON
//! documents in, validated providers, negotiated contracts and proposal
//! lifecycle out.

use chrono::{Duration, Utc};
use fastfed_core::application::{
    CapabilityNegotiator, MetadataService, ProposeContractUseCase, StandardProposeContractUseCase,
};
use fastfed_core::domain::config::{FastFedConfiguration, MAX_CONTRACT_PROPOSAL_TTL_DAYS};
use fastfed_core::domain::errors::{FastFedError, FieldRule, Incompatibility};
use fastfed_core::domain::events::ContractProposalEvent;
use fastfed_core::domain::metadata::Metadata;
use fastfed_core::domain::profiles::{ENTERPRISE_SAML_URN, ENTERPRISE_SCIM_URN};
use fastfed_core::domain::proposal::{ContractProposal, ProposalStatus};
use fastfed_core::domain::provider::{ApplicationProvider, IdentityProvider, ProviderSide};
use fastfed_core::Contract;
use serde_json::{json, Value};
use std::sync::Arc;

const SCIM_GRAMMAR: &str = "urn:ietf:params:fastfed:1.0:schemas:scim:2.0";

fn config() -> Arc<FastFedConfiguration> {
    FastFedConfiguration::builder().build().unwrap()
}

fn capabilities(authentication: Value, provisioning: Value) -> Value {
    json!({
        "authentication_profiles": authentication,
        "provisioning_profiles": provisioning,
        "schema_grammars": [SCIM_GRAMMAR],
        "signing_algorithms": ["RS256", "ES256"]
    })
}

fn idp_tree(authentication: Value, provisioning: Value) -> Value {
    json!({
        "entity_id": "https://idp.example.com",
        "provider_domain": "example.com",
        "provider_contact_information": {
            "organization": "Example Identity",
            "phone": "+1-800-555-0100",
            "email": "federation@example.com"
        },
        "display_settings": {
            "display_name": "Example Identity",
            "logo_uri": "https://idp.example.com/logo.png"
        },
        "capabilities": capabilities(authentication, provisioning),
        "jwks_uri": "https://idp.example.com/jwks",
        "fastfed_handshake_start_uri": "https://idp.example.com/fastfed/start"
    })
}

fn app_tree(authentication: Value, provisioning: Value) -> Value {
    let mut tree = json!({
        "entity_id": "https://app.example.net",
        "provider_domain": "example.net",
        "provider_contact_information": {
            "organization": "Example Apps",
            "email": "admin@example.net"
        },
        "display_settings": {"display_name": "Example App"},
        "capabilities": capabilities(authentication.clone(), provisioning.clone()),
        "fastfed_handshake_register_uri": "https://app.example.net/fastfed/register",
        "fastfed_handshake_finalize_uri": "https://app.example.net/fastfed/finalize"
    });
    let desired_attributes = json!({
        SCIM_GRAMMAR: {
            "required_user_attributes": ["externalId", "userName"],
            "optional_user_attributes": ["displayName"]
        }
    });
    let declared = |list: &Value, urn: &str| {
        list.as_array()
            .map(|urns| urns.iter().any(|u| u == urn))
            .unwrap_or(false)
    };
    if declared(&provisioning, ENTERPRISE_SCIM_URN) {
        tree[ENTERPRISE_SCIM_URN] = json!({
            "desired_attributes": desired_attributes.clone(),
            "can_support_nested_groups": false,
            "max_group_membership_changes": 250
        });
    }
    if declared(&authentication, ENTERPRISE_SAML_URN) {
        tree[ENTERPRISE_SAML_URN] = json!({"desired_attributes": desired_attributes});
    }
    tree
}

fn scim_only() -> (Value, Value) {
    (
        json!({"identity_provider": idp_tree(json!([]), json!([ENTERPRISE_SCIM_URN]))}),
        json!({"application_provider": app_tree(json!([]), json!([ENTERPRISE_SCIM_URN]))}),
    )
}

fn load_pair(idp: &Value, app: &Value) -> (Arc<IdentityProvider>, Arc<ApplicationProvider>) {
    let service = MetadataService::new(config());
    (
        Arc::new(service.load_identity_provider(idp).unwrap()),
        Arc::new(service.load_application_provider(app).unwrap()),
    )
}

// ── Round-trip and idempotence ──────────────────────────────────────────

#[test]
fn test_provider_roundtrip_is_stable() {
    let tree = app_tree(json!([ENTERPRISE_SAML_URN]), json!([ENTERPRISE_SCIM_URN]));
    let mut first = ApplicationProvider::new(config());
    first.hydrate(&tree).unwrap();
    assert!(first.check().is_ok());

    let serialized = Value::Object(first.to_tree());
    let mut second = ApplicationProvider::new(config());
    second.hydrate(&serialized).unwrap();

    assert_eq!(Value::Object(second.to_tree()), serialized);
    assert_eq!(first, second);
}

#[test]
fn test_hydrating_twice_yields_equal_objects() {
    let tree = idp_tree(json!([ENTERPRISE_SAML_URN]), json!([]));
    let mut first = IdentityProvider::new(config());
    first.hydrate(&tree).unwrap();
    let mut second = IdentityProvider::new(config());
    second.hydrate(&tree).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unknown_urn_still_fails_after_roundtrip() {
    let mut tree = idp_tree(json!([]), json!([ENTERPRISE_SCIM_URN]));
    tree["urn:example:unknown"] = json!({"x": 1});
    let mut first = IdentityProvider::new(config());
    first.hydrate(&tree).unwrap();
    assert!(first.check().is_err());

    let serialized = Value::Object(first.to_tree());
    assert_eq!(serialized["urn:example:unknown"], json!({"x": 1}));

    let mut second = IdentityProvider::new(config());
    second.hydrate(&serialized).unwrap();
    let err = second.check().unwrap_err();
    assert!(err.to_string().contains("urn:example:unknown"));
    assert!(err
        .field_errors()
        .iter()
        .any(|e| e.rule == FieldRule::UnrecognizedProfile("urn:example:unknown".to_string())));
}

#[test]
fn test_contract_roundtrip_through_proposal_document() {
    let (idp, app) = scim_only();
    let proposed = StandardProposeContractUseCase::new(config())
        .propose_contract(&idp, &app)
        .unwrap();

    let document = proposed.proposal.to_document();
    let reloaded = MetadataService::new(config())
        .load_contract_proposal(&document)
        .unwrap();
    assert_eq!(reloaded, proposed.proposal);
    assert_eq!(reloaded.to_document(), document);
}

// ── Validation completeness ─────────────────────────────────────────────

#[test]
fn test_each_missing_required_field_is_reported() {
    let mut tree = idp_tree(json!([]), json!([ENTERPRISE_SCIM_URN]));
    let object = tree.as_object_mut().unwrap();
    object.remove("jwks_uri");
    object.remove("provider_domain");

    let err = MetadataService::new(config())
        .load_identity_provider(&json!({"identity_provider": tree}))
        .unwrap_err();
    let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields.len(), 2);
    assert!(fields.contains(&"identity_provider.jwks_uri"));
    assert!(fields.contains(&"identity_provider.provider_domain"));
}

#[test]
fn test_empty_provider_never_panics_and_reports_everything() {
    let err = MetadataService::new(config())
        .load_application_provider(&json!({"application_provider": {}}))
        .unwrap_err();
    let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
    for required in [
        "application_provider.entity_id",
        "application_provider.provider_domain",
        "application_provider.fastfed_handshake_register_uri",
    ] {
        assert!(fields.contains(&required), "missing {required} in {fields:?}");
    }
}

#[test]
fn test_unknown_profile_urn_is_named() {
    let tree = idp_tree(json!(["urn:example:fastfed:unknown"]), json!([]));
    let err = MetadataService::new(config())
        .load_identity_provider(&json!({"identity_provider": tree}))
        .unwrap_err();
    assert!(err.to_string().contains("urn:example:fastfed:unknown"));
    assert!(err
        .field_errors()
        .iter()
        .any(|e| e.rule == FieldRule::UnrecognizedProfile("urn:example:fastfed:unknown".to_string())));
}

#[test]
fn test_scim_limit_out_of_range_in_document() {
    let mut tree = app_tree(json!([]), json!([ENTERPRISE_SCIM_URN]));
    tree[ENTERPRISE_SCIM_URN]["max_group_membership_changes"] = json!(1001);
    let err = MetadataService::new(config())
        .load_application_provider(&json!({"application_provider": tree}))
        .unwrap_err();
    assert!(err.field_errors().iter().any(|e| matches!(
        e.rule,
        FieldRule::OutOfRange { value: 1001, min: 100, max: 1000 }
    )));
}

// ── Negotiation ─────────────────────────────────────────────────────────

#[test]
fn test_scim_only_negotiation_enables_exactly_scim() {
    let (idp, app) = scim_only();
    let (idp, app) = load_pair(&idp, &app);
    let contract = CapabilityNegotiator::new(config()).negotiate(idp, app).unwrap();

    assert!(contract.enabled_profiles.authentication_profiles.is_empty());
    assert_eq!(
        contract.enabled_profiles.provisioning_profiles.iter().collect::<Vec<_>>(),
        vec![ENTERPRISE_SCIM_URN]
    );
    assert_eq!(
        contract.signing_algorithms,
        Some(vec!["RS256".to_string(), "ES256".to_string()])
    );
    assert!(contract.check().is_ok());
}

#[test]
fn test_negotiation_names_the_lacking_side() {
    let with_saml_idp = json!({"identity_provider": idp_tree(json!([ENTERPRISE_SAML_URN]), json!([]))});
    let without_idp = json!({"identity_provider": idp_tree(json!([]), json!([]))});
    let with_saml_app = json!({"application_provider": app_tree(json!([ENTERPRISE_SAML_URN]), json!([]))});
    let without_app = json!({"application_provider": app_tree(json!([]), json!([]))});
    let negotiator = CapabilityNegotiator::new(config());

    let (idp, app) = load_pair(&with_saml_idp, &without_app);
    let missing_from_app = negotiator.negotiate(idp, app).unwrap_err();

    let (idp, app) = load_pair(&without_idp, &with_saml_app);
    let missing_from_idp = negotiator.negotiate(idp, app).unwrap_err();

    match (missing_from_app, missing_from_idp) {
        (
            FastFedError::IncompatibleProviders(Incompatibility::MissingProfile {
                urn: first_urn,
                missing_from: first_side,
            }),
            FastFedError::IncompatibleProviders(Incompatibility::MissingProfile {
                urn: second_urn,
                missing_from: second_side,
            }),
        ) => {
            assert_eq!(first_urn, ENTERPRISE_SAML_URN);
            assert_eq!(second_urn, ENTERPRISE_SAML_URN);
            assert_eq!(first_side, ProviderSide::ApplicationProvider);
            assert_eq!(second_side, ProviderSide::IdentityProvider);
        }
        other => panic!("unexpected errors: {other:?}"),
    }
}

#[test]
fn test_propose_with_explicit_profiles() {
    let idp = json!({"identity_provider": idp_tree(json!([ENTERPRISE_SAML_URN]), json!([ENTERPRISE_SCIM_URN]))});
    let app = json!({"application_provider": app_tree(json!([ENTERPRISE_SAML_URN]), json!([ENTERPRISE_SCIM_URN]))});
    let proposed = StandardProposeContractUseCase::new(config())
        .propose_contract_with_profiles(&idp, &app, &[ENTERPRISE_SAML_URN])
        .unwrap();
    let contract = proposed.proposal.contract.as_ref().unwrap();
    assert!(contract.enabled_profiles.contains(ENTERPRISE_SAML_URN));
    assert!(!contract.enabled_profiles.contains(ENTERPRISE_SCIM_URN));
}

#[test]
fn test_propose_rejects_malformed_document() {
    let (idp, _) = scim_only();
    let err = StandardProposeContractUseCase::new(config())
        .propose_contract(&idp, &json!({"application_provider": {}}))
        .unwrap_err();
    assert!(matches!(err, FastFedError::MalformedMetadata { .. }));
}

// ── Configuration ranges ────────────────────────────────────────────────

#[test]
fn test_group_membership_range_boundaries() {
    let build = |max| {
        FastFedConfiguration::builder()
            .scim_max_group_membership_changes(max)
            .build()
    };
    assert!(build(99).is_err());
    assert!(build(1001).is_err());
    assert!(build(100).is_ok());
    assert!(build(1000).is_ok());
    assert_eq!(config().scim().max_group_membership_changes, 100);
}

#[test]
fn test_proposal_ttl_boundaries() {
    let build = |ttl| FastFedConfiguration::builder().contract_proposal_ttl(ttl).build();
    assert!(build(Duration::days(365 * 1_000_000)).is_err());

    let longest = build(Duration::days(MAX_CONTRACT_PROPOSAL_TTL_DAYS)).unwrap();
    let (idp, app) = scim_only();
    let proposed = StandardProposeContractUseCase::new(longest)
        .propose_contract(&idp, &app)
        .unwrap();
    let expires_at = proposed.proposal.expires_at().unwrap();
    assert!(expires_at > Utc::now() + Duration::days(MAX_CONTRACT_PROPOSAL_TTL_DAYS - 1));
}

// ── Proposal lifecycle ──────────────────────────────────────────────────

fn open_proposal() -> ContractProposal {
    let (idp, app) = scim_only();
    StandardProposeContractUseCase::new(config())
        .propose_contract(&idp, &app)
        .unwrap()
        .proposal
}

#[test]
fn test_proposal_opens_with_configured_ttl() {
    let before = Utc::now();
    let (idp, app) = scim_only();
    let proposed = StandardProposeContractUseCase::new(config())
        .propose_contract(&idp, &app)
        .unwrap();

    assert_eq!(proposed.proposal.current_status(), Some(ProposalStatus::Proposed));
    assert!(matches!(proposed.event, ContractProposalEvent::Proposed { .. }));
    let expires_at = proposed.proposal.expires_at().unwrap();
    assert!(expires_at >= before + Duration::hours(24) - Duration::seconds(1));
    assert!(!proposed.proposal.is_expired());
    assert!(proposed.proposal.is_expired_at(expires_at));
}

#[test]
fn test_accepted_proposal_cannot_be_rejected() {
    let mut proposal = open_proposal();
    assert!(matches!(
        proposal.accept().unwrap(),
        ContractProposalEvent::Accepted { .. }
    ));
    let err = proposal.reject().unwrap_err();
    assert!(matches!(err, FastFedError::InvalidChange(_)));
    assert_eq!(proposal.current_status(), Some(ProposalStatus::Accepted));
}

#[test]
fn test_every_transition_is_terminal() {
    type Transition = fn(&mut ContractProposal) -> fastfed_core::Result<ContractProposalEvent>;
    let transitions: [Transition; 3] = [
        ContractProposal::accept,
        ContractProposal::reject,
        ContractProposal::withdraw,
    ];
    for first in transitions {
        let mut proposal = open_proposal();
        first(&mut proposal).unwrap();
        assert!(proposal.current_status().unwrap().is_terminal());
        for next in transitions {
            assert!(next(&mut proposal).is_err());
        }
        assert!(proposal
            .extend_expiration(Utc::now() + Duration::days(7))
            .is_err());
    }
}

#[test]
fn test_unknown_status_is_reported_not_dropped() {
    let mut document = open_proposal().to_document();
    document["contract_proposal"]["status"] = json!("pending");
    let err = MetadataService::new(config())
        .load_contract_proposal(&document)
        .unwrap_err();
    assert!(err
        .field_errors()
        .iter()
        .any(|e| e.field == "contract_proposal.status"
            && e.rule == FieldRule::Unrecognized("pending".to_string())));
}

#[test]
fn test_proposal_agreeing_on_disallowed_algorithm_is_security_failure() {
    let mut document = open_proposal().to_document();
    document["contract_proposal"]["contract"]["signing_algorithms"] = json!(["none"]);
    let err = MetadataService::new(config())
        .load_contract_proposal(&document)
        .unwrap_err();
    assert!(matches!(err, FastFedError::Security(ref message) if message.contains("none")));
}

#[test]
fn test_contract_without_providers_fails_validation() {
    let contract = Contract::new(config());
    assert!(contract.check().is_err());
}
