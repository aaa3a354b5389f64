// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Wire key names for FastFed metadata documents.

pub const IDENTITY_PROVIDER: &str = "identity_provider";
pub const APPLICATION_PROVIDER: &str = "application_provider";

// Provider
pub const ENTITY_ID: &str = "entity_id";
pub const PROVIDER_DOMAIN: &str = "provider_domain";
pub const PROVIDER_CONTACT_INFORMATION: &str = "provider_contact_information";
pub const ORGANIZATION: &str = "organization";
pub const PHONE: &str = "phone";
pub const EMAIL: &str = "email";
pub const DISPLAY_SETTINGS: &str = "display_settings";
pub const DISPLAY_NAME: &str = "display_name";
pub const LOGO_URI: &str = "logo_uri";
pub const ICON_URI: &str = "icon_uri";
pub const LICENSE: &str = "license";
pub const CAPABILITIES: &str = "capabilities";
pub const AUTHENTICATION_PROFILES: &str = "authentication_profiles";
pub const PROVISIONING_PROFILES: &str = "provisioning_profiles";
pub const SCHEMA_GRAMMARS: &str = "schema_grammars";
pub const SIGNING_ALGORITHMS: &str = "signing_algorithms";

// Identity Provider
pub const JWKS_URI: &str = "jwks_uri";
pub const FASTFED_HANDSHAKE_START_URI: &str = "fastfed_handshake_start_uri";
pub const REGISTRATION_REQUEST: &str = "registration_request";

// Application Provider
pub const FASTFED_HANDSHAKE_REGISTER_URI: &str = "fastfed_handshake_register_uri";
pub const FASTFED_HANDSHAKE_FINALIZE_URI: &str = "fastfed_handshake_finalize_uri";
pub const REGISTRATION_RESPONSE: &str = "registration_response";

// Contract
pub const ENABLED_PROFILES: &str = "enabled_profiles";
pub const CONTRACT: &str = "contract";
pub const CONTRACT_PROPOSAL: &str = "contract_proposal";
pub const STATUS: &str = "status";
pub const EXPIRATION_DATE: &str = "expiration_date";

// Desired attributes
pub const DESIRED_ATTRIBUTES: &str = "desired_attributes";
pub const REQUIRED_USER_ATTRIBUTES: &str = "required_user_attributes";
pub const OPTIONAL_USER_ATTRIBUTES: &str = "optional_user_attributes";
pub const REQUIRED_GROUP_ATTRIBUTES: &str = "required_group_attributes";
pub const OPTIONAL_GROUP_ATTRIBUTES: &str = "optional_group_attributes";

// Enterprise SAML
pub const SAML_METADATA_URI: &str = "saml_metadata_uri";

// Enterprise SCIM
pub const CAN_SUPPORT_NESTED_GROUPS: &str = "can_support_nested_groups";
pub const MAX_GROUP_MEMBERSHIP_CHANGES: &str = "max_group_membership_changes";
pub const SCIM_SERVICE_URI: &str = "scim_service_uri";
pub const PROVIDER_AUTHENTICATION_METHOD: &str = "provider_authentication_method";
pub const TOKEN_ENDPOINT: &str = "token_endpoint";
pub const SCOPE: &str = "scope";
