// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Built-in FastFed profiles installed by [`crate::domain::registry::ProfileRegistry::known`].

pub mod enterprise_saml;
pub mod enterprise_scim;

pub use enterprise_saml::{EnterpriseSamlProfile, ENTERPRISE_SAML_URN};
pub use enterprise_scim::{
    EnterpriseScimProfile, ENTERPRISE_SCIM_URN, OAUTH2_JWT_PROVIDER_AUTHENTICATION_URN,
};
