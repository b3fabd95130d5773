// crates/schema-form-runtime/src/allowlist.rs
// ============================================================================
// Module: Endpoint Allow-List
// Description: Allow-list of endpoint names integrations may call.
// Purpose: Ensure unknown endpoints are never attempted.
// Dependencies: crate::lookup
// ============================================================================

//! ## Overview
//! Integration endpoints come from untrusted schema documents. Before any
//! lookup is attempted the endpoint name is checked against an explicit
//! allow-list; an empty allow-list permits nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::lookup::BUILTIN_ENDPOINTS;

// ============================================================================
// SECTION: Allow-List
// ============================================================================

/// Set of endpoint names integrations may call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointAllowlist {
    /// Allowed endpoint names.
    endpoints: BTreeSet<String>,
}

impl EndpointAllowlist {
    /// Builds an allow-list from endpoint names.
    #[must_use]
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns an allow-list of the built-in lookup endpoints.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(BUILTIN_ENDPOINTS)
    }

    /// Returns true when `endpoint` may be called.
    #[must_use]
    pub fn is_allowed(&self, endpoint: &str) -> bool {
        self.endpoints.contains(endpoint)
    }

    /// Iterates allowed endpoint names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(String::as_str)
    }
}

impl Default for EndpointAllowlist {
    fn default() -> Self {
        Self::builtin()
    }
}
