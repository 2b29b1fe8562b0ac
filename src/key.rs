//! Identity for rate tracking.
//!
//! Every quota decision is made against a [`RateKey`]: the triple of
//! tenant, client, and action that the Window Registry and Load Manager
//! key their internal maps on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RateLimitError;

/// Identity for rate tracking: (tenant, client, action).
///
/// All three components must be non-empty; use [`RateKey::try_new`] at
/// any boundary that accepts caller-supplied identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateKey {
    tenant_id: String,
    client_id: String,
    action_type: String,
}

impl RateKey {
    /// Construct a key, validating that no component is empty.
    pub fn try_new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        action_type: impl Into<String>,
    ) -> std::result::Result<Self, RateLimitError> {
        let tenant_id = tenant_id.into();
        let client_id = client_id.into();
        let action_type = action_type.into();

        if tenant_id.is_empty() {
            return Err(RateLimitError::InvalidInput("tenant_id must not be empty".into()));
        }
        if client_id.is_empty() {
            return Err(RateLimitError::InvalidInput("client_id must not be empty".into()));
        }
        if action_type.is_empty() {
            return Err(RateLimitError::InvalidInput("action_type must not be empty".into()));
        }

        Ok(Self {
            tenant_id,
            client_id,
            action_type,
        })
    }

    /// The tenant identifier.
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// The client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The action type.
    pub fn action_type(&self) -> &str {
        &self.action_type
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.tenant_id, self.client_id, self.action_type)
    }
}
