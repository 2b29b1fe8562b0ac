//! Config Store: composes global defaults, per-tenant-action limits, and
//! per-tenant-client-action overrides into a single effective quota per
//! lookup.
//!
//! Every mutating operation is last-write-wins and takes effect
//! immediately for subsequent [`resolve`](ConfigStore::resolve) calls; it
//! never retroactively touches in-flight decisions already made under a
//! previous value.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RateLimitError, Result};
use crate::quota::Quota;

/// Global, process-wide admission parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalLimits {
    /// Maximum number of requests the Load Manager admits concurrently.
    pub max_global_concurrent: u64,
    /// Maximum depth of any single tenant's wait queue.
    pub max_tenant_queue_size: u64,
}

impl GlobalLimits {
    /// Construct global limits, validating both fields are positive.
    pub fn new(max_global_concurrent: u64, max_tenant_queue_size: u64) -> std::result::Result<Self, ConfigError> {
        if max_global_concurrent == 0 {
            return Err(ConfigError::InvalidGlobal(
                "max_global_concurrent must be greater than 0".into(),
            ));
        }
        if max_tenant_queue_size == 0 {
            return Err(ConfigError::InvalidGlobal(
                "max_tenant_queue_size must be greater than 0".into(),
            ));
        }
        Ok(Self {
            max_global_concurrent,
            max_tenant_queue_size,
        })
    }
}

impl Default for GlobalLimits {
    fn default() -> Self {
        Self {
            max_global_concurrent: 64,
            max_tenant_queue_size: 32,
        }
    }
}

/// A single (tenant, action) override, as exposed by [`ConfigSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLimitEntry {
    pub tenant: String,
    pub action: String,
    pub quota: Quota,
}

/// A single (tenant, client, action) override, as exposed by [`ConfigSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientLimitEntry {
    pub tenant: String,
    pub client: String,
    pub action: String,
    pub quota: Quota,
}

/// Read-back view of the store's full contents, for administrative
/// inspection.
///
/// Entries are self-describing named-field records rather than opaque
/// map keys, so an embedding transport layer can decode `tenant`/
/// `client`/`action` straight off the wire without a private joining
/// convention to reverse-engineer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub global: GlobalLimits,
    pub action_limits: Vec<ActionLimitEntry>,
    pub client_limits: Vec<ClientLimitEntry>,
}

/// Holds every quota override in the system and resolves the effective
/// quota for a given lookup.
///
/// Internally this is three independent [`RwLock`]-guarded maps; it is
/// never locked together with the Window Registry or Load Manager's
/// locks, matching the independence the lock hierarchy requires.
#[derive(Debug)]
pub struct ConfigStore {
    global: RwLock<GlobalLimits>,
    action_limits: RwLock<HashMap<(String, String), Quota>>,
    client_limits: RwLock<HashMap<(String, String, String), Quota>>,
}

impl ConfigStore {
    /// Create a store with the given global defaults and no overrides.
    pub fn new(global: GlobalLimits) -> Self {
        Self {
            global: RwLock::new(global),
            action_limits: RwLock::new(HashMap::new()),
            client_limits: RwLock::new(HashMap::new()),
        }
    }

    /// Read the current global limits.
    pub fn global(&self) -> GlobalLimits {
        *self.global.read()
    }

    /// Replace the global limits wholesale.
    ///
    /// Takes effect for the Load Manager's next admission decision; does
    /// not shrink any set already in flight.
    pub fn set_global(&self, max_global_concurrent: u64, max_tenant_queue_size: u64) -> Result<()> {
        let limits = GlobalLimits::new(max_global_concurrent, max_tenant_queue_size)?;
        *self.global.write() = limits;
        tracing::info!(max_global_concurrent, max_tenant_queue_size, "config: global limits updated");
        Ok(())
    }

    /// Set (or replace) the quota for (tenant, action).
    pub fn set_action_limit(&self, tenant: &str, action: &str, quota: Quota) {
        self.action_limits
            .write()
            .insert((tenant.to_string(), action.to_string()), quota);
        tracing::info!(tenant, action, ?quota, "config: action limit set");
    }

    /// Remove the (tenant, action) override, if present.
    pub fn remove_action_limit(&self, tenant: &str, action: &str) {
        self.action_limits
            .write()
            .remove(&(tenant.to_string(), action.to_string()));
        tracing::info!(tenant, action, "config: action limit removed");
    }

    /// Set (or replace) the quota for (tenant, client, action).
    pub fn set_client_limit(&self, tenant: &str, client: &str, action: &str, quota: Quota) {
        self.client_limits
            .write()
            .insert((tenant.to_string(), client.to_string(), action.to_string()), quota);
        tracing::info!(tenant, client, action, ?quota, "config: client limit set");
    }

    /// Remove the (tenant, client, action) override, if present.
    pub fn remove_client_limit(&self, tenant: &str, client: &str, action: &str) {
        self.client_limits
            .write()
            .remove(&(tenant.to_string(), client.to_string(), action.to_string()));
        tracing::info!(tenant, client, action, "config: client limit removed");
    }

    /// Resolve the effective quota for (tenant, client, action).
    ///
    /// Precedence, first hit wins:
    /// 1. client-specific override.
    /// 2. action-level limit.
    /// 3. `fallback_quota`, if supplied by the caller.
    ///
    /// Fails with [`RateLimitError::NoQuota`] if none apply. Precedence is
    /// whole-`Quota` replacement — there is no field-level merging between
    /// tiers.
    pub fn resolve(
        &self,
        tenant: &str,
        client: &str,
        action: &str,
        fallback_quota: Option<Quota>,
    ) -> Result<Quota> {
        let client_key = (tenant.to_string(), client.to_string(), action.to_string());
        if let Some(quota) = self.client_limits.read().get(&client_key) {
            return Ok(*quota);
        }
        let action_key = (tenant.to_string(), action.to_string());
        if let Some(quota) = self.action_limits.read().get(&action_key) {
            return Ok(*quota);
        }
        if let Some(quota) = fallback_quota {
            return Ok(quota);
        }
        Err(RateLimitError::NoQuota)
    }

    /// Take a structured snapshot of the store's full contents.
    pub fn snapshot(&self) -> ConfigSnapshot {
        let action_limits = self
            .action_limits
            .read()
            .iter()
            .map(|((tenant, action), quota)| ActionLimitEntry {
                tenant: tenant.clone(),
                action: action.clone(),
                quota: *quota,
            })
            .collect();
        let client_limits = self
            .client_limits
            .read()
            .iter()
            .map(|((tenant, client, action), quota)| ClientLimitEntry {
                tenant: tenant.clone(),
                client: client.clone(),
                action: action.clone(),
                quota: *quota,
            })
            .collect();
        ConfigSnapshot {
            global: self.global(),
            action_limits,
            client_limits,
        }
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(GlobalLimits::default())
    }
}
