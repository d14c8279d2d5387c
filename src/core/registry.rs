//! Domain ownership across managers
//!
//! At most one configured [`LoggerManager`](crate::LoggerManager) may own a
//! domain at a time. Claims are taken under a single mutex so that when two
//! managers race to configure the same domain exactly one succeeds.

use super::error::{LoggerError, Result};
use super::hierarchy::LoggerHierarchy;
use super::logger::Logger;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static GLOBAL_REGISTRY: Lazy<Arc<DomainRegistry>> = Lazy::new(|| Arc::new(DomainRegistry::new()));

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a manager instance within a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManagerId(u64);

impl ManagerId {
    pub(crate) fn next() -> Self {
        Self(NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Default)]
pub struct DomainRegistry {
    owners: Mutex<HashMap<String, ManagerId>>,
    loggers: LoggerHierarchy,
}

impl DomainRegistry {
    /// A standalone registry with its own logger hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by [`LoggerManager::new`](crate::LoggerManager::new)
    pub fn global() -> Arc<DomainRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    pub(crate) fn claim(&self, domain: &str, owner: ManagerId) -> Result<()> {
        let mut owners = self.owners.lock();
        match owners.get(domain) {
            Some(existing) if *existing != owner => Err(LoggerError::domain_conflict(domain)),
            _ => {
                owners.insert(domain.to_string(), owner);
                Ok(())
            }
        }
    }

    /// Remove the entry for `domain` if `owner` holds it
    pub(crate) fn release(&self, domain: &str, owner: ManagerId) -> bool {
        let mut owners = self.owners.lock();
        if owners.get(domain) == Some(&owner) {
            owners.remove(domain);
            true
        } else {
            false
        }
    }

    pub fn is_claimed(&self, domain: &str) -> bool {
        self.owners.lock().contains_key(domain)
    }

    pub fn claimed_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.owners.lock().keys().cloned().collect();
        domains.sort();
        domains
    }

    /// Forget every claim
    ///
    /// Intended for tests. The logger hierarchy is kept, so a name still
    /// resolves to the same logger. Managers that were configured keep their
    /// sinks and will still tear them down on shutdown.
    pub fn reset(&self) {
        self.owners.lock().clear();
    }

    /// Logger named `name` in this registry's hierarchy
    pub fn logger(&self, name: &str) -> Logger {
        self.loggers.get(name)
    }

    pub fn has_logger(&self, name: &str) -> bool {
        self.loggers.contains(name)
    }
}

impl std::fmt::Debug for DomainRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainRegistry")
            .field("domains", &self.claimed_domains())
            .field("loggers", &self.loggers.names())
            .finish()
    }
}

/// Fetch a logger from the process-wide hierarchy
///
/// Loggers under a domain configured through [`LoggerManager::new`](crate::LoggerManager::new)
/// write to that domain's sinks once the manager's `get_logger` has
/// attached them.
pub fn get_logger(name: &str) -> Logger {
    GLOBAL_REGISTRY.logger(name)
}
