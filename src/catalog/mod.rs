/*!
 * Capability Catalog
 * Registry of capability definitions forming a parent/child tree
 */

pub mod types;

pub use types::{Capability, CapabilityMetadata, CatalogError, CatalogResult};

use crate::core::types::{CapabilityId, RiskLevel};
use ahash::RandomState;
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Registry of capability definitions
///
/// The tree is acyclic by construction: a capability can only name an
/// already-registered parent, so no registration can close a cycle.
pub struct CapabilityCatalog {
    capabilities: RwLock<HashMap<CapabilityId, Capability, RandomState>>,
}

impl CapabilityCatalog {
    pub fn new() -> Self {
        Self {
            capabilities: RwLock::new(HashMap::with_hasher(RandomState::new())),
        }
    }

    /// Catalog pre-populated with the standard capability hierarchy
    pub fn with_builtins() -> Self {
        let catalog = Self::new();
        for capability in builtin_capabilities() {
            // Builtins are ordered parents-first, registration cannot fail
            let _ = catalog.register(capability);
        }
        info!("Capability catalog initialized with builtin hierarchy");
        catalog
    }

    /// Register a capability definition
    ///
    /// Fails with `ParentNotFound` if `parent` is set but not yet registered.
    pub fn register(&self, capability: Capability) -> CatalogResult<()> {
        let mut capabilities = self.capabilities.write();
        if let Some(ref parent) = capability.parent {
            if !capabilities.contains_key(parent) {
                return Err(CatalogError::ParentNotFound {
                    id: capability.id.clone(),
                    parent: parent.clone(),
                });
            }
        }
        debug!("Registered capability {}", capability.id);
        capabilities.insert(capability.id.clone(), capability);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Capability> {
        self.capabilities.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.capabilities.read().contains_key(id)
    }

    pub fn list(&self) -> Vec<Capability> {
        self.capabilities.read().values().cloned().collect()
    }

    /// Mark a capability deprecated, optionally naming its replacement
    pub fn deprecate(&self, id: &str, replaced_by: Option<CapabilityId>) -> bool {
        let mut capabilities = self.capabilities.write();
        match capabilities.get_mut(id) {
            Some(capability) => {
                capability.metadata.deprecated = true;
                capability.metadata.replaced_by = replaced_by;
                capability.metadata.modified_at = std::time::SystemTime::now();
                capability.metadata.version += 1;
                true
            }
            None => false,
        }
    }

    /// Transitive closure of children, depth-first
    ///
    /// Used for display and audit only; authorization never walks the tree.
    pub fn descendants(&self, id: &str) -> Vec<Capability> {
        let capabilities = self.capabilities.read();
        let mut result = Vec::new();
        let mut stack: Vec<&str> = vec![id];
        while let Some(current) = stack.pop() {
            for capability in capabilities.values() {
                if capability.parent.as_deref() == Some(current) {
                    result.push(capability.clone());
                    stack.push(capability.id.as_str());
                }
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.capabilities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.read().is_empty()
    }
}

impl Default for CapabilityCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Standard capability hierarchy, parents first
fn builtin_capabilities() -> Vec<Capability> {
    vec![
        Capability::new("filesystem", "Filesystem access", RiskLevel::Medium)
            .with_description("Root of filesystem capabilities"),
        Capability::new("filesystem.read", "Read files", RiskLevel::Low)
            .with_parent("filesystem"),
        Capability::new("filesystem.write", "Write files", RiskLevel::Medium)
            .with_parent("filesystem")
            .with_requires(vec!["filesystem.read".into()]),
        Capability::new("filesystem.delete", "Delete files", RiskLevel::High)
            .with_parent("filesystem")
            .with_requires(vec!["filesystem.write".into()]),
        Capability::new("process", "Process control", RiskLevel::High)
            .with_description("Root of process capabilities"),
        Capability::new("process.spawn", "Spawn processes", RiskLevel::High)
            .with_parent("process"),
        Capability::new("network", "Network access", RiskLevel::Medium)
            .with_description("Root of network capabilities"),
        Capability::new("network.connect", "Outbound connections", RiskLevel::Medium)
            .with_parent("network"),
        Capability::new("system.admin", "Administrative control", RiskLevel::Critical)
            .not_delegatable(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let catalog = CapabilityCatalog::new();
        catalog
            .register(Capability::new("fs", "Filesystem", RiskLevel::Low))
            .unwrap();

        let capability = catalog.get("fs").unwrap();
        assert_eq!(capability.name, "Filesystem");
        assert!(catalog.contains("fs"));
        assert!(!catalog.contains("net"));
    }

    #[test]
    fn test_register_missing_parent() {
        let catalog = CapabilityCatalog::new();
        let result = catalog.register(
            Capability::new("fs.read", "Read", RiskLevel::Low).with_parent("fs"),
        );
        assert!(matches!(
            result,
            Err(CatalogError::ParentNotFound { .. })
        ));
    }

    #[test]
    fn test_descendants_transitive() {
        let catalog = CapabilityCatalog::new();
        catalog
            .register(Capability::new("fs", "Filesystem", RiskLevel::Low))
            .unwrap();
        catalog
            .register(Capability::new("fs.read", "Read", RiskLevel::Low).with_parent("fs"))
            .unwrap();
        catalog
            .register(
                Capability::new("fs.read.meta", "Read metadata", RiskLevel::Low)
                    .with_parent("fs.read"),
            )
            .unwrap();

        let descendants = catalog.descendants("fs");
        let ids: Vec<_> = descendants.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(descendants.len(), 2);
        assert!(ids.contains(&"fs.read"));
        assert!(ids.contains(&"fs.read.meta"));
    }

    #[test]
    fn test_deprecate() {
        let catalog = CapabilityCatalog::new();
        catalog
            .register(Capability::new("old", "Old", RiskLevel::Low))
            .unwrap();
        assert!(catalog.deprecate("old", Some("new".into())));

        let capability = catalog.get("old").unwrap();
        assert!(capability.metadata.deprecated);
        assert_eq!(capability.metadata.replaced_by.as_deref(), Some("new"));
        assert_eq!(capability.metadata.version, 2);
    }

    #[test]
    fn test_builtins_register_cleanly() {
        let catalog = CapabilityCatalog::with_builtins();
        assert!(catalog.contains("filesystem.write"));
        assert!(catalog.contains("process.spawn"));
        assert!(!catalog.get("system.admin").unwrap().delegatable);
    }
}
