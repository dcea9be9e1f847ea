//! Ordered registry of probes keyed by source name.

use crate::error::{ProbeError, Result};
use crate::probe::Probe;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};
use trawl_core::SourceName;

/// A registered probe.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Source the probe answers for
    pub name: SourceName,
    /// The probe itself
    pub probe: Arc<dyn Probe>,
    /// Dispatched ahead of non-priority sources
    pub priority: bool,
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Entries {
    ordered: Vec<RegistryEntry>,
    index: HashMap<SourceName, usize>,
}

impl Entries {
    fn reindex(&mut self) {
        self.index = self
            .ordered
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.name.clone(), i))
            .collect();
    }
}

/// Registry of probes in registration order.
///
/// Built once at startup and then shared read-only behind an `Arc`;
/// cloning shares the same underlying entries.
#[derive(Clone, Default)]
pub struct ProbeRegistry {
    entries: Arc<RwLock<Entries>>,
}

impl ProbeRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a probe.
    ///
    /// # Errors
    /// Returns [`ProbeError::DuplicateSource`] if the name is taken, or
    /// [`ProbeError::InvalidName`] if it is blank or too long.
    pub fn register(&self, name: &str, probe: Arc<dyn Probe>) -> Result<()> {
        self.insert(name, probe, false)
    }

    /// Register a probe that is dispatched ahead of the others.
    pub fn register_priority(&self, name: &str, probe: Arc<dyn Probe>) -> Result<()> {
        self.insert(name, probe, true)
    }

    fn insert(&self, name: &str, probe: Arc<dyn Probe>, priority: bool) -> Result<()> {
        let name = SourceName::new(name)?;

        let mut entries = self
            .entries
            .write()
            .expect("acquire write lock on probes");

        if entries.index.contains_key(&name) {
            return Err(ProbeError::DuplicateSource {
                site: name.to_string(),
            });
        }

        let position = entries.ordered.len();
        entries.index.insert(name.clone(), position);
        entries.ordered.push(RegistryEntry {
            name: name.clone(),
            probe,
            priority,
        });

        debug!(site = %name, priority, "registered probe");
        Ok(())
    }

    /// Register a probe, replacing any existing probe of the same name in
    /// place. The replaced entry keeps its position and priority.
    ///
    /// Returns `true` if an existing probe was replaced.
    pub fn register_or_replace(&self, name: &str, probe: Arc<dyn Probe>) -> Result<bool> {
        let name = SourceName::new(name)?;

        let mut entries = self
            .entries
            .write()
            .expect("acquire write lock on probes");

        if let Some(&position) = entries.index.get(&name) {
            warn!(site = %name, "replacing registered probe");
            entries.ordered[position].probe = probe;
            return Ok(true);
        }

        let position = entries.ordered.len();
        entries.index.insert(name.clone(), position);
        entries.ordered.push(RegistryEntry {
            name: name.clone(),
            probe,
            priority: false,
        });
        debug!(site = %name, "registered probe");
        Ok(false)
    }

    /// Mark the named sources as priority. Unknown names are ignored.
    ///
    /// Returns the number of entries marked.
    pub fn set_priority<S: AsRef<str>>(&self, names: &[S]) -> usize {
        let mut entries = self
            .entries
            .write()
            .expect("acquire write lock on probes");

        let mut marked = 0;
        for name in names {
            let Ok(name) = SourceName::new(name.as_ref()) else {
                continue;
            };
            if let Some(&position) = entries.index.get(&name) {
                entries.ordered[position].priority = true;
                marked += 1;
            }
        }
        marked
    }

    /// Get a probe entry by source name.
    ///
    /// # Errors
    /// Returns [`ProbeError::NotFound`] if no probe is registered.
    pub fn get(&self, name: &str) -> Result<RegistryEntry> {
        let entries = self
            .entries
            .read()
            .expect("acquire read lock on probes");

        SourceName::new(name)
            .ok()
            .and_then(|key| entries.index.get(&key).copied())
            .map(|position| entries.ordered[position].clone())
            .ok_or_else(|| ProbeError::NotFound {
                site: name.to_string(),
            })
    }

    /// All entries: priority entries first, each group in registration order.
    #[must_use]
    pub fn get_all(&self) -> Vec<RegistryEntry> {
        let entries = self
            .entries
            .read()
            .expect("acquire read lock on probes");

        let (mut priority, rest): (Vec<_>, Vec<_>) =
            entries.ordered.iter().cloned().partition(|entry| entry.priority);
        priority.extend(rest);
        priority
    }

    /// Source names in dispatch order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.get_all()
            .into_iter()
            .map(|entry| entry.name.to_string())
            .collect()
    }

    /// Check if a probe is registered for the source.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Remove a probe.
    ///
    /// Returns `true` if the probe was present, `false` otherwise.
    pub fn remove(&self, name: &str) -> bool {
        let Ok(key) = SourceName::new(name) else {
            return false;
        };

        let mut entries = self
            .entries
            .write()
            .expect("acquire write lock on probes");

        let Some(position) = entries.index.get(&key).copied() else {
            return false;
        };
        entries.ordered.remove(position);
        entries.reindex();

        debug!(site = %key, "removed probe");
        true
    }

    /// Number of registered probes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("acquire read lock on probes")
            .ordered
            .len()
    }

    /// Whether no probes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("sources", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::probe_fn;
    use trawl_core::Hit;

    fn labelled(label: &'static str) -> Arc<dyn Probe> {
        probe_fn(move |_client, _query| async move {
            Ok(vec![Hit::new(label, label, "", "https://example.com")])
        })
    }

    #[test]
    fn test_registry_new() {
        let registry = ProbeRegistry::new();
        assert_eq!(registry.len(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_and_get() {
        let registry = ProbeRegistry::new();
        registry.register("Radaris", labelled("a")).expect("register");

        let entry = registry.get("Radaris").expect("get entry");
        assert_eq!(entry.name.as_str(), "Radaris");
        assert!(!entry.priority);
        assert!(registry.contains("Radaris"));
    }

    #[test]
    fn test_get_missing() {
        let registry = ProbeRegistry::new();
        let result = registry.get("Nope");
        assert!(matches!(result, Err(ProbeError::NotFound { .. })));
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = ProbeRegistry::new();
        registry.register("PeekYou", labelled("a")).expect("register");

        let err = registry.register("PeekYou", labelled("b")).unwrap_err();
        assert!(matches!(err, ProbeError::DuplicateSource { .. }));
        let err = registry.register_priority(" PeekYou ", labelled("b")).unwrap_err();
        assert!(matches!(err, ProbeError::DuplicateSource { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_name_rejected() {
        let registry = ProbeRegistry::new();
        let err = registry.register("   ", labelled("a")).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidName(_)));
    }

    #[test]
    fn test_register_or_replace_keeps_position() {
        let registry = ProbeRegistry::new();
        registry.register("A", labelled("a")).expect("register A");
        registry.register_priority("B", labelled("b")).expect("register B");
        registry.register("C", labelled("c")).expect("register C");

        assert!(registry.register_or_replace("B", labelled("b2")).expect("replace B"));
        assert!(!registry.register_or_replace("D", labelled("d")).expect("add D"));

        assert_eq!(registry.names(), vec!["B", "A", "C", "D"]);
        assert!(registry.get("B").expect("get B").priority);
    }

    #[test]
    fn test_get_all_priority_first_in_registration_order() {
        let registry = ProbeRegistry::new();
        registry.register("Radaris", labelled("r")).expect("register");
        registry.register_priority("WhoCallsMe", labelled("w")).expect("register");
        registry.register("PeekYou", labelled("p")).expect("register");
        registry.register_priority("FamilyTreeNow", labelled("f")).expect("register");

        assert_eq!(
            registry.names(),
            vec!["WhoCallsMe", "FamilyTreeNow", "Radaris", "PeekYou"]
        );
    }

    #[test]
    fn test_set_priority() {
        let registry = ProbeRegistry::new();
        registry.register("A", labelled("a")).expect("register");
        registry.register("B", labelled("b")).expect("register");

        assert_eq!(registry.set_priority(&["B", "Unknown"]), 1);
        assert_eq!(registry.names(), vec!["B", "A"]);
    }

    #[test]
    fn test_remove_reindexes() {
        let registry = ProbeRegistry::new();
        registry.register("A", labelled("a")).expect("register");
        registry.register("B", labelled("b")).expect("register");
        registry.register("C", labelled("c")).expect("register");

        assert!(registry.remove("A"));
        assert!(!registry.remove("A"));
        assert_eq!(registry.get("C").expect("get C").name.as_str(), "C");
        assert_eq!(registry.names(), vec!["B", "C"]);
    }

    #[test]
    fn test_clone_shares_entries() {
        let registry = ProbeRegistry::new();
        let shared = registry.clone();
        registry.register("A", labelled("a")).expect("register");
        assert!(shared.contains("A"));
    }
}
