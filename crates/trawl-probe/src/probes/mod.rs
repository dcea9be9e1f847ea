//! Built-in probes and their registration.

pub mod hibp;
pub mod people;
pub mod username_pack;
pub mod wayback;

use crate::error::Result;
use crate::probe::Probe;
use crate::registry::ProbeRegistry;
use std::sync::Arc;
use std::time::Duration;
use trawl_core::ProbeConfig;

pub use hibp::{HibpProbe, HIBP};
pub use people::term_probes;
pub use username_pack::{builtin_services, Service, UsernamePack, USERNAME_PACK};
pub use wayback::{WaybackProbe, WAYBACK};

/// Register every built-in probe.
///
/// Sources named in `priority_sources` are registered as priority.
///
/// # Errors
/// Returns [`crate::ProbeError::DuplicateSource`] if any built-in name is
/// already registered.
pub fn register_builtin(
    registry: &ProbeRegistry,
    config: &ProbeConfig,
    priority_sources: &[String],
) -> Result<()> {
    let register = |name: &str, probe: Arc<dyn Probe>| {
        if priority_sources.iter().any(|p| p == name) {
            registry.register_priority(name, probe)
        } else {
            registry.register(name, probe)
        }
    };

    register(
        USERNAME_PACK,
        Arc::new(UsernamePack::builtin(config.username_pack_max_positives)),
    )?;
    register(
        HIBP,
        Arc::new(
            HibpProbe::new(config.hibp_api_key.clone())
                .with_pause(Duration::from_millis(config.hibp_pause_ms))
                .with_max_breaches(config.hibp_max_breaches),
        ),
    )?;
    for probe in term_probes() {
        let name = probe.site().to_string();
        register(&name, Arc::new(probe))?;
    }
    register(WAYBACK, Arc::new(WaybackProbe::new()))?;

    tracing::info!(count = registry.len(), "registered built-in probes");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SiteCatalog;

    fn default_priority() -> Vec<String> {
        trawl_core::ScanConfig::default().priority_sources
    }

    #[test]
    fn test_register_builtin_priority_first() {
        let registry = ProbeRegistry::new();
        register_builtin(&registry, &ProbeConfig::default(), &default_priority())
            .expect("register built-ins");

        let names = registry.names();
        assert_eq!(
            &names[..4],
            &[USERNAME_PACK, HIBP, "WhoCallsMe", "FamilyTreeNow"]
        );
        assert!(registry.contains(WAYBACK));
        assert!(registry.get("IDcrawl").is_ok_and(|e| !e.priority));
    }

    #[test]
    fn test_builtin_probes_are_in_catalog() {
        let registry = ProbeRegistry::new();
        register_builtin(&registry, &ProbeConfig::default(), &[]).expect("register built-ins");

        let catalog = SiteCatalog::builtin();
        for name in registry.names() {
            assert!(catalog.get(&name).is_some(), "{name} missing from catalog");
        }
    }

    #[test]
    fn test_register_builtin_twice_fails() {
        let registry = ProbeRegistry::new();
        register_builtin(&registry, &ProbeConfig::default(), &[]).expect("first");
        assert!(register_builtin(&registry, &ProbeConfig::default(), &[]).is_err());
    }
}
