//! Interfaces through which the gate reads configuration and catalogs.

use crate::catalog::Catalog;
use crate::differ::AbsentCategory;
use crate::resource::{Domain, MatchMode};
use crate::rules::{AllowSet, RuleSet};
use crate::{Error, Result};
use std::collections::HashSet;

/// Per-domain evaluation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainSettings {
    pub match_mode: MatchMode,
    pub absent_category: AbsentCategory,
}

/// Call-scoped state supplied by the caller of a gate.
///
/// Holds what the override predicate needs (the caller's capabilities) and
/// the once-per-context initialization state, such as whether a shared asset
/// has already been delivered. A fresh context starts empty.
#[derive(Debug, Clone, Default)]
pub struct GateContext {
    capabilities: HashSet<String>,
    delivered: HashSet<String>,
}

impl GateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Mark a shared asset as delivered.
    ///
    /// Returns `true` the first time `asset` is claimed in this context and
    /// `false` afterwards.
    pub fn claim_asset(&mut self, asset: impl Into<String>) -> bool {
        self.delivered.insert(asset.into())
    }

    pub fn is_delivered(&self, asset: &str) -> bool {
        self.delivered.contains(asset)
    }
}

/// Supplies allow sets, deny sets and the override predicate per domain.
///
/// Every method returns [`Error::UnknownDomain`] for a domain the provider
/// does not recognize.
pub trait ConfigProvider {
    fn settings(&self, domain: &Domain) -> Result<DomainSettings>;

    fn allow_set(&self, domain: &Domain) -> Result<AllowSet>;

    /// Domains without deny semantics return an empty set.
    fn deny_set(&self, domain: &Domain) -> Result<RuleSet>;

    fn override_for(&self, domain: &Domain, context: &GateContext) -> Result<bool>;
}

/// Supplies the current catalog for a domain.
pub trait CatalogProvider {
    fn catalog(&self, domain: &Domain) -> Result<Catalog>;
}

impl<T: ConfigProvider + ?Sized> ConfigProvider for &T {
    fn settings(&self, domain: &Domain) -> Result<DomainSettings> {
        (**self).settings(domain)
    }

    fn allow_set(&self, domain: &Domain) -> Result<AllowSet> {
        (**self).allow_set(domain)
    }

    fn deny_set(&self, domain: &Domain) -> Result<RuleSet> {
        (**self).deny_set(domain)
    }

    fn override_for(&self, domain: &Domain, context: &GateContext) -> Result<bool> {
        (**self).override_for(domain, context)
    }
}

impl<T: CatalogProvider + ?Sized> CatalogProvider for &T {
    fn catalog(&self, domain: &Domain) -> Result<Catalog> {
        (**self).catalog(domain)
    }
}

/// Several configuration sources merged into one.
///
/// Allow and deny sets are unions over every layer that knows the domain.
/// The override holds if any layer grants it. Settings come from the first
/// layer that knows the domain. A domain is unknown only if no layer knows it.
#[derive(Default)]
pub struct Layered {
    layers: Vec<Box<dyn ConfigProvider + Send + Sync>>,
}

impl Layered {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: impl ConfigProvider + Send + Sync + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Fold the known answers of every layer, skipping layers that do not
    /// know the domain and propagating any other error.
    fn fold<T>(
        &self,
        domain: &Domain,
        mut acc: T,
        mut each: impl FnMut(&dyn ConfigProvider, &mut T) -> Result<()>,
    ) -> Result<T> {
        let mut known = false;
        for layer in &self.layers {
            match each(layer.as_ref(), &mut acc) {
                Ok(()) => known = true,
                Err(e) if e.is_unknown_domain() => continue,
                Err(e) => return Err(e),
            }
        }
        if known {
            Ok(acc)
        } else {
            Err(Error::UnknownDomain(domain.to_string()))
        }
    }
}

impl std::fmt::Debug for Layered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layered")
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl ConfigProvider for Layered {
    fn settings(&self, domain: &Domain) -> Result<DomainSettings> {
        for layer in &self.layers {
            match layer.settings(domain) {
                Err(e) if e.is_unknown_domain() => continue,
                other => return other,
            }
        }
        Err(Error::UnknownDomain(domain.to_string()))
    }

    fn allow_set(&self, domain: &Domain) -> Result<AllowSet> {
        self.fold(domain, AllowSet::new(), |layer, acc| {
            acc.merge(layer.allow_set(domain)?);
            Ok(())
        })
    }

    fn deny_set(&self, domain: &Domain) -> Result<RuleSet> {
        self.fold(domain, RuleSet::new(), |layer, acc| {
            acc.merge(layer.deny_set(domain)?);
            Ok(())
        })
    }

    fn override_for(&self, domain: &Domain, context: &GateContext) -> Result<bool> {
        self.fold(domain, false, |layer, acc| {
            *acc |= layer.override_for(domain, context)?;
            Ok(())
        })
    }
}
