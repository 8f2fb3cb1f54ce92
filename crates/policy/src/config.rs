//! Static configuration loaded from TOML.

use crate::catalog::Catalog;
use crate::differ::AbsentCategory;
use crate::provider::{CatalogProvider, ConfigProvider, DomainSettings, GateContext};
use crate::resource::{Category, Domain, MatchMode};
use crate::rules::{AllowSet, RuleSet};
use crate::{Error, Result};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gating configuration for a set of domains.
///
/// Serves both as a [`ConfigProvider`] and a [`CatalogProvider`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticConfig {
    #[serde(default)]
    pub domains: IndexMap<Domain, DomainConfig>,
}

/// Rules, settings and catalog of one domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainConfig {
    /// How rules are compared against identifiers.
    #[serde(default, rename = "match")]
    pub match_mode: MatchMode,

    /// Treatment of catalog categories the allow set never mentions.
    #[serde(default)]
    pub absent_category: AbsentCategory,

    /// Whole-identifier allow rules.
    #[serde(default)]
    pub allow: RuleSet,

    /// Allowed items per category.
    #[serde(default)]
    pub allow_categories: IndexMap<Category, IndexSet<String>>,

    /// Deny rules (overridable).
    #[serde(default)]
    pub deny: RuleSet,

    /// Capability that bypasses allow and deny rules.
    #[serde(default)]
    pub override_capability: Option<String>,

    /// Bypass allow and deny rules for every caller.
    #[serde(default)]
    pub override_always: bool,

    /// Catalog entries.
    #[serde(default)]
    pub catalog: Catalog,
}

impl DomainConfig {
    pub fn settings(&self) -> DomainSettings {
        DomainSettings {
            match_mode: self.match_mode,
            absent_category: self.absent_category,
        }
    }

    /// Both allow forms merged into one set.
    pub fn allow_set(&self) -> AllowSet {
        AllowSet {
            global: self.allow.clone(),
            categories: self.allow_categories.clone(),
        }
    }

    pub fn override_granted(&self, context: &GateContext) -> bool {
        self.override_always
            || self
                .override_capability
                .as_deref()
                .is_some_and(|cap| context.has_capability(cap))
    }

    fn validate(&self, domain: &Domain) -> Result<()> {
        let empty_rule = |kind: &str| {
            Error::Invalid(format!("domain '{domain}' has an empty {kind} rule"))
        };

        if self.allow.iter().any(str::is_empty) {
            return Err(empty_rule("allow"));
        }
        if self.deny.iter().any(str::is_empty) {
            return Err(empty_rule("deny"));
        }
        for (category, items) in &self.allow_categories {
            if category.as_str().trim().is_empty() {
                return Err(Error::Invalid(format!(
                    "domain '{domain}' has a blank allow_categories key; use '{}'",
                    Category::UNCATEGORIZED
                )));
            }
            if items.iter().any(String::is_empty) {
                return Err(empty_rule(&format!("allow_categories.{category}")));
            }
        }
        if self
            .override_capability
            .as_deref()
            .is_some_and(|cap| cap.trim().is_empty())
        {
            return Err(Error::Invalid(format!(
                "domain '{domain}' has an empty override_capability"
            )));
        }
        Ok(())
    }
}

impl StaticConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every domain for malformed rules.
    pub fn validate(&self) -> Result<()> {
        for (domain, config) in &self.domains {
            if domain.as_str().trim().is_empty() {
                return Err(Error::Invalid("domain name must be non-empty".into()));
            }
            config.validate(domain)?;
        }
        Ok(())
    }

    pub fn with_domain(mut self, domain: impl Into<Domain>, config: DomainConfig) -> Self {
        self.domains.insert(domain.into(), config);
        self
    }

    pub fn domain(&self, domain: &Domain) -> Result<&DomainConfig> {
        self.domains
            .get(domain)
            .ok_or_else(|| Error::UnknownDomain(domain.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Domain, &DomainConfig)> {
        self.domains.iter()
    }
}

impl ConfigProvider for StaticConfig {
    fn settings(&self, domain: &Domain) -> Result<DomainSettings> {
        Ok(self.domain(domain)?.settings())
    }

    fn allow_set(&self, domain: &Domain) -> Result<AllowSet> {
        Ok(self.domain(domain)?.allow_set())
    }

    fn deny_set(&self, domain: &Domain) -> Result<RuleSet> {
        Ok(self.domain(domain)?.deny.clone())
    }

    fn override_for(&self, domain: &Domain, context: &GateContext) -> Result<bool> {
        Ok(self.domain(domain)?.override_granted(context))
    }
}

impl CatalogProvider for StaticConfig {
    fn catalog(&self, domain: &Domain) -> Result<Catalog> {
        Ok(self.domain(domain)?.catalog.clone())
    }
}
