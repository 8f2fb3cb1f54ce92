//! Boundary helper that wires providers to the evaluator and differ.

use crate::differ::{CatalogDiffer, SuppressionDiff};
use crate::evaluator::{Decision, PolicyEvaluator, Verdict};
use crate::provider::{CatalogProvider, ConfigProvider, GateContext};
use crate::resource::{Domain, ResourceId};
use crate::Result;

/// Reads fresh configuration and catalogs for every call and returns
/// decisions or suppression diffs. Applying them is up to the caller.
#[derive(Debug, Clone)]
pub struct Gate<C, K> {
    config: C,
    catalogs: K,
}

impl<C: ConfigProvider, K: CatalogProvider> Gate<C, K> {
    pub fn new(config: C, catalogs: K) -> Self {
        Self { config, catalogs }
    }

    /// Decide for one resource, failing closed on any error.
    pub fn check(&self, domain: &Domain, resource: &ResourceId, context: &GateContext) -> Decision {
        match self.try_check(domain, resource, context) {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(%domain, %resource, error = %e, "gate check failed, denying");
                Decision::Deny
            }
        }
    }

    /// Decide for one resource, surfacing unknown domains and malformed
    /// identifiers to the caller.
    pub fn try_check(
        &self,
        domain: &Domain,
        resource: &ResourceId,
        context: &GateContext,
    ) -> Result<Decision> {
        resource.validate()?;
        Ok(self.try_explain(domain, resource, context)?.decision)
    }

    /// Decide for one resource and report which rule fired.
    pub fn try_explain(
        &self,
        domain: &Domain,
        resource: &ResourceId,
        context: &GateContext,
    ) -> Result<Verdict> {
        let settings = self.config.settings(domain)?;
        let override_granted = self.config.override_for(domain, context)?;
        let deny = self.config.deny_set(domain)?;
        let allow = self.config.allow_set(domain)?;

        let verdict = PolicyEvaluator::new(settings.match_mode).explain(
            resource,
            override_granted,
            &deny,
            &allow,
        );
        tracing::debug!(%domain, %resource, %verdict, "gate check");
        Ok(verdict)
    }

    /// Items of `domain` to suppress, computed from a fresh catalog.
    pub fn suppressions(&self, domain: &Domain) -> Result<SuppressionDiff> {
        let settings = self.config.settings(domain)?;
        let allow = self.config.allow_set(domain)?;
        let catalog = self.catalogs.catalog(domain)?;

        Ok(CatalogDiffer::new(settings.match_mode)
            .with_absent_category(settings.absent_category)
            .diff(&catalog, &allow))
    }

    /// Like [`suppressions`](Self::suppressions), but apply no suppression
    /// when the domain cannot be resolved.
    pub fn suppressions_or_empty(&self, domain: &Domain) -> SuppressionDiff {
        self.suppressions(domain).unwrap_or_else(|e| {
            tracing::warn!(%domain, error = %e, "cannot compute suppressions, suppressing nothing");
            SuppressionDiff::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::{DomainConfig, StaticConfig};
    use crate::evaluator::Reason;
    use crate::resource::MatchMode;
    use crate::rules::AllowSet;
    use crate::Error;
    use pretty_assertions::assert_eq;

    fn config() -> StaticConfig {
        StaticConfig::default()
            .with_domain(
                Domain::REST_ROUTES,
                DomainConfig {
                    match_mode: MatchMode::Prefix,
                    allow: ["wp/v2"].into_iter().collect(),
                    deny: ["/wp/v2/users"].into_iter().collect(),
                    override_capability: Some("manage_options".into()),
                    ..Default::default()
                },
            )
            .with_domain(
                Domain::BLOCK_STYLES,
                DomainConfig {
                    allow_categories: AllowSet::new()
                        .with_category("core/button", ["outline"])
                        .categories,
                    catalog: Catalog::new()
                        .with("core/button", "fill")
                        .with("core/button", "outline")
                        .with("core/image", "rounded"),
                    ..Default::default()
                },
            )
    }

    #[test]
    fn test_check_routes() {
        let config = config();
        let gate = Gate::new(&config, &config);
        let domain = Domain::from(Domain::REST_ROUTES);
        let anon = GateContext::new();

        assert_eq!(gate.check(&domain, &"/wp/v2/posts".into(), &anon), Decision::Allow);
        assert_eq!(gate.check(&domain, &"/wp/v2/users/1".into(), &anon), Decision::Deny);
        assert_eq!(gate.check(&domain, &"/acme/v1/x".into(), &anon), Decision::Deny);

        let admin = GateContext::new().with_capability("manage_options");
        let verdict = gate
            .try_explain(&domain, &"/wp/v2/users/1".into(), &admin)
            .unwrap();
        assert_eq!(verdict.reason, Reason::Override);
    }

    #[test]
    fn test_unknown_domain_fails_closed() {
        let config = config();
        let gate = Gate::new(&config, &config);
        let domain = Domain::from("nope");
        let ctx = GateContext::new().with_capability("manage_options");

        assert_eq!(gate.check(&domain, &"/wp/v2/posts".into(), &ctx), Decision::Deny);
        assert!(matches!(
            gate.try_check(&domain, &"/wp/v2/posts".into(), &ctx),
            Err(Error::UnknownDomain(_))
        ));
        assert!(gate.suppressions(&domain).unwrap_err().is_unknown_domain());
        assert!(gate.suppressions_or_empty(&domain).is_empty());
    }

    #[test]
    fn test_malformed_resource() {
        let config = config();
        let gate = Gate::new(&config, &config);
        let domain = Domain::from(Domain::REST_ROUTES);
        let admin = GateContext::new().with_capability("manage_options");

        assert_eq!(gate.check(&domain, &"".into(), &admin), Decision::Deny);
        assert!(matches!(
            gate.try_check(&domain, &"".into(), &admin),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_suppressions() {
        let config = config();
        let gate = Gate::new(&config, &config);
        let diff = gate.suppressions(&Domain::BLOCK_STYLES.into()).unwrap();

        assert_eq!(diff.len(), 2);
        assert!(diff.contains("core/button", "fill"));
        assert!(!diff.contains("core/button", "outline"));
        assert!(diff.contains("core/image", "rounded"));
    }
}
