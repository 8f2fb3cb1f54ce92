//! Resource gating: allow/deny decisions and suppression diffs.
//!
//! A *domain* (REST routes, block types, block styles, post types, ...) owns a
//! catalog of resources, an allow set, an optional deny set and an override
//! predicate. This crate answers two questions about a domain:
//!
//! 1. **Should this resource be exposed?** [`PolicyEvaluator`] applies, in
//!    order: override ⇒ allow, deny rule ⇒ deny, allow rule ⇒ allow,
//!    otherwise deny.
//!
//! 2. **What must be hidden?** [`CatalogDiffer`] computes, per category,
//!    the catalog items not covered by the allow set, skipping items flagged
//!    always-allowed.
//!
//! Both are pure functions of their inputs. Catalogs and rule sets are read
//! fresh from a [`ConfigProvider`] and a [`CatalogProvider`] on every call;
//! nothing is cached between calls.
//!
//! # Failing closed
//!
//! Malformed identifiers are denied (or left out of a diff) instead of
//! raising. Unknown domains are reported as [`Error::UnknownDomain`] by the
//! `try_*` entry points, and turned into a denial by [`Gate::check`].
//!
//! # Example
//!
//! ```
//! use policy::{Decision, Domain, Gate, GateContext, StaticConfig};
//!
//! let config = StaticConfig::parse(r#"
//! [domains.rest-routes]
//! match = "prefix"
//! allow = ["wp/v2"]
//! deny = ["/wp/v2/users"]
//! override_capability = "manage_options"
//!
//! [domains.block-types.allow_categories]
//! core = ["paragraph"]
//!
//! [[domains.block-types.catalog]]
//! id = "paragraph"
//! category = "core"
//!
//! [[domains.block-types.catalog]]
//! id = "html"
//! category = "core"
//! "#)?;
//!
//! let gate = Gate::new(&config, &config);
//! let routes = Domain::from(Domain::REST_ROUTES);
//! let ctx = GateContext::new();
//!
//! assert_eq!(gate.check(&routes, &"/wp/v2/posts".into(), &ctx), Decision::Allow);
//! assert_eq!(gate.check(&routes, &"/wp/v2/users".into(), &ctx), Decision::Deny);
//!
//! let hidden = gate.suppressions(&Domain::BLOCK_TYPES.into())?;
//! assert!(hidden.contains("core", "html"));
//! # Ok::<(), policy::Error>(())
//! ```

mod catalog;
mod config;
mod differ;
mod error;
mod evaluator;
mod gate;
mod provider;
mod resource;
mod rules;

pub use catalog::{Catalog, CatalogEntry};
pub use config::{DomainConfig, StaticConfig};
pub use differ::{AbsentCategory, CatalogDiffer, SuppressionDiff, diff_disabled};
pub use error::{Error, Result};
pub use evaluator::{Decision, PolicyEvaluator, Reason, Verdict, evaluate};
pub use gate::Gate;
pub use provider::{CatalogProvider, ConfigProvider, DomainSettings, GateContext, Layered};
pub use resource::{CATEGORY_SEPARATOR, Category, Domain, MatchMode, ResourceId};
pub use rules::{AllowSet, RuleSet};
