//! Single-resource allow/deny decisions.

use crate::resource::{MatchMode, ResourceId};
use crate::rules::{AllowSet, RuleSet};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a gating check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => f.write_str("allow"),
            Decision::Deny => f.write_str("deny"),
        }
    }
}

/// Which step of the evaluation produced a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reason {
    /// The override predicate held.
    Override,
    /// A deny rule matched.
    Denied { rule: String },
    /// An allow rule matched.
    Allowed { rule: String },
    /// Nothing matched.
    DefaultDeny,
    /// The identifier was malformed.
    Malformed,
}

/// A decision together with its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: Decision,
    pub reason: Reason,
}

impl Verdict {
    fn allow(reason: Reason) -> Self {
        Self {
            decision: Decision::Allow,
            reason,
        }
    }

    fn deny(reason: Reason) -> Self {
        Self {
            decision: Decision::Deny,
            reason,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Reason::Override => write!(f, "{} (override)", self.decision),
            Reason::Denied { rule } => write!(f, "{} (deny rule '{rule}')", self.decision),
            Reason::Allowed { rule } => write!(f, "{} (allow rule '{rule}')", self.decision),
            Reason::DefaultDeny => write!(f, "{} (no matching rule)", self.decision),
            Reason::Malformed => write!(f, "{} (malformed identifier)", self.decision),
        }
    }
}

/// Decides allow/deny for one resource of one domain.
///
/// Order is fixed: override, then deny rules, then allow rules, then
/// default deny. The evaluator holds only the domain's matching mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyEvaluator {
    mode: MatchMode,
}

impl PolicyEvaluator {
    pub fn new(mode: MatchMode) -> Self {
        Self { mode }
    }

    /// Decide for `resource`. Malformed identifiers are denied.
    pub fn evaluate(
        &self,
        resource: &ResourceId,
        override_granted: bool,
        deny: &RuleSet,
        allow: &AllowSet,
    ) -> Decision {
        self.explain(resource, override_granted, deny, allow).decision
    }

    /// Like [`evaluate`](Self::evaluate), but report a malformed identifier
    /// as an error instead of denying.
    pub fn try_evaluate(
        &self,
        resource: &ResourceId,
        override_granted: bool,
        deny: &RuleSet,
        allow: &AllowSet,
    ) -> Result<Decision> {
        resource.validate()?;
        Ok(self.evaluate(resource, override_granted, deny, allow))
    }

    /// Decide for `resource` and report which rule fired.
    pub fn explain(
        &self,
        resource: &ResourceId,
        override_granted: bool,
        deny: &RuleSet,
        allow: &AllowSet,
    ) -> Verdict {
        if let Err(e) = resource.validate() {
            tracing::warn!(error = %e, "denying malformed resource identifier");
            return Verdict::deny(Reason::Malformed);
        }

        let verdict = if override_granted {
            Verdict::allow(Reason::Override)
        } else if let Some(rule) = deny.matching(resource.as_str(), self.mode) {
            Verdict::deny(Reason::Denied {
                rule: rule.to_string(),
            })
        } else if let Some(rule) = allow.matching(resource, self.mode) {
            Verdict::allow(Reason::Allowed { rule })
        } else {
            Verdict::deny(Reason::DefaultDeny)
        };

        tracing::debug!(resource = %resource, mode = %self.mode, verdict = %verdict, "evaluated");
        verdict
    }
}

/// Evaluate with prefix matching, the mode used for route paths.
pub fn evaluate(
    resource: &ResourceId,
    override_granted: bool,
    deny: &RuleSet,
    allow: &AllowSet,
) -> Decision {
    PolicyEvaluator::new(MatchMode::Prefix).evaluate(resource, override_granted, deny, allow)
}
