//! Allow and deny rule sets.
//!
//! Both sets are plain data: callers merge every configuration source for a
//! domain into one set before handing it to the evaluator or differ.

use crate::catalog::CatalogEntry;
use crate::resource::{Category, MatchMode, ResourceId};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// An insertion-ordered, de-duplicated set of rule strings.
///
/// Used for deny sets and for the uncategorized part of allow sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(IndexSet<String>);

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Add a rule. Returns `false` if it was already present.
    pub fn insert(&mut self, rule: impl Into<String>) -> bool {
        self.0.insert(rule.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Union another set into this one, keeping first-seen order.
    pub fn merge(&mut self, other: RuleSet) {
        self.0.extend(other.0);
    }

    /// First rule that matches `id`, if any.
    ///
    /// Which rule is reported when several match carries no meaning; the
    /// test itself is existential.
    pub fn matching(&self, id: &str, mode: MatchMode) -> Option<&str> {
        self.iter().find(|rule| mode.matches(rule, id))
    }

    pub fn matches(&self, id: &str, mode: MatchMode) -> bool {
        self.matching(id, mode).is_some()
    }
}

impl<S: Into<String>> FromIterator<S> for RuleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for RuleSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// Explicit opt-in for a domain.
///
/// `global` rules are matched against whole identifiers in every category.
/// `categories` maps a category to the item names allowed inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowSet {
    #[serde(default)]
    pub global: RuleSet,
    #[serde(default)]
    pub categories: IndexMap<Category, IndexSet<String>>,
}

impl AllowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// An allow set made only of whole-identifier rules.
    pub fn flat<S: Into<String>>(rules: impl IntoIterator<Item = S>) -> Self {
        Self {
            global: rules.into_iter().collect(),
            categories: IndexMap::new(),
        }
    }

    /// Add items to a category, creating it if needed.
    pub fn with_category<S: Into<String>>(
        mut self,
        category: impl Into<Category>,
        items: impl IntoIterator<Item = S>,
    ) -> Self {
        self.allow_in(category, items);
        self
    }

    pub fn allow_in<S: Into<String>>(
        &mut self,
        category: impl Into<Category>,
        items: impl IntoIterator<Item = S>,
    ) {
        self.categories
            .entry(category.into())
            .or_default()
            .extend(items.into_iter().map(Into::into));
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.categories.values().all(IndexSet::is_empty)
    }

    /// Items allowed in `category`, if the category is configured at all.
    pub fn category(&self, category: &str) -> Option<&IndexSet<String>> {
        self.categories.get(category)
    }

    /// Whether any rule speaks about `category`.
    ///
    /// Global rules apply everywhere, so a non-empty global set covers every
    /// category.
    pub fn covers_category(&self, category: &str) -> bool {
        !self.global.is_empty() || self.categories.contains_key(category)
    }

    /// Union another allow set into this one.
    pub fn merge(&mut self, other: AllowSet) {
        self.global.merge(other.global);
        for (category, items) in other.categories {
            self.categories.entry(category).or_default().extend(items);
        }
    }

    /// The rule that permits `id`, rendered for diagnostics.
    ///
    /// A `category:item` identifier is also looked up under its category;
    /// an identifier with no (or a blank) category falls in the
    /// uncategorized bucket, as catalog entries do.
    pub fn matching(&self, id: &ResourceId, mode: MatchMode) -> Option<String> {
        if let Some(rule) = self.global.matching(id.as_str(), mode) {
            return Some(rule.to_string());
        }

        let (category, item) = match id.split_category() {
            Some((category, item)) if !category.trim().is_empty() => (category, item),
            Some((_, item)) => (Category::UNCATEGORIZED, item),
            None => (Category::UNCATEGORIZED, id.as_str()),
        };
        self.category(category)?
            .iter()
            .find(|rule| mode.matches(rule, item))
            .map(|rule| format!("{category}:{rule}"))
    }

    pub fn permits(&self, id: &ResourceId, mode: MatchMode) -> bool {
        self.matching(id, mode).is_some()
    }

    /// Whether a catalog entry is explicitly allowed.
    pub fn permits_entry(&self, entry: &CatalogEntry, mode: MatchMode) -> bool {
        let id = entry.id.as_str();
        if self.global.matches(id, mode) {
            return true;
        }
        let category = entry.category();
        self.category(category.as_str())
            .is_some_and(|items| items.iter().any(|rule| mode.matches(rule, id)))
    }
}
