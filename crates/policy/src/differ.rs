//! Batch suppression diffs over a whole catalog.

use crate::catalog::Catalog;
use crate::resource::{Category, MatchMode, ResourceId};
use crate::rules::AllowSet;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// What to do with a catalog category the allow set never mentions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentCategory {
    /// Treat the category's allow set as empty: suppress all of it.
    #[default]
    Suppress,
    /// Leave the category untouched.
    Ignore,
}

/// Catalog items to suppress, grouped by category.
///
/// Sparse: a category appears only if something in it must be suppressed.
/// Categories and items keep catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuppressionDiff(IndexMap<Category, IndexSet<ResourceId>>);

impl SuppressionDiff {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of categories with something to suppress.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Number of suppressed items across all categories.
    pub fn total(&self) -> usize {
        self.0.values().map(IndexSet::len).sum()
    }

    pub fn get(&self, category: &str) -> Option<&IndexSet<ResourceId>> {
        self.0.get(category)
    }

    pub fn contains(&self, category: &str, id: &str) -> bool {
        self.get(category).is_some_and(|ids| ids.contains(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, &IndexSet<ResourceId>)> {
        self.0.iter()
    }

    /// Flatten into `category:item` identifiers, in order.
    pub fn qualified(&self) -> Vec<ResourceId> {
        self.iter()
            .flat_map(|(category, ids)| {
                ids.iter()
                    .map(move |id| ResourceId::qualified(category, id.as_str()))
            })
            .collect()
    }
}

/// Computes which catalog items a domain must suppress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogDiffer {
    mode: MatchMode,
    absent: AbsentCategory,
}

impl CatalogDiffer {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            absent: AbsentCategory::default(),
        }
    }

    pub fn with_absent_category(mut self, absent: AbsentCategory) -> Self {
        self.absent = absent;
        self
    }

    /// `catalog - allow`, per category, skipping always-allowed items.
    pub fn diff(&self, catalog: &Catalog, allow: &AllowSet) -> SuppressionDiff {
        let mut disabled = IndexMap::new();

        for (category, entries) in catalog.by_category() {
            if self.absent == AbsentCategory::Ignore && !allow.covers_category(category.as_str())
            {
                tracing::debug!(%category, "category absent from allow set, left untouched");
                continue;
            }

            let ids: IndexSet<ResourceId> = entries
                .into_iter()
                .filter(|entry| {
                    if entry.id.is_malformed() {
                        tracing::warn!(%category, "skipping catalog entry with empty identifier");
                        return false;
                    }
                    !entry.always_allowed && !allow.permits_entry(entry, self.mode)
                })
                .map(|entry| entry.id.clone())
                .collect();

            if !ids.is_empty() {
                disabled.insert(category, ids);
            }
        }

        let diff = SuppressionDiff(disabled);
        tracing::debug!(
            catalog = catalog.len(),
            categories = diff.len(),
            suppressed = diff.total(),
            "computed suppression diff"
        );
        diff
    }
}

/// Exact-match diff where an absent category suppresses everything in it.
pub fn diff_disabled(catalog: &Catalog, allow: &AllowSet) -> SuppressionDiff {
    CatalogDiffer::new(MatchMode::Exact).diff(catalog, allow)
}
