//! Enumerable resource catalogs.

use crate::resource::{Category, ResourceId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One resource a domain could expose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ResourceId,

    /// Parent category. Missing or blank means uncategorized.
    #[serde(default)]
    pub category: Option<Category>,

    /// Never suppressed, whatever the allow set says.
    #[serde(default)]
    pub always_allowed: bool,
}

impl CatalogEntry {
    pub fn new(id: impl Into<ResourceId>) -> Self {
        Self {
            id: id.into(),
            category: None,
            always_allowed: false,
        }
    }

    pub fn in_category(mut self, category: impl Into<Category>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn always_allowed(mut self) -> Self {
        self.always_allowed = true;
        self
    }

    /// The effective category of this entry.
    pub fn category(&self) -> Category {
        Category::or_uncategorized(self.category.as_ref())
    }
}

/// Ordered snapshot of a domain's registry.
///
/// Built fresh for every evaluation; the core never keeps one around.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(Vec<CatalogEntry>);

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: CatalogEntry) {
        self.0.push(entry);
    }

    /// Append an entry in `category`.
    pub fn with(mut self, category: impl Into<Category>, id: impl Into<ResourceId>) -> Self {
        self.push(CatalogEntry::new(id).in_category(category));
        self
    }

    /// Append an always-allowed entry in `category`.
    pub fn with_always_allowed(
        mut self,
        category: impl Into<Category>,
        id: impl Into<ResourceId>,
    ) -> Self {
        self.push(CatalogEntry::new(id).in_category(category).always_allowed());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.0.iter()
    }

    /// Entries grouped by effective category, in order of first appearance.
    pub fn by_category(&self) -> IndexMap<Category, Vec<&CatalogEntry>> {
        let mut groups: IndexMap<Category, Vec<&CatalogEntry>> = IndexMap::new();
        for entry in &self.0 {
            groups.entry(entry.category()).or_default().push(entry);
        }
        groups
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
