//! Identifiers for gated resources, their categories and domains.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Separator between category and item in a qualified identifier.
pub const CATEGORY_SEPARATOR: char = ':';

/// An opaque key identifying one gated resource.
///
/// Route paths (`/wp/v2/posts`), bare item names (`paragraph`) and
/// `category:item` pairs (`core:paragraph`) are all valid identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse an identifier, rejecting empty or whitespace-only input.
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = Self::new(id);
        id.validate()?;
        Ok(id)
    }

    /// Build a `category:item` identifier.
    pub fn qualified(category: &Category, item: &str) -> Self {
        Self(format!("{}{CATEGORY_SEPARATOR}{item}", category.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_malformed(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.is_malformed() {
            return Err(Error::Configuration(format!(
                "resource identifier must be non-empty, got {:?}",
                self.0
            )));
        }
        Ok(())
    }

    /// Split into `(category, item)` on the first separator.
    pub fn split_category(&self) -> Option<(&str, &str)> {
        self.0.split_once(CATEGORY_SEPARATOR)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ResourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Grouping key for catalog entries (a block namespace, a style's block, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Bucket for catalog entries that carry no category.
    pub const UNCATEGORIZED: &'static str = "uncategorized";

    pub fn new(category: impl Into<String>) -> Self {
        Self(category.into())
    }

    pub fn uncategorized() -> Self {
        Self::new(Self::UNCATEGORIZED)
    }

    /// Normalize an optional category, mapping missing or blank values to
    /// the uncategorized bucket.
    pub fn or_uncategorized(category: Option<&Category>) -> Self {
        match category {
            Some(c) if !c.0.trim().is_empty() => c.clone(),
            _ => Self::uncategorized(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(category: &str) -> Self {
        Self::new(category)
    }
}

impl From<String> for Category {
    fn from(category: String) -> Self {
        Self(category)
    }
}

impl Borrow<str> for Category {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// An independent gating context with its own catalog and rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    pub const REST_ROUTES: &'static str = "rest-routes";
    pub const BLOCK_TYPES: &'static str = "block-types";
    pub const BLOCK_STYLES: &'static str = "block-styles";
    pub const BLOCK_VARIATIONS: &'static str = "block-variations";
    pub const POST_TYPES: &'static str = "post-types";
    pub const USER_CAPABILITIES: &'static str = "user-capabilities";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Domain {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Domain {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for Domain {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// How rule entries are compared against identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The rule must equal the identifier.
    #[default]
    Exact,
    /// The identifier must start with the rule, ignoring a leading `/` on
    /// either side and ASCII case (so `wp/v2` covers `/wp/v2/posts`). The
    /// match must end at a `/` or the end of the identifier, so `wp/v2`
    /// does not cover `/wp/v22`.
    Prefix,
}

impl MatchMode {
    /// Test one rule against one identifier. An empty rule never matches.
    pub fn matches(self, rule: &str, id: &str) -> bool {
        if rule.is_empty() {
            return false;
        }
        match self {
            MatchMode::Exact => rule == id,
            MatchMode::Prefix => {
                prefix_matches(rule.trim_start_matches('/'), id.trim_start_matches('/'))
            }
        }
    }
}

/// ASCII case-insensitive prefix test that ends on a `/` boundary.
fn prefix_matches(rule: &str, id: &str) -> bool {
    let Some(head) = id.get(..rule.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(rule) {
        return false;
    }
    rule.is_empty()
        || rule.ends_with('/')
        || matches!(id[rule.len()..].chars().next(), None | Some('/'))
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Exact => f.write_str("exact"),
            MatchMode::Prefix => f.write_str("prefix"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_blank() {
        assert!(ResourceId::parse("").is_err());
        assert!(ResourceId::parse("   ").is_err());
        assert!(ResourceId::parse("/wp/v2/posts").is_ok());
    }

    #[test]
    fn test_qualified_round_trip() {
        let id = ResourceId::qualified(&Category::new("core"), "paragraph");
        assert_eq!(id.as_str(), "core:paragraph");
        assert_eq!(id.split_category(), Some(("core", "paragraph")));
        assert_eq!(ResourceId::new("paragraph").split_category(), None);
    }

    #[test]
    fn test_missing_category_is_uncategorized() {
        assert_eq!(Category::or_uncategorized(None).as_str(), "uncategorized");
        let blank = Category::new(" ");
        assert_eq!(
            Category::or_uncategorized(Some(&blank)).as_str(),
            "uncategorized"
        );
        let core = Category::new("core");
        assert_eq!(Category::or_uncategorized(Some(&core)), core);
    }

    #[test]
    fn test_prefix_ignores_leading_slash() {
        let mode = MatchMode::Prefix;
        assert!(mode.matches("wp/v2", "/wp/v2/posts"));
        assert!(mode.matches("/wp/v2/users", "/wp/v2/users/1"));
        assert!(mode.matches("/", "/anything"));
        assert!(!mode.matches("/wp/v2/users", "/wp/v2/posts"));
        assert!(!mode.matches("", "/wp/v2/posts"));
    }

    #[test]
    fn test_prefix_stops_at_segment_boundary() {
        let mode = MatchMode::Prefix;
        assert!(mode.matches("wp/v2", "/wp/v2"));
        assert!(mode.matches("wp/v2", "/wp/v2/"));
        assert!(mode.matches("core/", "core/paragraph"));
        assert!(!mode.matches("wp/v2", "/wp/v22/x"));
        assert!(!mode.matches("wp/v2", "/wp/v2-evil/x"));
        assert!(!mode.matches("wp/v2/", "/wp/v2"));
    }

    #[test]
    fn test_prefix_ignores_ascii_case() {
        let mode = MatchMode::Prefix;
        assert!(mode.matches("/wp/v2/users", "/wp/v2/USERS"));
        assert!(mode.matches("/wp/v2/users", "/WP/V2/Users/1"));
        assert!(!mode.matches("/wp/v2/users", "/wp/v2/ü"));
    }

    #[test]
    fn test_exact_is_exact() {
        let mode = MatchMode::Exact;
        assert!(mode.matches("paragraph", "paragraph"));
        assert!(!mode.matches("para", "paragraph"));
        assert!(!mode.matches("/paragraph", "paragraph"));
    }
}
