#![allow(clippy::must_use_candidate)]

use trawl_probe::{SiteCategory, SiteDefinition};

/// Narrows which sources a scan covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SourceFilter {
    /// Every registered probe and every catalog site
    #[default]
    All,
    /// Only sources in a catalog category
    Category(SiteCategory),
    /// Only the named sources
    Names(Vec<String>),
}

impl SourceFilter {
    /// Filter for the given names.
    pub fn names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, name: &str, site: Option<&SiteDefinition>) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Category(category) => site.is_some_and(|s| s.category == *category),
            SourceFilter::Names(names) => names.iter().any(|n| n.trim() == name),
        }
    }

    /// Requested names that are neither registered nor in the catalog.
    pub fn unknown_names<'a>(&'a self, known: &[&str]) -> Vec<&'a str> {
        match self {
            SourceFilter::Names(names) => names
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty() && !known.contains(n))
                .collect(),
            _ => Vec::new(),
        }
    }
}
