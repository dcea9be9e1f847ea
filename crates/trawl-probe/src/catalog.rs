//! Site catalog: every source the engine knows about, probed or not.
//!
//! The catalog supplies the domain, home URL and category used to build
//! fallback links. Sites without a registered probe still appear in scans
//! and resolve to fallback links only.

use crate::error::{ProbeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use trawl_core::SourceName;

/// Built-in catalog, embedded at compile time.
const BUILTIN_CATALOG: &str = include_str!("../sites.toml");

/// Categories of catalog sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SiteCategory {
    /// People search engines
    PeopleSearch,
    /// Reverse phone and address lookups
    ReversePhone,
    /// Property and assessor records
    Property,
    /// Court, criminal and government records
    CourtRecords,
    /// Username, email and breach tools
    Specialized,
    /// Non-US registries and services
    Worldwide,
    /// Public datasets such as web archives
    Dataset,
}

impl SiteCategory {
    /// Get a human-readable display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PeopleSearch => "People Search",
            Self::ReversePhone => "Reverse Phone / Address",
            Self::Property => "Property Records",
            Self::CourtRecords => "Court/Criminal/Gov",
            Self::Specialized => "Specialized / Extra",
            Self::Worldwide => "Worldwide",
            Self::Dataset => "Public Datasets",
        }
    }
}

impl fmt::Display for SiteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDefinition {
    /// Source name, matching the probe registry key
    pub name: String,
    /// Domain root used for `site:` dorks
    #[serde(default)]
    pub domain: Option<String>,
    /// Explicit home URL
    #[serde(default)]
    pub url: Option<String>,
    /// Site category
    pub category: SiteCategory,
}

impl SiteDefinition {
    /// Create a definition with only a name and category.
    #[must_use]
    pub fn new(name: impl Into<String>, category: SiteCategory) -> Self {
        Self {
            name: name.into(),
            domain: None,
            url: None,
            category,
        }
    }

    /// Set the domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the explicit home URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Home URL: the explicit URL, else `https://<domain>`.
    #[must_use]
    pub fn home_url(&self) -> Option<String> {
        self.url
            .clone()
            .or_else(|| self.domain.as_ref().map(|d| format!("https://{d}")))
    }

    /// Host part of the domain, without any path.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.domain
            .as_deref()
            .map(|d| d.split('/').next().unwrap_or(d))
    }

    /// Validate the definition.
    pub fn validate(&self) -> Result<()> {
        SourceName::new(self.name.as_str()).map_err(|e| ProbeError::InvalidSite {
            site: self.name.clone(),
            reason: e.to_string(),
        })?;

        if let Some(domain) = &self.domain {
            if domain.trim().is_empty() || domain.contains("://") || domain.contains(char::is_whitespace) {
                return Err(ProbeError::InvalidSite {
                    site: self.name.clone(),
                    reason: format!("domain must be a bare host, got '{domain}'"),
                });
            }
        }

        if let Some(url) = &self.url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ProbeError::InvalidSite {
                    site: self.name.clone(),
                    reason: format!("URL must be http(s), got '{url}'"),
                });
            }
        }

        Ok(())
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    site: Vec<SiteDefinition>,
}

/// Ordered, validated set of site definitions.
#[derive(Debug, Clone, Default)]
pub struct SiteCatalog {
    sites: Vec<SiteDefinition>,
}

impl SiteCatalog {
    /// The built-in catalog.
    ///
    /// # Panics
    /// Never in practice: the embedded catalog is checked by tests.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_CATALOG, "<builtin>").expect("valid built-in site catalog")
    }

    /// Parse and validate a catalog from TOML text.
    pub fn from_toml_str(contents: &str, origin: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents).map_err(|error| ProbeError::CatalogParse {
            path: origin.to_string(),
            error,
        })?;
        Self::from_sites(file.site)
    }

    /// Load a catalog file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&contents, &path.display().to_string())?;
        tracing::info!(count = catalog.len(), path = %path.display(), "loaded site catalog");
        Ok(catalog)
    }

    /// Build a catalog from definitions, validating each and rejecting
    /// duplicate names.
    pub fn from_sites(sites: Vec<SiteDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for site in &sites {
            site.validate()?;
            if !seen.insert(site.name.trim().to_string()) {
                return Err(ProbeError::InvalidSite {
                    site: site.name.clone(),
                    reason: "duplicate site name".to_string(),
                });
            }
        }
        Ok(Self { sites })
    }

    /// Look up a site by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SiteDefinition> {
        self.sites.iter().find(|site| site.name == name)
    }

    /// All sites in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &SiteDefinition> {
        self.sites.iter()
    }

    /// Site names in catalog order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.sites.iter().map(|site| site.name.as_str()).collect()
    }

    /// Sites in a category.
    #[must_use]
    pub fn by_category(&self, category: SiteCategory) -> Vec<&SiteDefinition> {
        self.sites
            .iter()
            .filter(|site| site.category == category)
            .collect()
    }

    /// Home URL for a site, if it has one.
    #[must_use]
    pub fn home_url(&self, name: &str) -> Option<String> {
        self.get(name).and_then(SiteDefinition::home_url)
    }

    /// Number of sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
