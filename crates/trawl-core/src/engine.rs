//! Search engines used to build fallback "search dork" links.

use crate::error::TrawlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A web search engine with a query-string base URL.
///
/// Deserialization never fails: unknown names fall back to the default
/// engine through [`SearchEngine::guard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SearchEngine {
    /// duckduckgo.com
    #[default]
    DuckDuckGo,
    /// google.com
    Google,
    /// search.brave.com
    Brave,
    /// bing.com
    Bing,
    /// yandex.com
    Yandex,
    /// baidu.com
    Baidu,
    /// zoomeye.ai
    ZoomEye,
    /// dogpile.com
    DogPile,
}

impl SearchEngine {
    /// Every supported engine, in display order.
    pub const ALL: [Self; 8] = [
        Self::DuckDuckGo,
        Self::Google,
        Self::Brave,
        Self::Bing,
        Self::Yandex,
        Self::Baidu,
        Self::ZoomEye,
        Self::DogPile,
    ];

    /// Base URL the URL-encoded query is appended to.
    #[must_use]
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::DuckDuckGo => "https://duckduckgo.com/?q=",
            Self::Google => "https://www.google.com/search?q=",
            Self::Brave => "https://search.brave.com/search?q=",
            Self::Bing => "https://www.bing.com/search?q=",
            Self::Yandex => "https://yandex.com/search/?text=",
            Self::Baidu => "https://www.baidu.com/s?wd=",
            Self::ZoomEye => "https://www.zoomeye.ai/search?q=",
            Self::DogPile => "https://www.dogpile.com/serp?q=",
        }
    }

    /// Canonical display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DuckDuckGo => "DuckDuckGo",
            Self::Google => "Google",
            Self::Brave => "Brave",
            Self::Bing => "Bing",
            Self::Yandex => "Yandex",
            Self::Baidu => "Baidu",
            Self::ZoomEye => "ZoomEye",
            Self::DogPile => "DogPile",
        }
    }

    /// Resolve an engine name, case-insensitively, falling back to the
    /// default engine for anything unrecognized.
    #[must_use]
    pub fn guard(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            if !name.trim().is_empty() {
                tracing::debug!(engine = %name, "unknown search engine, using default");
            }
            Self::default()
        })
    }
}

impl FromStr for SearchEngine {
    type Err = TrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|engine| engine.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TrawlError::Validation(format!("unknown search engine: '{wanted}'")))
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<String> for SearchEngine {
    fn from(value: String) -> Self {
        Self::guard(&value)
    }
}

impl From<SearchEngine> for String {
    fn from(engine: SearchEngine) -> Self {
        engine.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_known_names() {
        assert_eq!(SearchEngine::guard("Google"), SearchEngine::Google);
        assert_eq!(SearchEngine::guard("  bing "), SearchEngine::Bing);
        assert_eq!(SearchEngine::guard("DOGPILE"), SearchEngine::DogPile);
    }

    #[test]
    fn test_guard_unknown_falls_back_to_default() {
        for name in ["", "AltaVista", "google.com"] {
            assert_eq!(SearchEngine::guard(name), SearchEngine::DuckDuckGo);
        }
    }

    #[test]
    fn test_from_str_is_strict() {
        assert!("AltaVista".parse::<SearchEngine>().is_err());
        assert_eq!(
            "yandex".parse::<SearchEngine>().expect("parse yandex"),
            SearchEngine::Yandex
        );
    }

    #[test]
    fn test_base_urls_are_query_prefixes() {
        for engine in SearchEngine::ALL {
            let base = engine.base_url();
            assert!(base.starts_with("https://"), "{engine}: {base}");
            assert!(base.ends_with('='), "{engine}: {base}");
        }
    }

    #[test]
    fn test_serde_guards_unknown_engine() {
        let engine: SearchEngine = serde_json::from_str("\"Lycos\"").expect("deserialize engine");
        assert_eq!(engine, SearchEngine::DuckDuckGo);

        let json = serde_json::to_string(&SearchEngine::ZoomEye).expect("serialize engine");
        assert_eq!(json, "\"ZoomEye\"");
    }
}
