//! Shared types used across the Trawl engine.
//!
//! [`Query`] is the caller-owned identity being searched for and [`Hit`] is one
//! unit of evidence, either produced by a probe or synthesised as a fallback
//! link. [`SourceName`] names a registered source.

use crate::error::TrawlError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Maximum number of characters kept in a [`Hit`] snippet.
pub const SNIPPET_MAX_CHARS: usize = 300;

/// Maximum length of a source name.
const SOURCE_NAME_MAX_LEN: usize = 80;

/// Newtype for source names with validation.
///
/// Source names are human-readable labels such as `"HaveIBeenPwned"` or
/// `"Username Pack (direct)"`. They must be non-blank and at most 80 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceName(String);

impl SourceName {
    /// Create a new `SourceName`, trimming surrounding whitespace.
    ///
    /// # Errors
    /// Returns error if the name is blank or longer than 80 characters.
    pub fn new(name: impl Into<String>) -> Result<Self, TrawlError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(TrawlError::Validation(
                "invalid source name: must not be empty".to_string(),
            ));
        }
        if name.chars().count() > SOURCE_NAME_MAX_LEN {
            return Err(TrawlError::Validation(format!(
                "invalid source name: must be at most {SOURCE_NAME_MAX_LEN} characters, got '{name}'"
            )));
        }
        Ok(Self(name))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SourceName {
    type Error = TrawlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SourceName {
    type Error = TrawlError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SourceName> for String {
    fn from(name: SourceName) -> Self {
        name.0
    }
}

impl AsRef<str> for SourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fields of a [`Query`], used by probes and filters to declare what they need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryField {
    /// Account handle
    Username,
    /// Person's full name
    FullName,
    /// Email address
    Email,
    /// Phone number
    Phone,
    /// Any part of a postal address
    Address,
}

impl QueryField {
    /// Get a human-readable display name for the field.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Username => "Username",
            Self::FullName => "Full Name",
            Self::Email => "Email Address",
            Self::Phone => "Phone Number",
            Self::Address => "Address",
        }
    }
}

impl fmt::Display for QueryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Identity to search for.
///
/// All fields are optional; by convention at least one is non-empty. The
/// query is owned by the caller and passed by reference into every probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    username: Option<String>,
    full_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,
}

impl Query {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the username.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the full name.
    #[must_use]
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Set the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Set the street address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the city, state and ZIP code. Blank parts are ignored.
    #[must_use]
    pub fn with_locality(
        mut self,
        city: impl Into<String>,
        state: impl Into<String>,
        zip: impl Into<String>,
    ) -> Self {
        self.city = Some(city.into());
        self.state = Some(state.into());
        self.zip = Some(zip.into());
        self
    }

    /// The username, if present and non-blank.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        non_blank(self.username.as_deref())
    }

    /// The full name, if present and non-blank.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        non_blank(self.full_name.as_deref())
    }

    /// The email address, if present and non-blank.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }

    /// The phone number, if present and non-blank.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        non_blank(self.phone.as_deref())
    }

    /// The street address, if present and non-blank.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        non_blank(self.address.as_deref())
    }

    #[must_use]
    pub fn city(&self) -> Option<&str> {
        non_blank(self.city.as_deref())
    }

    #[must_use]
    pub fn state(&self) -> Option<&str> {
        non_blank(self.state.as_deref())
    }

    #[must_use]
    pub fn zip(&self) -> Option<&str> {
        non_blank(self.zip.as_deref())
    }

    /// Present address parts in street, city, state, ZIP order.
    #[must_use]
    pub fn address_parts(&self) -> Vec<&str> {
        [self.address(), self.city(), self.state(), self.zip()]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Digits of the phone number, if it contains any.
    #[must_use]
    pub fn phone_digits(&self) -> Option<String> {
        let digits: String = self.phone()?.chars().filter(char::is_ascii_digit).collect();
        (!digits.is_empty()).then_some(digits)
    }

    /// First word of the full name.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.full_name()?.split_whitespace().next()
    }

    /// Last word of the full name, when the name has more than one word.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        let mut parts = self.full_name()?.split_whitespace();
        parts.next()?;
        parts.last()
    }

    /// Domain part of the email address.
    #[must_use]
    pub fn email_domain(&self) -> Option<&str> {
        let (_, domain) = self.email()?.rsplit_once('@')?;
        let domain = domain.trim();
        (!domain.is_empty()).then_some(domain)
    }

    /// Whether the given field is present.
    #[must_use]
    pub fn has(&self, field: QueryField) -> bool {
        match field {
            QueryField::Username => self.username().is_some(),
            QueryField::FullName => self.full_name().is_some(),
            QueryField::Email => self.email().is_some(),
            QueryField::Phone => self.phone_digits().is_some(),
            QueryField::Address => !self.address_parts().is_empty(),
        }
    }

    /// Whether every field is absent or blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username().is_none()
            && self.full_name().is_none()
            && self.email().is_none()
            && self.phone_digits().is_none()
            && self.address_parts().is_empty()
    }

    /// Return the canonical form used for hashing and probing.
    ///
    /// Every field is trimmed and blank fields become absent. Username, full
    /// name, email and address parts are lowercased, runs of whitespace in
    /// the full name and address parts collapse to one space, and the phone
    /// number keeps only its digits.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            username: self.username().map(str::to_lowercase),
            full_name: self
                .full_name()
                .map(|name| name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()),
            email: self.email().map(str::to_lowercase),
            phone: self.phone_digits(),
            address: self.address().map(collapse_lower),
            city: self.city().map(collapse_lower),
            state: self.state().map(collapse_lower),
            zip: self.zip().map(collapse_lower),
        }
    }

    /// Lowercased search tokens, de-duplicated, in field order.
    ///
    /// Tokens are the username, the full name and each of its parts, the
    /// email, the phone digits and each address part.
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        let normalized = self.normalized();
        let mut candidates: Vec<String> = Vec::new();
        if let Some(username) = normalized.username() {
            candidates.push(username.to_string());
        }
        if let Some(name) = normalized.full_name() {
            candidates.push(name.to_string());
            candidates.extend(name.split_whitespace().map(str::to_string));
        }
        if let Some(email) = normalized.email() {
            candidates.push(email.to_string());
        }
        if let Some(phone) = normalized.phone() {
            candidates.push(phone.to_string());
        }
        candidates.extend(normalized.address_parts().into_iter().map(str::to_string));

        let mut tokens: Vec<String> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !tokens.contains(&candidate) {
                tokens.push(candidate);
            }
        }
        tokens
    }

    /// Ordered field map of the normalized query, with absent fields as
    /// empty strings. This is the canonical payload for cache keys.
    #[must_use]
    pub fn canonical_fields(&self) -> BTreeMap<&'static str, String> {
        let normalized = self.normalized();
        let mut fields = BTreeMap::new();
        fields.insert("address", normalized.address.unwrap_or_default());
        fields.insert("city", normalized.city.unwrap_or_default());
        fields.insert("email", normalized.email.unwrap_or_default());
        fields.insert("full_name", normalized.full_name.unwrap_or_default());
        fields.insert("phone", normalized.phone.unwrap_or_default());
        fields.insert("state", normalized.state.unwrap_or_default());
        fields.insert("username", normalized.username.unwrap_or_default());
        fields.insert("zip", normalized.zip.unwrap_or_default());
        fields
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn collapse_lower(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// One unit of evidence returned by a probe or synthesised as a fallback.
///
/// `raw` holds flags such as `exists`, `code`, `fallback` and `probed`. Hits
/// are built once and not mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Source the hit belongs to
    pub site: String,
    /// Short human-readable title
    pub title: String,
    /// Bounded excerpt of fetched content
    pub snippet: String,
    /// Link to the evidence
    pub url: String,
    /// Flags describing how the hit was produced
    #[serde(default)]
    pub raw: BTreeMap<String, Value>,
}

impl Hit {
    /// Create a hit. The snippet is whitespace-collapsed and truncated to
    /// [`SNIPPET_MAX_CHARS`].
    #[must_use]
    pub fn new(
        site: impl Into<String>,
        title: impl Into<String>,
        snippet: impl AsRef<str>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            site: site.into(),
            title: title.into(),
            snippet: truncate_snippet(snippet.as_ref(), SNIPPET_MAX_CHARS),
            url: url.into(),
            raw: BTreeMap::new(),
        }
    }

    /// Attach a flag to the hit.
    #[must_use]
    pub fn with_flag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.raw.insert(key.into(), value.into());
        self
    }

    /// Look up a flag.
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Whether this hit is a synthesised fallback link.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.raw.contains_key("fallback")
    }
}

/// Collapse whitespace runs and keep at most `max_chars` characters.
#[must_use]
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_name_valid() {
        let name = SourceName::new("  Username Pack (direct) ").expect("valid source name");
        assert_eq!(name.as_str(), "Username Pack (direct)");
        assert_eq!(name.to_string(), "Username Pack (direct)");
    }

    #[test]
    fn test_source_name_invalid() {
        let too_long = "a".repeat(81);
        for name in ["", "   ", too_long.as_str()] {
            assert!(SourceName::new(name).is_err(), "Should fail for: {name:?}");
        }
    }

    #[test]
    fn test_source_name_serde() {
        let name = SourceName::new("Wayback").expect("valid source name");
        let json = serde_json::to_string(&name).expect("serialize source name");
        assert_eq!(json, "\"Wayback\"");

        let err = serde_json::from_str::<SourceName>("\"  \"");
        assert!(err.is_err());
    }

    #[test]
    fn test_query_accessors_ignore_blank_fields() {
        let query = Query::new().with_username("   ").with_email("a@b.com");
        assert_eq!(query.username(), None);
        assert_eq!(query.email(), Some("a@b.com"));
        assert!(!query.is_empty());
        assert!(Query::new().with_full_name("  ").is_empty());
    }

    #[test]
    fn test_query_normalized() {
        let query = Query::new()
            .with_username(" Me0w.Me0w ")
            .with_full_name("  Jane   Q  Doe ")
            .with_email(" Jane@Example.COM")
            .with_phone("+1 (555) 010-9999");

        let normalized = query.normalized();
        assert_eq!(normalized.username(), Some("me0w.me0w"));
        assert_eq!(normalized.full_name(), Some("jane q doe"));
        assert_eq!(normalized.email(), Some("jane@example.com"));
        assert_eq!(normalized.phone(), Some("15550109999"));
        assert_eq!(normalized.normalized(), normalized);
    }

    #[test]
    fn test_query_name_parts() {
        let query = Query::new().with_full_name("Jane Q Doe");
        assert_eq!(query.first_name(), Some("Jane"));
        assert_eq!(query.last_name(), Some("Doe"));

        let single = Query::new().with_full_name("Cher");
        assert_eq!(single.first_name(), Some("Cher"));
        assert_eq!(single.last_name(), None);
    }

    #[test]
    fn test_query_email_domain() {
        assert_eq!(
            Query::new().with_email("a@b.com").email_domain(),
            Some("b.com")
        );
        assert_eq!(Query::new().with_email("nodomain").email_domain(), None);
        assert_eq!(Query::new().with_email("a@").email_domain(), None);
    }

    #[test]
    fn test_query_tokens_deduplicated() {
        let query = Query::new()
            .with_username("Doe")
            .with_full_name("Jane Doe")
            .with_phone("555-0100");

        assert_eq!(query.tokens(), vec!["doe", "jane doe", "jane", "5550100"]);
    }

    #[test]
    fn test_query_has_field() {
        let query = Query::new().with_phone("no digits");
        assert!(!query.has(QueryField::Phone));
        assert!(Query::new().with_phone("555").has(QueryField::Phone));
        assert!(!query.has(QueryField::Username));
    }

    #[test]
    fn test_query_address_parts() {
        let query = Query::new()
            .with_address(" 12  Elm St ")
            .with_locality("Springfield", "  ", "62701");

        assert!(query.has(QueryField::Address));
        assert!(!query.is_empty());
        assert_eq!(query.address_parts(), vec!["12  Elm St", "Springfield", "62701"]);

        let normalized = query.normalized();
        assert_eq!(normalized.address(), Some("12 elm st"));
        assert_eq!(normalized.state(), None);
        assert_eq!(query.tokens(), vec!["12 elm st", "springfield", "62701"]);
        assert!(!Query::new().with_locality(" ", "", " ").has(QueryField::Address));
    }

    #[test]
    fn test_canonical_fields_independent_of_casing() {
        let a = Query::new().with_username("ALICE").with_email("A@X.IO");
        let b = Query::new().with_email(" a@x.io ").with_username("alice");
        assert_eq!(a.canonical_fields(), b.canonical_fields());
    }

    #[test]
    fn test_hit_snippet_is_bounded() {
        let long = "word ".repeat(200);
        let hit = Hit::new("Test", "title", &long, "https://example.com");
        assert_eq!(hit.snippet.chars().count(), SNIPPET_MAX_CHARS);
        assert!(!hit.snippet.contains("  "));
    }

    #[test]
    fn test_hit_flags() {
        let hit = Hit::new("Test", "t", "s", "u")
            .with_flag("exists", true)
            .with_flag("code", 200);
        assert_eq!(hit.flag("exists"), Some(&Value::Bool(true)));
        assert_eq!(hit.flag("code").and_then(Value::as_u64), Some(200));
        assert!(!hit.is_fallback());
        assert!(hit.clone().with_flag("fallback", "dork").is_fallback());
    }

    #[test]
    fn test_hit_serialization() {
        let hit = Hit::new("Test", "t", "s", "u").with_flag("probed", true);
        let json = serde_json::to_string(&hit).expect("serialize hit");
        let parsed: Hit = serde_json::from_str(&json).expect("deserialize hit");
        assert_eq!(parsed, hit);

        let without_raw: Hit =
            serde_json::from_str(r#"{"site":"a","title":"b","snippet":"c","url":"d"}"#)
                .expect("deserialize hit without raw");
        assert!(without_raw.raw.is_empty());
    }

    #[test]
    fn test_truncate_snippet_multibyte() {
        let text = "é".repeat(10);
        assert_eq!(truncate_snippet(&text, 4), "éééé");
    }
}
