//! Cache keys.

use sha2::{Digest, Sha256};
use trawl_core::Query;

/// Lowercase hex SHA-256 of the normalized query's canonical JSON.
///
/// Field order, casing and surrounding whitespace do not affect the key.
#[must_use]
pub fn cache_key(query: &Query) -> String {
    let canonical = serde_json::to_string(&query.canonical_fields()).unwrap_or_default();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_hex_sha256() {
        let key = cache_key(&Query::new().with_username("jdoe"));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_key_ignores_case_whitespace_and_order() {
        let a = Query::new()
            .with_username("JDoe ")
            .with_full_name("Jane   Doe")
            .with_email("Jane@Example.org");
        let b = Query::new()
            .with_email("jane@example.org")
            .with_full_name(" jane doe")
            .with_username("jdoe");
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn test_phone_formatting_does_not_matter() {
        let a = Query::new().with_phone("(555) 010-0100");
        let b = Query::new().with_phone("555.010.0100");
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn test_address_is_part_of_the_key() {
        let a = Query::new()
            .with_full_name("Jane Doe")
            .with_address("12 Elm St")
            .with_locality("Springfield", "IL", "62701");
        let b = Query::new()
            .with_locality(" springfield", "il ", "62701")
            .with_address("12  ELM st")
            .with_full_name("jane doe");
        let elsewhere = Query::new()
            .with_full_name("Jane Doe")
            .with_address("14 Elm St")
            .with_locality("Springfield", "IL", "62701");

        assert_eq!(cache_key(&a), cache_key(&b));
        assert_ne!(cache_key(&a), cache_key(&elsewhere));
        assert_ne!(cache_key(&a), cache_key(&Query::new().with_full_name("Jane Doe")));
    }

    #[test]
    fn test_distinct_queries_have_distinct_keys() {
        let a = Query::new().with_username("jdoe");
        let b = Query::new().with_username("jdoe2");
        let c = Query::new().with_email("jdoe");
        assert_ne!(cache_key(&a), cache_key(&b));
        assert_ne!(cache_key(&a), cache_key(&c));
    }
}
