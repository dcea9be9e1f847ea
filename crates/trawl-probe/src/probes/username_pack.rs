//! Direct profile checks across major platforms for a username.

use crate::error::Result;
use crate::probe::Probe;
use crate::term_probe::quote_plus;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use trawl_core::{truncate_snippet, Hit, Query};
use trawl_fetch::FetchClient;

/// Source name of the username pack.
pub const USERNAME_PACK: &str = "Username Pack (direct)";

/// Default number of positives after which the pack stops checking.
pub const DEFAULT_MAX_POSITIVES: usize = 8;

/// Profile checks in flight at once.
const CONCURRENT_CHECKS: usize = 6;

/// Snippet length for found-profile hits.
const FOUND_SNIPPET_CHARS: usize = 220;

/// One platform the pack checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Display name, e.g. `GitHub`
    pub name: String,
    /// Profile URL with a `{u}` placeholder for the username
    pub url_template: String,
    /// Pattern a 200 body must match to count as found; `{u}` expands to
    /// the escaped, lowercased username
    pub verify: Option<String>,
    /// Lowercase the username before building the URL
    pub lowercase: bool,
}

impl Service {
    /// A service that counts any 200 as found.
    #[must_use]
    pub fn new(name: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            verify: None,
            lowercase: false,
        }
    }

    /// Require the body to match `pattern`.
    #[must_use]
    pub fn verify(mut self, pattern: impl Into<String>) -> Self {
        self.verify = Some(pattern.into());
        self
    }

    /// Lowercase the username in the profile URL.
    #[must_use]
    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    /// Profile URL for a username.
    #[must_use]
    pub fn profile_url(&self, username: &str) -> String {
        let user = if self.lowercase {
            username.to_lowercase()
        } else {
            username.to_string()
        };
        self.url_template.replace("{u}", &quote_plus(&user))
    }

    fn verify_regex(&self, username: &str) -> Option<std::result::Result<Regex, regex::Error>> {
        self.verify.as_ref().map(|pattern| {
            let pattern = pattern.replace("{u}", &regex::escape(&username.to_lowercase()));
            RegexBuilder::new(&pattern).case_insensitive(true).build()
        })
    }
}

/// The built-in service table.
#[must_use]
pub fn builtin_services() -> Vec<Service> {
    vec![
        Service::new("GitHub", "https://github.com/{u}").verify(r"<title>[^<]*?github[^<]*"),
        Service::new("Reddit", "https://www.reddit.com/user/{u}").verify(r"/user/[^/]+"),
        Service::new("TikTok", "https://www.tiktok.com/@{u}").verify("@{u}"),
        Service::new("Twitch", "https://www.twitch.tv/{u}").lowercase(),
        Service::new("Pinterest", "https://www.pinterest.com/{u}/").lowercase(),
        Service::new("Steam", "https://steamcommunity.com/id/{u}"),
        Service::new("Steam (prof)", "https://steamcommunity.com/profiles/{u}"),
        Service::new("SoundCloud", "https://soundcloud.com/{u}").lowercase(),
        Service::new("Medium", "https://medium.com/@{u}").lowercase(),
        Service::new("Dev.to", "https://dev.to/{u}").lowercase(),
        Service::new("Keybase", "https://keybase.io/{u}").lowercase(),
        Service::new("GitLab", "https://gitlab.com/{u}").lowercase(),
        Service::new("Kaggle", "https://www.kaggle.com/{u}").lowercase(),
        Service::new("Flickr", "https://www.flickr.com/people/{u}/").lowercase(),
        Service::new("Gravatar", "https://en.gravatar.com/{u}"),
        Service::new("YouTube", "https://www.youtube.com/@{u}").lowercase(),
        Service::new("Behance", "https://www.behance.net/{u}").lowercase(),
        Service::new("ProductHunt", "https://www.producthunt.com/@{u}").lowercase(),
        Service::new("HackerNews", "https://news.ycombinator.com/user?id={u}"),
        Service::new("StackOverflow", "https://stackoverflow.com/users/{u}"),
        Service::new("Instagram", "https://www.instagram.com/{u}/").lowercase(),
        Service::new("Twitter/X", "https://x.com/{u}").lowercase(),
        Service::new("Facebook", "https://www.facebook.com/{u}"),
        Service::new("LinkedIn", "https://www.linkedin.com/in/{u}/"),
    ]
}

/// Checks profile URLs on major platforms for the query's username.
///
/// Every checked service yields a found or not-found hit, and a summary hit
/// leads the block. Checks stop once `max_positives` profiles are found.
#[derive(Debug, Clone)]
pub struct UsernamePack {
    services: Vec<Service>,
    max_positives: usize,
}

impl UsernamePack {
    /// The pack with the built-in services.
    #[must_use]
    pub fn builtin(max_positives: usize) -> Self {
        Self::with_services(builtin_services(), max_positives)
    }

    /// A pack over custom services.
    #[must_use]
    pub fn with_services(services: Vec<Service>, max_positives: usize) -> Self {
        Self {
            services,
            max_positives: max_positives.max(1),
        }
    }

    /// Services checked, in order.
    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    async fn check(client: &FetchClient, service: &Service, username: &str) -> Hit {
        let url = service.profile_url(username);
        let resp = match client.head_or_get(&url, None).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(service = %service.name, url = %url, error = %e, "profile check failed");
                return not_found(service, &url, "error", None);
            }
        };

        match resp.status {
            200 => {
                let body = resp.text.to_lowercase();
                let matched = match service.verify_regex(username) {
                    None => true,
                    Some(Ok(re)) => re.is_match(&body),
                    Some(Err(e)) => {
                        tracing::warn!(service = %service.name, error = %e, "invalid verify pattern");
                        false
                    }
                };
                if matched {
                    Hit::new(
                        USERNAME_PACK,
                        format!("{}: found", service.name),
                        truncate_snippet(&body, FOUND_SNIPPET_CHARS),
                        url,
                    )
                    .with_flag("service", service.name.as_str())
                    .with_flag("exists", true)
                    .with_flag("code", resp.status)
                } else {
                    not_found(service, &url, "page loaded but pattern not found", Some(resp.status))
                }
            }
            404 => not_found(service, &url, "not found", Some(404)),
            code => not_found(service, &url, "request failed", Some(code)),
        }
    }
}

fn not_found(service: &Service, url: &str, reason: &str, code: Option<u16>) -> Hit {
    let snippet = match code {
        Some(code) => format!("{reason} (HTTP {code})"),
        None => reason.to_string(),
    };
    Hit::new(USERNAME_PACK, format!("{}: not found", service.name), snippet, url)
        .with_flag("service", service.name.as_str())
        .with_flag("exists", false)
        .with_flag("reason", reason)
        .with_flag("code", code.map_or(Value::Null, Value::from))
}

fn is_found(hit: &Hit) -> bool {
    hit.flag("exists").and_then(Value::as_bool).unwrap_or(false)
}

#[async_trait]
impl Probe for UsernamePack {
    async fn probe(&self, client: &FetchClient, query: &Query) -> Result<Vec<Hit>> {
        let Some(username) = query.username() else {
            return Ok(Vec::new());
        };

        let checks: Vec<_> = self
            .services
            .iter()
            .map(|service| Self::check(client, service, username))
            .collect();
        let mut checks = stream::iter(checks).buffered(CONCURRENT_CHECKS);

        let mut hits = Vec::with_capacity(self.services.len() + 1);
        let mut positives = 0;
        while let Some(hit) = checks.next().await {
            if is_found(&hit) {
                positives += 1;
            }
            hits.push(hit);
            if positives >= self.max_positives {
                break;
            }
        }

        let summary = if positives > 0 {
            let matched = hits
                .iter()
                .filter(|hit| is_found(hit))
                .filter_map(|hit| hit.flag("service").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("; ");
            Hit::new(
                USERNAME_PACK,
                format!("{positives} service(s) matched for @{username}"),
                matched,
                "#",
            )
            .with_flag("exists", true)
            .with_flag("count", positives)
        } else {
            Hit::new(
                USERNAME_PACK,
                format!("No matches for @{username}"),
                "Checked major platforms",
                "#",
            )
            .with_flag("exists", false)
        };
        hits.insert(0, summary);

        tracing::debug!(username = %username, positives, checked = hits.len() - 1, "username pack finished");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let services = builtin_services();
        assert_eq!(services.len(), 24);
        assert_eq!(
            services.iter().filter(|s| s.verify.is_some()).count(),
            3
        );
    }

    #[test]
    fn test_profile_url_lowercases_where_configured() {
        let services = builtin_services();
        let by_name = |name: &str| {
            services
                .iter()
                .find(|s| s.name == name)
                .cloned()
                .unwrap_or_else(|| panic!("missing {name}"))
        };
        assert_eq!(by_name("GitLab").profile_url("JaneDoe"), "https://gitlab.com/janedoe");
        assert_eq!(by_name("GitHub").profile_url("JaneDoe"), "https://github.com/JaneDoe");
        assert_eq!(
            by_name("HackerNews").profile_url("jd"),
            "https://news.ycombinator.com/user?id=jd"
        );
    }

    #[test]
    fn test_verify_pattern_expands_username() {
        let service = Service::new("TikTok", "https://www.tiktok.com/@{u}").verify("@{u}");
        let re = service
            .verify_regex("Jane.Doe")
            .expect("has pattern")
            .expect("valid pattern");
        assert!(re.is_match("profile of @jane.doe"));
        assert!(!re.is_match("profile of @janexdoe"));
    }

    #[test]
    fn test_not_found_hit_shape() {
        let service = Service::new("Keybase", "https://keybase.io/{u}");
        let hit = not_found(&service, "https://keybase.io/x", "not found", Some(404));
        assert_eq!(hit.site, USERNAME_PACK);
        assert_eq!(hit.title, "Keybase: not found");
        assert_eq!(hit.snippet, "not found (HTTP 404)");
        assert_eq!(hit.flag("code"), Some(&Value::from(404)));

        let hit = not_found(&service, "https://keybase.io/x", "error", None);
        assert_eq!(hit.snippet, "error");
        assert_eq!(hit.flag("code"), Some(&Value::Null));
    }
}
