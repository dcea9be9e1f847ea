use trawl_core::{Hit, Query, SearchEngine};
use trawl_probe::{quote_plus, SiteCategory, SiteDefinition};

/// Dork tokens for a site, ordered by what the site category indexes best.
///
/// Property sites lead with the address, reverse-phone sites with the phone
/// digits; everything else uses name, username, email, phone, address.
pub fn dork_tokens(category: Option<SiteCategory>, query: &Query) -> Vec<String> {
    let quoted = |text: &str| format!("\"{}\"", text.split_whitespace().collect::<Vec<_>>().join(" "));

    let name: Vec<String> = query.full_name().map(quoted).into_iter().collect();
    let username: Vec<String> = query.username().map(str::to_string).into_iter().collect();
    let email: Vec<String> = query.email().map(str::to_string).into_iter().collect();
    let phone: Vec<String> = query.phone_digits().into_iter().collect();
    let address: Vec<String> = query
        .address()
        .map(quoted)
        .into_iter()
        .chain([query.city(), query.state(), query.zip()].into_iter().flatten().map(str::to_string))
        .collect();

    let ordered = match category {
        Some(SiteCategory::Property) => [address, name, phone, email, username],
        Some(SiteCategory::ReversePhone) => [phone, name, address, email, username],
        _ => [name, username, email, phone, address],
    };
    ordered.into_iter().flatten().collect()
}

/// The search string: `site:<domain>` followed by the tokens, or the site
/// name when there is nothing else to search for.
pub fn dork_query(site_name: &str, site: Option<&SiteDefinition>, query: &Query) -> String {
    let domain = site.and_then(|s| s.domain.as_deref());
    let mut parts = Vec::new();
    if let Some(domain) = domain {
        parts.push(format!("site:{domain}"));
    }
    parts.extend(dork_tokens(site.map(|s| s.category), query));

    if parts.is_empty() {
        site_name.to_string()
    } else {
        parts.join(" ")
    }
}

/// Search-engine URL for the site's dork.
pub fn dork_url(
    engine: SearchEngine,
    site_name: &str,
    site: Option<&SiteDefinition>,
    query: &Query,
) -> String {
    format!(
        "{}{}",
        engine.base_url(),
        quote_plus(&dork_query(site_name, site, query))
    )
}

/// Why a source is getting fallback links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason<'a> {
    NoResults,
    NotRegistered,
    TimedOut(std::time::Duration),
    Failed(&'a str),
}

/// Build the fallback pair for a source: an "open site" link when a home
/// URL is known, then a "search dork" link.
pub fn fallback_hits(
    engine: SearchEngine,
    site_name: &str,
    site: Option<&SiteDefinition>,
    query: &Query,
    reason: FallbackReason<'_>,
) -> Vec<Hit> {
    let (home_note, dork_note) = match reason {
        FallbackReason::NoResults => (
            "No probe results, open site.".to_string(),
            "No probe results, try search.".to_string(),
        ),
        FallbackReason::NotRegistered => (
            "No probe for this source, open site.".to_string(),
            "No probe for this source, try search.".to_string(),
        ),
        FallbackReason::TimedOut(after) => {
            let note = format!("Timed out after {}s", after.as_secs());
            (note.clone(), note)
        }
        FallbackReason::Failed(error) => (error.to_string(), error.to_string()),
    };

    let tag = |hit: Hit| match reason {
        FallbackReason::TimedOut(_) => hit.with_flag("timeout", true),
        FallbackReason::Failed(error) => hit.with_flag("error", error),
        FallbackReason::NoResults | FallbackReason::NotRegistered => hit,
    };

    let mut hits = Vec::with_capacity(2);
    if let Some(home) = site.and_then(SiteDefinition::home_url) {
        hits.push(tag(Hit::new(
            site_name,
            format!("{site_name} (open site)"),
            home_note,
            home,
        )
        .with_flag("fallback", "home")));
    }
    hits.push(tag(Hit::new(
        site_name,
        format!("{site_name} (search dork)"),
        dork_note,
        dork_url(engine, site_name, site, query),
    )
    .with_flag("fallback", "dork")));
    hits
}
