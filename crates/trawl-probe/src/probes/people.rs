//! Term probes for people-search, username-search and email tools.
//!
//! Each site contributes a URL builder and a hit cap; fetching and matching
//! is shared through [`TermProbe`].

use crate::term_probe::{quote_plus, TermProbe};
use trawl_core::{Query, QueryField};

/// Every built-in term probe, in registration order.
#[must_use]
pub fn term_probes() -> Vec<TermProbe> {
    use QueryField::{Address, Email, FullName, Phone, Username};

    vec![
        TermProbe::new("IDcrawl", idcrawl, 3).requiring(&[Username]),
        TermProbe::new("Username Search", usersearch, 2).requiring(&[Username]),
        TermProbe::new("Social Searcher", social_searcher, 2)
            .requiring(&[Username, FullName, Email]),
        TermProbe::new("PeekYou", peekyou, 2).requiring(&[Username, FullName]),
        TermProbe::new("instant username search", instant_username, 1).requiring(&[Username]),
        TermProbe::new("USPhoneBook", usphonebook, 2).requiring(&[Phone]),
        TermProbe::new("WhoCallsMe", whocallsme, 1).requiring(&[Phone]),
        TermProbe::new("FamilyTreeNow", familytreenow, 1).requiring(&[FullName]),
        TermProbe::new("FastPeopleSearch", fastpeoplesearch, 2)
            .requiring(&[FullName, Phone, Address]),
        TermProbe::new("TruePeopleSearch", truepeoplesearch, 2).requiring(&[FullName, Phone]),
        TermProbe::new("TruePeopleSearch.io", truepeoplesearch_io, 2)
            .requiring(&[FullName, Phone]),
        TermProbe::new("FastBackgroundCheck", fastbackgroundcheck, 1).requiring(&[FullName]),
        TermProbe::new("ZabaSearch", zabasearch, 2).requiring(&[FullName, Phone]),
        TermProbe::new("Radaris", radaris, 1).requiring(&[FullName, Username]),
        TermProbe::new("That'sThem", thatsthem, 2).requiring(&[Email, Phone]),
        TermProbe::new("EmailHippo", emailhippo, 1).requiring(&[Email]),
        TermProbe::new("Hunter.io", hunter, 1).requiring(&[Email]),
        TermProbe::new("BlackBookOnline", blackbookonline, 1)
            .requiring(&[Username, FullName, Email, Phone]),
        TermProbe::new("DataAxle Reference", dataaxle, 1).requiring(&[Username, FullName, Email]),
    ]
}

fn enc_username(q: &Query) -> Option<String> {
    q.username().map(quote_plus)
}

fn enc_full_name(q: &Query) -> Option<String> {
    q.full_name().map(quote_plus)
}

fn primary_term(q: &Query) -> Option<&str> {
    q.username().or_else(|| q.full_name()).or_else(|| q.email())
}

fn idcrawl(q: &Query) -> Vec<String> {
    let Some(u) = enc_username(q) else {
        return Vec::new();
    };
    vec![
        format!("https://idcrawl.com/username-search/{u}"),
        format!("https://idcrawl.com/username-search?username={u}"),
        format!("https://idcrawl.com/search/?q={u}"),
    ]
}

fn usersearch(q: &Query) -> Vec<String> {
    let Some(u) = enc_username(q) else {
        return Vec::new();
    };
    vec![
        format!("https://usersearch.org/results/?username={u}"),
        format!("https://usersearch.org/search/{u}"),
    ]
}

fn social_searcher(q: &Query) -> Vec<String> {
    let Some(term) = primary_term(q).map(quote_plus) else {
        return Vec::new();
    };
    vec![
        format!("https://social-searcher.com/social-search/?q={term}"),
        format!("https://social-searcher.com/reports?query={term}"),
    ]
}

fn peekyou(q: &Query) -> Vec<String> {
    let mut urls = Vec::new();
    if let Some(u) = enc_username(q) {
        urls.push(format!("https://www.peekyou.com/{u}"));
    }
    if let Some(name) = enc_full_name(q) {
        urls.push(format!("https://www.peekyou.com/usa/{name}"));
    }
    urls
}

fn instant_username(q: &Query) -> Vec<String> {
    enc_username(q)
        .map(|u| vec![format!("https://instantusername.com/#/{u}")])
        .unwrap_or_default()
}

fn usphonebook(q: &Query) -> Vec<String> {
    let Some(d) = q.phone_digits() else {
        return Vec::new();
    };
    vec![
        format!("https://www.usphonebook.com/{d}"),
        format!("https://www.usphonebook.com/search?number={d}"),
    ]
}

fn whocallsme(q: &Query) -> Vec<String> {
    q.phone_digits()
        .map(|d| vec![format!("https://whocallsme.com/Phone-Number.aspx/{d}")])
        .unwrap_or_default()
}

fn familytreenow(q: &Query) -> Vec<String> {
    if q.full_name().is_none() {
        return Vec::new();
    }
    let first = quote_plus(q.first_name().unwrap_or_default());
    let last = quote_plus(q.last_name().unwrap_or_default());
    vec![format!(
        "https://www.familytreenow.com/search/genealogy/results?first={first}&last={last}"
    )]
}

fn fastpeoplesearch(q: &Query) -> Vec<String> {
    let mut urls = Vec::new();
    if let Some(name) = q.full_name() {
        let slug = name.split_whitespace().map(quote_plus).collect::<Vec<_>>().join("-");
        urls.push(format!("https://www.fastpeoplesearch.com/name/{slug}"));
    }
    if let Some(d) = q.phone_digits() {
        urls.push(format!("https://www.fastpeoplesearch.com/phone/{d}"));
    }
    if let Some(address) = q.address() {
        urls.push(format!("https://www.fastpeoplesearch.com/address/{}", quote_plus(address)));
    }
    urls
}

fn truepeoplesearch(q: &Query) -> Vec<String> {
    let mut urls = Vec::new();
    if let Some(name) = enc_full_name(q) {
        urls.push(format!("https://www.truepeoplesearch.com/results?name={name}"));
    }
    if let Some(d) = q.phone_digits() {
        urls.push(format!("https://www.truepeoplesearch.com/results?phoneno={d}"));
    }
    urls
}

fn truepeoplesearch_io(q: &Query) -> Vec<String> {
    let mut urls = Vec::new();
    if let Some(name) = enc_full_name(q) {
        urls.push(format!("https://truepeoplesearch.io/search?name={name}"));
    }
    if let Some(d) = q.phone_digits() {
        urls.push(format!("https://truepeoplesearch.io/phone/{d}"));
    }
    urls
}

fn fastbackgroundcheck(q: &Query) -> Vec<String> {
    let (Some(first), Some(last)) = (q.first_name(), q.last_name()) else {
        return Vec::new();
    };
    vec![format!(
        "https://www.fastbackgroundcheck.com/people/{}-{}",
        quote_plus(first),
        quote_plus(last)
    )]
}

fn zabasearch(q: &Query) -> Vec<String> {
    let mut urls = Vec::new();
    if let Some(name) = enc_full_name(q) {
        urls.push(format!("https://www.zabasearch.com/people/{name}/"));
    }
    if let Some(d) = q.phone_digits() {
        urls.push(format!("https://www.zabasearch.com/phone/{d}/"));
    }
    urls
}

fn radaris(q: &Query) -> Vec<String> {
    let mut urls = Vec::new();
    if let (Some(first), Some(last)) = (q.first_name(), q.last_name()) {
        urls.push(format!(
            "https://radaris.com/p/{}/{}",
            quote_plus(first),
            quote_plus(last)
        ));
    }
    if let Some(u) = enc_username(q) {
        urls.push(format!("https://radaris.com/p/{u}"));
    }
    urls
}

fn thatsthem(q: &Query) -> Vec<String> {
    let mut urls = Vec::new();
    if let Some(email) = q.email() {
        urls.push(format!("https://thatsthem.com/email/{}", quote_plus(email)));
    }
    if let Some(d) = q.phone_digits() {
        urls.push(format!("https://thatsthem.com/phone/{d}"));
    }
    urls
}

fn emailhippo(q: &Query) -> Vec<String> {
    q.email()
        .map(|email| {
            vec![format!(
                "https://tools.emailhippo.com/EmailHippo/verify?email={}",
                quote_plus(email)
            )]
        })
        .unwrap_or_default()
}

fn hunter(q: &Query) -> Vec<String> {
    let mut urls = Vec::new();
    if let Some(email) = q.email() {
        urls.push(format!("https://hunter.io/verify/{}", quote_plus(email)));
    }
    if let Some(domain) = q.email_domain() {
        urls.push(format!("https://hunter.io/try/{}", quote_plus(domain)));
    }
    urls
}

fn blackbookonline(q: &Query) -> Vec<String> {
    let digits = q.phone_digits();
    let Some(term) = primary_term(q).or(digits.as_deref()) else {
        return Vec::new();
    };
    vec![format!(
        "https://www.blackbookonline.info/Search.aspx?kw={}",
        quote_plus(term)
    )]
}

fn dataaxle(q: &Query) -> Vec<String> {
    primary_term(q)
        .map(|term| {
            vec![format!(
                "https://www.referenceusa.com/Search/QuickSearch?search={}",
                quote_plus(term)
            )]
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_named(name: &str) -> TermProbe {
        term_probes()
            .into_iter()
            .find(|p| p.site() == name)
            .unwrap_or_else(|| panic!("no term probe named {name}"))
    }

    #[test]
    fn test_names_are_unique() {
        let probes = term_probes();
        let mut names: Vec<&str> = probes.iter().map(TermProbe::site).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), probes.len());
    }

    #[test]
    fn test_phone_probes_use_digits() {
        let query = Query::new().with_phone("(555) 010-9999");
        assert_eq!(
            probe_named("WhoCallsMe").candidate_urls(&query),
            vec!["https://whocallsme.com/Phone-Number.aspx/5550109999"]
        );
        assert!(probe_named("WhoCallsMe")
            .candidate_urls(&Query::new().with_username("x"))
            .is_empty());
    }

    #[test]
    fn test_name_probes_split_name() {
        let query = Query::new().with_full_name("Jane  Doe");
        assert_eq!(
            probe_named("FamilyTreeNow").candidate_urls(&query),
            vec!["https://www.familytreenow.com/search/genealogy/results?first=Jane&last=Doe"]
        );
        assert_eq!(
            probe_named("Radaris").candidate_urls(&query),
            vec!["https://radaris.com/p/Jane/Doe"]
        );
        assert_eq!(
            probe_named("FastPeopleSearch").candidate_urls(&query),
            vec!["https://www.fastpeoplesearch.com/name/Jane-Doe"]
        );
    }

    #[test]
    fn test_fastpeoplesearch_searches_by_address() {
        let query = Query::new().with_address("12 Elm St");
        let probe = probe_named("FastPeopleSearch");
        assert_eq!(
            probe.candidate_urls(&query),
            vec!["https://www.fastpeoplesearch.com/address/12+Elm+St"]
        );
    }

    #[test]
    fn test_hunter_uses_email_domain() {
        let query = Query::new().with_email("jane@example.org");
        assert_eq!(
            probe_named("Hunter.io").candidate_urls(&query),
            vec![
                "https://hunter.io/verify/jane%40example.org",
                "https://hunter.io/try/example.org",
            ]
        );
    }

    #[test]
    fn test_blackbook_falls_back_to_phone() {
        let query = Query::new().with_phone("555-0100");
        assert_eq!(
            probe_named("BlackBookOnline").candidate_urls(&query),
            vec!["https://www.blackbookonline.info/Search.aspx?kw=5550100"]
        );
    }
}
