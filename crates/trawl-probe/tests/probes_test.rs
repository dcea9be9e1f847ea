use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use trawl_core::{FetchConfig, Hit, Query};
use trawl_fetch::FetchClient;
use trawl_probe::probes::{HibpProbe, Service, UsernamePack, WaybackProbe, USERNAME_PACK};
use trawl_probe::{probe_fn, probe_site_for_terms, Probe, ProbeRegistry};
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> FetchClient {
    let mut config = FetchConfig::default().without_delays();
    config.retries = 0;
    FetchClient::new(config).expect("client")
}

fn page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        "<html><head><title>Profile</title></head><body>{body} {}</body></html>",
        "filler text for a realistic page ".repeat(4)
    ))
}

async fn mount_page(server: &MockServer, at: &str, response: ResponseTemplate) {
    Mock::given(path(at))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_username_pack_reports_found_and_missing() {
    let server = MockServer::start().await;
    mount_page(&server, "/alpha/jdoe", page("alpha profile")).await;
    mount_page(&server, "/beta/jdoe", ResponseTemplate::new(404)).await;
    mount_page(&server, "/gamma/jdoe", page("no handle here")).await;

    let uri = server.uri();
    let pack = UsernamePack::with_services(
        vec![
            Service::new("Alpha", format!("{uri}/alpha/{{u}}")),
            Service::new("Beta", format!("{uri}/beta/{{u}}")),
            Service::new("Gamma", format!("{uri}/gamma/{{u}}")).verify("@{u}"),
        ],
        8,
    );

    let hits = pack
        .probe(&client(), &Query::new().with_username("jdoe"))
        .await
        .expect("probe");

    assert_eq!(hits.len(), 4);
    assert!(hits.iter().all(|hit| hit.site == USERNAME_PACK));

    assert_eq!(hits[0].title, "1 service(s) matched for @jdoe");
    assert_eq!(hits[0].snippet, "Alpha");
    assert_eq!(hits[0].url, "#");
    assert_eq!(hits[0].flag("count"), Some(&json!(1)));

    assert_eq!(hits[1].title, "Alpha: found");
    assert_eq!(hits[1].flag("exists"), Some(&Value::Bool(true)));
    assert_eq!(hits[2].title, "Beta: not found");
    assert_eq!(hits[2].snippet, "not found (HTTP 404)");
    assert_eq!(hits[3].title, "Gamma: not found");
    assert_eq!(hits[3].flag("reason"), Some(&json!("page loaded but pattern not found")));
}

#[tokio::test]
async fn test_username_pack_without_matches_has_negative_summary() {
    let server = MockServer::start().await;
    mount_page(&server, "/only/ghost", ResponseTemplate::new(403)).await;

    let pack = UsernamePack::with_services(
        vec![Service::new("Only", format!("{}/only/{{u}}", server.uri()))],
        8,
    );
    let hits = pack
        .probe(&client(), &Query::new().with_username("ghost"))
        .await
        .expect("probe");

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "No matches for @ghost");
    assert_eq!(hits[0].flag("exists"), Some(&Value::Bool(false)));
    assert_eq!(hits[1].flag("reason"), Some(&json!("request failed")));
}

#[tokio::test]
async fn test_username_pack_stops_after_max_positives() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let mut services = Vec::new();
    for i in 0..5 {
        mount_page(&server, &format!("/s{i}/jdoe"), page("profile")).await;
        services.push(Service::new(format!("S{i}"), format!("{uri}/s{i}/{{u}}")));
    }

    let pack = UsernamePack::with_services(services, 2);
    let hits = pack
        .probe(&client(), &Query::new().with_username("jdoe"))
        .await
        .expect("probe");

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].title, "2 service(s) matched for @jdoe");
    assert_eq!(hits[1].title, "S0: found");
    assert_eq!(hits[2].title, "S1: found");
}

#[tokio::test]
async fn test_username_pack_needs_username() {
    let hits = UsernamePack::builtin(8)
        .probe(&client(), &Query::new().with_email("a@b.com"))
        .await
        .expect("probe");
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_hibp_lists_breaches_up_to_limit() {
    let server = MockServer::start().await;
    let breaches: Vec<Value> = (0..12)
        .map(|i| json!({"Name": format!("Breach{i}"), "Domain": format!("site{i}.com")}))
        .collect();
    Mock::given(method("GET"))
        .and(path_regex("^/breachedaccount/"))
        .and(query_param("truncateResponse", "true"))
        .and(header("hibp-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(breaches)))
        .expect(1)
        .mount(&server)
        .await;

    let probe = HibpProbe::new(Some("secret".to_string()))
        .with_api_base(server.uri())
        .with_pause(Duration::ZERO);
    let hits = probe
        .probe(&client(), &Query::new().with_email("a@b.com"))
        .await
        .expect("probe");

    assert_eq!(hits.len(), 10);
    assert_eq!(hits[0].site, "HaveIBeenPwned");
    assert_eq!(hits[0].title, "HIBP: Breach0");
    assert_eq!(hits[0].snippet, "Domain: site0.com");
    assert_eq!(hits[0].url, "https://haveibeenpwned.com/account/a%40b.com");
}

#[tokio::test]
async fn test_hibp_not_found_is_empty() {
    let server = MockServer::start().await;
    Mock::given(path_regex("^/breachedaccount/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let probe = HibpProbe::new(Some("secret".to_string()))
        .with_api_base(server.uri())
        .with_pause(Duration::ZERO);
    let hits = probe
        .probe(&client(), &Query::new().with_username("jdoe"))
        .await
        .expect("probe");
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_hibp_without_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let probe = HibpProbe::new(None).with_api_base(server.uri());
    let hits = probe
        .probe(&client(), &Query::new().with_email("a@b.com"))
        .await
        .expect("probe");
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_term_probe_matches_tokens_and_caps_hits() {
    let server = MockServer::start().await;
    mount_page(&server, "/one", page("Results for JDoe")).await;
    mount_page(&server, "/two", page("nothing relevant")).await;
    mount_page(&server, "/three", ResponseTemplate::new(500).set_body_string("jdoe")).await;
    mount_page(&server, "/four", page("jdoe again")).await;
    mount_page(&server, "/five", page("jdoe once more")).await;

    let uri = server.uri();
    let urls: Vec<String> = ["one", "two", "three", "four", "five"]
        .iter()
        .map(|p| format!("{uri}/{p}"))
        .collect();

    let hits = probe_site_for_terms(
        &client(),
        "Example",
        &Query::new().with_username("jdoe"),
        &urls,
        2,
    )
    .await;

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].url, urls[0]);
    assert_eq!(hits[1].url, urls[3]);
    assert_eq!(hits[0].title, format!("probe: {}", urls[0]));
    assert_eq!(hits[0].flag("probed"), Some(&Value::Bool(true)));
    assert!(hits[0].snippet.chars().count() <= trawl_core::SNIPPET_MAX_CHARS);
}

#[tokio::test]
async fn test_wayback_probe_reports_available_snapshots() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/available"))
        .and(query_param("url", "github.com/jdoe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "archived_snapshots": {"closest": {
                "available": true,
                "url": "http://web.archive.org/web/20200101000000/https://github.com/jdoe",
                "timestamp": "20200101000000"
            }}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/available"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"archived_snapshots": {}})))
        .mount(&server)
        .await;

    let probe = WaybackProbe::new().with_api(format!("{}/available", server.uri()));
    let hits = probe
        .probe(&client(), &Query::new().with_username("jdoe"))
        .await
        .expect("probe");

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].site, "Wayback");
    assert_eq!(hits[0].title, "Wayback snapshot, 20200101000000");
}

#[tokio::test]
async fn test_registered_closure_probe_is_dispatched() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let registry = ProbeRegistry::new();
    registry
        .register(
            "Counter",
            probe_fn(move |_client, _query| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![Hit::new("Counter", "called", "", "https://example.com")])
                }
            }),
        )
        .expect("register");

    let entry = registry.get("Counter").expect("entry");
    let hits = entry
        .probe
        .probe(&client(), &Query::new().with_username("x"))
        .await
        .expect("probe");
    assert_eq!(hits.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_username_pack_runs_as_shared_trait_object_on_spawned_task() {
    let server = MockServer::start().await;
    mount_page(&server, "/alpha/jdoe", page("alpha profile")).await;
    mount_page(&server, "/beta/jdoe", ResponseTemplate::new(404)).await;

    let uri = server.uri();
    let pack: Arc<dyn Probe> = Arc::new(UsernamePack::with_services(
        vec![
            Service::new("Alpha", format!("{uri}/alpha/{{u}}")),
            Service::new("Beta", format!("{uri}/beta/{{u}}")),
        ],
        8,
    ));

    let client = client();
    let query = Query::new().with_username("jdoe");
    let hits = tokio::spawn(async move { pack.probe(&client, &query).await })
        .await
        .expect("join")
        .expect("probe");

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].title, "1 service(s) matched for @jdoe");
    assert_eq!(hits[1].title, "Alpha: found");
}
