//! GitHub finder tests against a mock API server
//!
//! The finder uses a blocking HTTP client, so each lookup runs inside
//! `spawn_blocking` while the mock server runs on the test runtime.

use anyhow::Result;
use kepctl::Proposal;
use kepctl::config::GitHubSettings;
use kepctl::github::{Credentials, GitHubFinder};
use kepctl::query::RemoteFinder;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PULLS_PATH: &str = "/repos/kubernetes/enhancements/pulls";

fn pull(number: u64, labels: &[&str]) -> Value {
    json!({
        "number": number,
        "html_url": format!("https://github.com/kubernetes/enhancements/pull/{}", number),
        "title": format!("PR {}", number),
        "labels": labels.iter().map(|l| json!({ "name": l })).collect::<Vec<_>>(),
    })
}

fn changed_file(server: &MockServer, filename: &str) -> Value {
    json!({
        "filename": filename,
        "status": "added",
        "raw_url": format!("{}/raw/{}", server.uri(), filename),
    })
}

async fn find_in_flight(server: &MockServer, sig: &'static str) -> Result<Vec<Proposal>> {
    let api_url = server.uri();
    tokio::task::spawn_blocking(move || {
        let settings = GitHubSettings {
            api_url,
            ..Default::default()
        };
        GitHubFinder::new(&settings)?.find_in_flight(&Credentials::anonymous(), sig)
    })
    .await
    .unwrap()
}

async fn mount_pulls_page(server: &MockServer, page: &str, pulls: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(PULLS_PATH))
        .and(query_param("state", "open"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(pulls)))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_raw(server: &MockServer, filename: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/raw/{}", filename)))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_pages_until_short_page_and_skips_unparsable_kep() {
    let server = MockServer::start().await;

    let full_page: Vec<Value> = (1..=100).map(|n| pull(n, &["sig/node"])).collect();
    mount_pulls_page(&server, "1", full_page).await;
    mount_pulls_page(
        &server,
        "2",
        vec![pull(200, &["kind/kep", "sig/node"]), pull(201, &["kind/kep", "sig/apps"])],
    )
    .await;

    let good = "keps/sig-node/200-new-thing/kep.yaml";
    let broken = "keps/sig-node/201-broken/kep.yaml";
    Mock::given(method("GET"))
        .and(path(format!("{}/200/files", PULLS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            changed_file(&server, good),
            changed_file(&server, "keps/sig-node/200-new-thing/README.md"),
            changed_file(&server, broken),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    mount_raw(
        &server,
        good,
        ResponseTemplate::new(200).set_body_string(
            "title: New Thing\nowning-sig: sig-node\nstatus: provisional\nstage: alpha\n",
        ),
    )
    .await;
    mount_raw(&server, broken, ResponseTemplate::new(200).set_body_string("title: [unclosed\n")).await;

    let keps = find_in_flight(&server, "sig-node").await.unwrap();

    assert_eq!(keps.len(), 1);
    assert_eq!(keps[0].title, "New Thing");
    assert_eq!(keps[0].name, "200-new-thing");
    assert_eq!(keps[0].pr_number, Some(200));
    assert!(keps[0].is_in_flight());
    assert_eq!(keps[0].link, "https://github.com/kubernetes/enhancements/pull/200");

    // the open-state filter only applies to the pull request listing
    let requests = server.received_requests().await.unwrap();
    let files_request = requests
        .iter()
        .find(|r| r.url.path().ends_with("/200/files"))
        .unwrap();
    assert!(!files_request.url.query().unwrap_or_default().contains("state="));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_exhausted_quota_is_rate_limit_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PULLS_PATH))
        .respond_with(ResponseTemplate::new(403).insert_header("x-ratelimit-remaining", "0"))
        .mount(&server)
        .await;

    let err = find_in_flight(&server, "sig-node").await.unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("rate limit exceeded"), "{}", message);
    assert!(message.contains("GITHUB_TOKEN"), "{}", message);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_too_many_requests_is_rate_limit_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PULLS_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = find_in_flight(&server, "sig-node").await.unwrap_err();
    assert!(format!("{:#}", err).contains("rate limit exceeded"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_other_forbidden_is_plain_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PULLS_PATH))
        .respond_with(ResponseTemplate::new(403).insert_header("x-ratelimit-remaining", "4999"))
        .mount(&server)
        .await;

    let err = find_in_flight(&server, "sig-node").await.unwrap_err();
    let message = format!("{:#}", err);
    assert!(!message.contains("rate limit"), "{}", message);
    assert!(message.contains("403"), "{}", message);
    assert!(message.contains("Failed to list open pull requests"), "{}", message);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_raw_fetch_is_fatal() {
    let server = MockServer::start().await;
    mount_pulls_page(&server, "1", vec![pull(7, &["kind/kep", "sig/node"])]).await;

    let filename = "keps/sig-node/7-x/kep.yaml";
    Mock::given(method("GET"))
        .and(path(format!("{}/7/files", PULLS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([changed_file(&server, filename)])))
        .mount(&server)
        .await;
    mount_raw(&server, filename, ResponseTemplate::new(500)).await;

    let err = find_in_flight(&server, "sig-node").await.unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Failed to fetch"), "{}", message);
    assert!(message.contains("500"), "{}", message);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_matching_pull_requests() {
    let server = MockServer::start().await;
    mount_pulls_page(&server, "1", vec![pull(1, &["kind/kep", "sig/apps"])]).await;

    let keps = find_in_flight(&server, "sig-node").await.unwrap();
    assert!(keps.is_empty());
}
