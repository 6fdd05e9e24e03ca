//! Tests for the campaign fetcher

use super::*;
use crate::auth::ApiKeyAuth;
use crate::error::Error;
use crate::http::{HttpClientConfig, RateLimitPolicy};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMAIL_FILTER: &str = "equals(messages.channel,\"email\")";

fn fetcher_for(server: &MockServer) -> CampaignFetcher {
    fetcher_with_policy(server, RateLimitPolicy::unbounded(Duration::from_millis(200)))
}

fn fetcher_with_policy(server: &MockServer, policy: RateLimitPolicy) -> CampaignFetcher {
    let config = HttpClientConfig::builder()
        .base_url(format!("{}/api", server.uri()))
        .no_rate_limit()
        .header("revision", "2024-07-15")
        .rate_limit_policy(policy)
        .build();
    let client = HttpClient::with_auth(config, ApiKeyAuth::new("pk_test")).unwrap();
    CampaignFetcher::new(client)
}

fn campaign(id: &str, name: &str, tag_ids: &[&str]) -> Value {
    let tags: Vec<Value> = tag_ids
        .iter()
        .map(|id| json!({"type": "tag", "id": id}))
        .collect();
    json!({
        "type": "campaign",
        "id": id,
        "attributes": {"name": name},
        "relationships": {"tags": {"data": tags}}
    })
}

fn tag(id: &str, name: &str) -> Value {
    json!({"type": "tag", "id": id, "attributes": {"name": name}})
}

fn page(data: Vec<Value>, included: Vec<Value>, next_cursor: Option<&str>) -> Value {
    let next = next_cursor.map(next_link);
    json!({
        "data": data,
        "included": included,
        "links": {"self": "https://a.klaviyo.com/api/campaigns/", "next": next}
    })
}

fn next_link(cursor: &str) -> String {
    format!("https://a.klaviyo.com/api/campaigns/?page%5Bcursor%5D={cursor}")
}

fn tag_ref(id: &str, name: Option<&str>) -> TagRef {
    TagRef {
        tag_id: id.to_string(),
        tag_name: name.map(str::to_string),
    }
}

async fn mount_first_page(server: &MockServer, body: Value, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/campaigns/"))
        .and(query_param_is_missing("page[cursor]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_cursor_page(
    server: &MockServer,
    cursor: &str,
    body: Value,
    expected_calls: u64,
) {
    Mock::given(method("GET"))
        .and(path("/api/campaigns/"))
        .and(query_param("page[cursor]", cursor))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ============================================================================
// Filter Tests
// ============================================================================

#[test]
fn test_filter_query_values() {
    assert_eq!(CampaignFilter::default().to_query_value(), EMAIL_FILTER);
    assert_eq!(
        CampaignFilter::from(Channel::Sms).to_query_value(),
        "equals(messages.channel,\"sms\")"
    );
    assert_eq!(
        CampaignFilter::Channel(Channel::MobilePush).to_query_value(),
        "equals(messages.channel,\"mobile_push\")"
    );
    let raw = "and(equals(messages.channel,\"email\"),equals(status,\"Sent\"))";
    assert_eq!(
        CampaignFilter::Expression(raw.to_string()).to_query_value(),
        raw
    );
}

// ============================================================================
// Fetch Tests
// ============================================================================

#[tokio::test]
async fn test_single_page_with_and_without_tags() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/campaigns/"))
        .and(header("Authorization", "Klaviyo-API-Key pk_test"))
        .and(header("revision", "2024-07-15"))
        .and(query_param("filter", EMAIL_FILTER))
        .and(query_param("fields[tag]", "name"))
        .and(query_param("include", "tags"))
        .and(query_param_is_missing("page[cursor]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            vec![
                campaign("A_id", "A_name", &["t1", "t2"]),
                campaign("B_id", "B_name", &[]),
            ],
            vec![tag("t1", "VIP"), tag("t2", "Sale")],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let records = fetcher_for(&server)
        .fetch(&CampaignFilter::default(), 10)
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![
            CampaignRecord {
                id: "A_id".to_string(),
                name: "A_name".to_string(),
                tags: vec![tag_ref("t1", Some("VIP")), tag_ref("t2", Some("Sale"))],
            },
            CampaignRecord {
                id: "B_id".to_string(),
                name: "B_name".to_string(),
                tags: vec![],
            },
        ]
    );
}

#[tokio::test]
async fn test_limit_reached_mid_page_skips_next_page() {
    let server = MockServer::start().await;

    mount_first_page(
        &server,
        page(
            vec![campaign("c1", "First", &["t1"]), campaign("c2", "Second", &[])],
            vec![tag("t1", "VIP")],
            Some("page2"),
        ),
        1,
    )
    .await;
    mount_cursor_page(&server, "page2", page(vec![], vec![], None), 0).await;

    let records = fetcher_for(&server)
        .fetch(&CampaignFilter::default(), 1)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "c1");
    assert_eq!(records[0].tags, vec![tag_ref("t1", Some("VIP"))]);
}

#[tokio::test]
async fn test_follows_cursor_across_pages() {
    let server = MockServer::start().await;

    mount_first_page(
        &server,
        page(
            vec![campaign("c1", "One", &["t1"])],
            vec![tag("t1", "VIP")],
            Some("page2"),
        ),
        1,
    )
    .await;

    // Filter and include directives are repeated alongside the cursor
    Mock::given(method("GET"))
        .and(path("/api/campaigns/"))
        .and(query_param("page[cursor]", "page2"))
        .and(query_param("filter", EMAIL_FILTER))
        .and(query_param("include", "tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            vec![campaign("c2", "Two", &["t1", "t9"])],
            vec![tag("t1", "VIP")],
            Some("page3"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    mount_cursor_page(
        &server,
        "page3",
        page(vec![campaign("c3", "Three", &[])], vec![], None),
        1,
    )
    .await;

    let records = fetcher_for(&server)
        .fetch(&CampaignFilter::default(), 100)
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3"]);
    // t9 was referenced but never side-loaded
    assert_eq!(
        records[1].tags,
        vec![tag_ref("t1", Some("VIP")), tag_ref("t9", None)]
    );
}

#[tokio::test]
async fn test_limit_spanning_pages_never_exceeded() {
    let server = MockServer::start().await;

    mount_first_page(
        &server,
        page(
            vec![campaign("c1", "One", &[]), campaign("c2", "Two", &[])],
            vec![],
            Some("page2"),
        ),
        1,
    )
    .await;
    mount_cursor_page(
        &server,
        "page2",
        page(
            vec![campaign("c3", "Three", &[]), campaign("c4", "Four", &[])],
            vec![],
            Some("page3"),
        ),
        1,
    )
    .await;
    mount_cursor_page(&server, "page3", page(vec![], vec![], None), 0).await;

    let records = fetcher_for(&server)
        .fetch(&CampaignFilter::default(), 3)
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3"]);
}

#[tokio::test]
async fn test_missing_included_tag_has_absent_name() {
    let server = MockServer::start().await;

    mount_first_page(
        &server,
        page(
            vec![campaign("c1", "One", &["t1", "ghost", "t2"])],
            vec![
                tag("t1", "VIP"),
                json!({"type": "tag", "id": "t2", "attributes": {}}),
            ],
            None,
        ),
        1,
    )
    .await;

    let records = fetcher_for(&server)
        .fetch(&CampaignFilter::default(), 10)
        .await
        .unwrap();

    assert_eq!(
        records[0].tags,
        vec![
            tag_ref("t1", Some("VIP")),
            tag_ref("ghost", None),
            tag_ref("t2", None),
        ]
    );
}

#[tokio::test]
async fn test_rate_limited_once_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/campaigns/"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_first_page(
        &server,
        page(vec![campaign("c1", "One", &[])], vec![], None),
        1,
    )
    .await;

    let started = Instant::now();
    let records = fetcher_for(&server)
        .fetch(&CampaignFilter::default(), 10)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    // No Retry-After header, so the configured default delay applies
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_rate_limit_does_not_advance_cursor() {
    let server = MockServer::start().await;

    mount_first_page(
        &server,
        page(vec![campaign("c1", "One", &[])], vec![], Some("page2")),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/api/campaigns/"))
        .and(query_param("page[cursor]", "page2"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_cursor_page(
        &server,
        "page2",
        page(vec![campaign("c2", "Two", &[])], vec![], None),
        1,
    )
    .await;

    let records = fetcher_for(&server)
        .fetch(&CampaignFilter::default(), 10)
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
}

#[tokio::test]
async fn test_bounded_rate_limit_surfaces_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/campaigns/"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(2)
        .mount(&server)
        .await;

    let err = fetcher_with_policy(&server, RateLimitPolicy::bounded(Duration::ZERO, 1))
        .fetch(&CampaignFilter::default(), 10)
        .await
        .unwrap_err();

    assert!(err.is_rate_limit());
}

#[tokio::test]
async fn test_empty_page_continues_pagination() {
    let server = MockServer::start().await;

    // No `data` member at all
    mount_first_page(&server, json!({"links": {"next": next_link("page2")}}), 1).await;
    mount_cursor_page(
        &server,
        "page2",
        page(vec![campaign("c1", "One", &[])], vec![], None),
        1,
    )
    .await;

    let records = fetcher_for(&server)
        .fetch(&CampaignFilter::default(), 10)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_empty_page_without_next_link_ends_normally() {
    let server = MockServer::start().await;

    mount_first_page(&server, page(vec![], vec![], None), 1).await;

    let records = fetcher_for(&server)
        .fetch(&CampaignFilter::Channel(Channel::Sms), 10)
        .await
        .unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_auth_failure_aborts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/campaigns/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"errors": [{"code": "not_authenticated"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = fetcher_for(&server)
        .fetch(&CampaignFilter::default(), 10)
        .await
        .unwrap_err();

    match err {
        Error::Auth { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("not_authenticated"));
        }
        other => panic!("Expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_upstream_failure_on_later_page_discards_results() {
    let server = MockServer::start().await;

    mount_first_page(
        &server,
        page(vec![campaign("c1", "One", &[])], vec![], Some("page2")),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/api/campaigns/"))
        .and(query_param("page[cursor]", "page2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    let result = fetcher_for(&server)
        .fetch(&CampaignFilter::default(), 10)
        .await;

    assert!(matches!(
        result,
        Err(Error::Upstream { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_campaign_without_name_is_decode_error() {
    let server = MockServer::start().await;

    mount_first_page(
        &server,
        json!({"data": [{"type": "campaign", "id": "c1", "attributes": {}}]}),
        1,
    )
    .await;

    let err = fetcher_for(&server)
        .fetch(&CampaignFilter::default(), 10)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_zero_limit_makes_no_requests() {
    let server = MockServer::start().await;

    mount_first_page(&server, page(vec![], vec![], None), 0).await;

    let records = fetcher_for(&server)
        .fetch(&CampaignFilter::default(), 0)
        .await
        .unwrap();

    assert!(records.is_empty());
}
