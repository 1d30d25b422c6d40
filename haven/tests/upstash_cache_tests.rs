use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use haven::cache::{self, KvCache, UpstashCache};

#[tokio::test]
async fn test_get_returns_stored_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get/resp:abc:x:x"))
        .and(header("authorization", "Bearer upstash-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "cached answer" })))
        .mount(&server)
        .await;

    let cache = UpstashCache::new(&server.uri(), "upstash-token").unwrap();
    assert_eq!(
        cache.get("resp:abc:x:x").await.unwrap().as_deref(),
        Some("cached answer")
    );
}

#[tokio::test]
async fn test_get_missing_key_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get/resp:missing:x:x"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": null })))
        .mount(&server)
        .await;

    let cache = UpstashCache::new(&server.uri(), "t").unwrap();
    assert_eq!(cache.get("resp:missing:x:x").await.unwrap(), None);
}

#[tokio::test]
async fn test_set_posts_value_with_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/set/resp:abc:32.777:-96.797"))
        .and(query_param("EX", "3600"))
        .and(body_string("Here are three shelters."))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "OK" })))
        .expect(1)
        .mount(&server)
        .await;

    let cache = UpstashCache::new(&server.uri(), "t").unwrap();
    cache
        .set(
            "resp:abc:32.777:-96.797",
            "Here are three shelters.",
            Duration::from_secs(3600),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_backend_error_degrades_to_miss() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "WRONGPASS invalid token" })),
        )
        .mount(&server)
        .await;

    let cache = UpstashCache::new(&server.uri(), "wrong").unwrap();

    let err = cache.get("resp:abc:x:x").await.unwrap_err();
    assert!(err.to_string().contains("WRONGPASS"));
    assert_eq!(cache::lookup(&cache, "resp:abc:x:x").await, None);
}
