//! Round trips against a local mock HTTP server.

use fluent_http::fetch::auth::{ApiKey, UrlParam};
use fluent_http::fetch::BasicClient;
use fluent_http::{ClientOptions, Error, RequestBuilder};
use mockito::Matcher;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct Weather {
    city: String,
    temp: f64,
}

#[tokio::test]
async fn test_get_with_query_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/weather")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("city".into(), "Oslo".into()),
            Matcher::UrlEncoded("units".into(), "metric".into()),
        ]))
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"city":"Oslo","temp":-3.5}"#)
        .expect(1)
        .create_async()
        .await;

    let url = format!("{}/weather", server.url());
    let mut b = RequestBuilder::new()
        .header("Accept", "application/json")
        .get_with_query(&url, [("units", "metric"), ("city", "Oslo")])
        .send()
        .await;

    let weather: Weather = b.json().await.unwrap();
    assert_eq!(weather.city, "Oslo");
    assert_eq!(weather.temp, -3.5);

    let head = b.response().unwrap();
    assert!(head.is_success());
    assert_eq!(head.content_type(), Some("application/json"));

    // Second extraction is served from the cached body
    let map = b.json_map().await.unwrap();
    assert_eq!(map["city"], "Oslo");
    m.assert_async().await;
}

#[tokio::test]
async fn test_post_json_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("POST", "/items")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(serde_json::json!({"name": "widget", "qty": 3})))
        .with_status(201)
        .with_body(r#"{"id":"w-1"}"#)
        .create_async()
        .await;

    let url = format!("{}/items", server.url());
    let item = serde_json::json!({"name": "widget", "qty": 3});
    let mut b = RequestBuilder::new().post_json(&url, &item);

    let map = b.json_map().await.unwrap();
    assert_eq!(map["id"], "w-1");
    assert_eq!(b.response().unwrap().status, 201);
    m.assert_async().await;
}

#[tokio::test]
async fn test_post_form_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("POST", "/login")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body("pass=s3cret&user=ada")
        .with_body("welcome")
        .create_async()
        .await;

    let url = format!("{}/login", server.url());
    let content = RequestBuilder::new()
        .post_form(&url, [("user", "ada"), ("pass", "s3cret")])
        .send()
        .await
        .text()
        .await
        .unwrap();

    assert_eq!(content, "welcome");
    m.assert_async().await;
}

#[tokio::test]
async fn test_error_status_is_not_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_body("not here")
        .create_async()
        .await;

    let url = format!("{}/missing", server.url());
    let mut b = RequestBuilder::new().get(&url);

    assert_eq!(b.text().await.unwrap(), "not here");
    assert_eq!(b.response().unwrap().status, 404);
    assert!(!b.response().unwrap().is_success());
}

#[tokio::test]
async fn test_sticky_error_skips_io() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let url = format!("{}/anything", server.url());
    let mut b = RequestBuilder::new()
        .header("bad header", "x")
        .get(&url)
        .send()
        .await;

    assert!(matches!(b.error(), Some(Error::InvalidHeader(_))));
    assert!(matches!(b.bytes().await, Err(Error::InvalidHeader(_))));
    m.assert_async().await;
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let mut b = RequestBuilder::with_options(
        ClientOptions::default().with_connect_timeout(Duration::from_secs(2)),
    )
    .get("http://127.0.0.1:1/");

    let err = b.bytes().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(matches!(b.error(), Some(Error::Transport(_))));
    assert!(b.response().is_none());
}

#[tokio::test]
async fn test_user_agent_from_options() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/ua")
        .match_header("user-agent", "fluent-http-test/1.0")
        .with_body("ok")
        .create_async()
        .await;

    let url = format!("{}/ua", server.url());
    let mut b = RequestBuilder::new()
        .configure_client(|opts| opts.user_agent = Some("fluent-http-test/1.0".into()))
        .get(&url);

    assert_eq!(b.text().await.unwrap(), "ok");
    m.assert_async().await;
}

#[tokio::test]
async fn test_api_key_bearer_decorator() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/private")
        .match_header("authorization", "Bearer t0ken")
        .with_body("{}")
        .create_async()
        .await;

    let url = format!("{}/private", server.url());
    let client = ApiKey::bearer(BasicClient::new(), "t0ken").unwrap();
    let mut b = RequestBuilder::new().with_client(client).get(&url);

    assert!(b.json_map().await.unwrap().is_empty());
    m.assert_async().await;
}

#[tokio::test]
async fn test_url_param_decorator_keeps_query() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/feed")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "5".into()),
            Matcher::UrlEncoded("api_key".into(), "k-123".into()),
        ]))
        .with_body("feed")
        .create_async()
        .await;

    let url = format!("{}/feed", server.url());
    let client = UrlParam::new(BasicClient::new(), "api_key", "k-123");
    let mut b = RequestBuilder::new()
        .with_client(client)
        .get_with_query(&url, [("limit", "5")]);

    assert_eq!(b.text().await.unwrap(), "feed");
    m.assert_async().await;
}
