use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use weather_mcp::client::ResponseDecoder;

use crate::common::{
    initialize_request, no_valid_session_body, open_session, post_json, session_header,
    TestServer,
};

fn tools_list(id: u64) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": "tools/list" })
}

#[tokio::test]
async fn each_initialize_gets_a_unique_session_id() -> Result<()> {
    let server = TestServer::start(true).await?;
    let http = reqwest::Client::new();

    let first = open_session(&http, &server.endpoint).await?;
    let second = open_session(&http, &server.endpoint).await?;
    assert_ne!(first, second, "session ids must never be reused");

    server.stop().await
}

#[tokio::test]
async fn requests_without_a_valid_session_are_rejected() -> Result<()> {
    let server = TestServer::start(true).await?;
    let http = reqwest::Client::new();

    let response = post_json(&http, &server.endpoint, None, &tools_list(1)).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(session_header(&response).is_none());
    assert_eq!(response.json::<Value>().await?, no_valid_session_body());

    let response = post_json(
        &http,
        &server.endpoint,
        Some("00000000-0000-4000-8000-000000000000"),
        &tools_list(2),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>().await?, no_valid_session_body());

    server.stop().await
}

#[tokio::test]
async fn requests_are_routed_to_their_own_session() -> Result<()> {
    let server = TestServer::start(true).await?;
    let http = reqwest::Client::new();
    let first = open_session(&http, &server.endpoint).await?;
    let second = open_session(&http, &server.endpoint).await?;

    for (session, id) in [(&first, 10), (&second, 20), (&first, 11)] {
        let response = post_json(&http, &server.endpoint, Some(session), &tools_list(id)).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(session_header(&response).as_ref(), Some(session));
        let body: Value = response.json().await?;
        assert_eq!(body["id"], id);
        let tools = body["result"]["tools"].as_array().cloned().unwrap_or_default();
        assert!(tools.iter().any(|tool| tool["name"] == "weather_by_city"));
    }

    server.stop().await
}

#[tokio::test]
async fn notifications_are_acknowledged_with_202() -> Result<()> {
    let server = TestServer::start(true).await?;
    let http = reqwest::Client::new();
    let session = open_session(&http, &server.endpoint).await?;

    let notification = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
    let response = post_json(&http, &server.endpoint, Some(&session), &notification).await?;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(session_header(&response), Some(session.clone()));
    assert!(response.text().await?.is_empty());

    server.stop().await
}

#[tokio::test]
async fn deleted_session_behaves_like_an_unknown_one() -> Result<()> {
    let server = TestServer::start(true).await?;
    let http = reqwest::Client::new();
    let session = open_session(&http, &server.endpoint).await?;

    for _ in 0..2 {
        let response = http
            .delete(&server.endpoint)
            .header("mcp-session-id", &session)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
    let response = http.delete(&server.endpoint).send().await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(&http, &server.endpoint, Some(&session), &tools_list(3)).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>().await?, no_valid_session_body());

    server.stop().await
}

#[tokio::test]
async fn malformed_bodies_and_batches_are_rejected() -> Result<()> {
    let server = TestServer::start(true).await?;
    let http = reqwest::Client::new();

    let response = http
        .post(&server.endpoint)
        .header(header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], -32700);

    let batch = json!([initialize_request(1)]);
    let response = post_json(&http, &server.endpoint, None, &batch).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], -32600);

    server.stop().await
}

#[tokio::test]
async fn event_stream_is_used_when_the_client_accepts_it() -> Result<()> {
    let server = TestServer::start(false).await?;
    let http = reqwest::Client::new();

    let response = http
        .post(&server.endpoint)
        .header(header::ACCEPT, "application/json, text/event-stream")
        .json(&initialize_request(5))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_header(&response).is_some());
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    assert!(
        content_type
            .as_deref()
            .is_some_and(|value| value.starts_with("text/event-stream")),
        "{content_type:?}"
    );

    let body = response.text().await?;
    assert!(body.contains("event: message"), "{body}");
    let message = ResponseDecoder::from_content_type(content_type.as_deref()).decode(&body)?;
    assert_eq!(message["id"], 5);
    assert!(message["result"]["serverInfo"].is_object(), "{message}");

    let response = post_json(&http, &server.endpoint, None, &initialize_request(6)).await?;
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("application/json")
    );

    server.stop().await
}

#[tokio::test]
async fn root_serves_a_banner() -> Result<()> {
    let server = TestServer::start(true).await?;
    let body = reqwest::get(&server.base_url).await?.text().await?;
    assert!(body.contains("weather-mcp"), "{body}");
    server.stop().await
}
