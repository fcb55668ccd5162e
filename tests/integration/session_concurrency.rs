use std::time::{Duration, Instant};

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::common::{open_session, post_json, TestServer, SLOW_CITY, SLOW_GEOCODE_DELAY};

fn tools_list(id: u64) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": "tools/list" })
}

fn weather_call(id: u64, city: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": "weather_by_city", "arguments": { "city": city } }
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sessions_proceed_independently_and_serialize_their_own_requests() -> Result<()> {
    let server = TestServer::start(true).await?;
    let http = reqwest::Client::new();
    let busy = open_session(&http, &server.endpoint).await?;
    let other = open_session(&http, &server.endpoint).await?;

    let started = Instant::now();
    let slow_call = tokio::spawn({
        let http = http.clone();
        let endpoint = server.endpoint.clone();
        let session = busy.clone();
        async move {
            let response =
                post_json(&http, &endpoint, Some(&session), &weather_call(1, SLOW_CITY)).await?;
            let status = response.status();
            let body: Value = response.json().await?;
            anyhow::Ok((status, body))
        }
    });

    // The slow call holds its session once the geocoder has seen it.
    let deadline = Instant::now() + Duration::from_secs(5);
    while server.mock.geocoding_hits() == 0 {
        assert!(Instant::now() < deadline, "slow call never reached the geocoder");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let other_started = Instant::now();
    let response = post_json(&http, &server.endpoint, Some(&other), &tools_list(2)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let other_elapsed = other_started.elapsed();
    assert!(
        other_elapsed < SLOW_GEOCODE_DELAY / 2,
        "another session waited {other_elapsed:?} behind the slow call"
    );

    let response = post_json(&http, &server.endpoint, Some(&busy), &tools_list(3)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let same_session_done = started.elapsed();
    assert!(
        same_session_done >= SLOW_GEOCODE_DELAY,
        "same-session request finished after {same_session_done:?}, before the slow call"
    );
    let body: Value = response.json().await?;
    assert_eq!(body["id"], 3);

    let (status, body) = slow_call.await??;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["isError"], false, "{body}");

    server.stop().await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn response_timeout_answers_500_and_keeps_the_session() -> Result<()> {
    let server = TestServer::start_with(true, |config| {
        config.session.response_timeout_secs = 1;
    })
    .await?;
    let http = reqwest::Client::new();
    let session = open_session(&http, &server.endpoint).await?;

    let response = post_json(
        &http,
        &server.endpoint,
        Some(&session),
        &weather_call(1, SLOW_CITY),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let message = response.text().await?;
    assert!(
        message.contains("did not answer within 1 seconds"),
        "{message}"
    );

    let response = post_json(&http, &server.endpoint, Some(&session), &tools_list(2)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["id"], 2, "{body}");
    assert!(body["result"]["tools"].is_array(), "{body}");

    server.stop().await
}
