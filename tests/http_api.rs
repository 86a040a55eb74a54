mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chat_arena_back::routes;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app() -> Router {
    routes::router(common::arena().await)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn healthcheck_reports_offline_generation() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["generation"], "down");
}

#[tokio::test]
async fn gladiator_session_over_http() {
    let app = app().await;

    let (status, round) = call(
        &app,
        Method::POST,
        "/modes/gladiator/sessions",
        Some(json!({ "topic": "Kawa czy herbata", "max_rounds": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(round["round_number"], 1);
    assert_eq!(round["topic"], "Kawa czy herbata");
    let id = round["session_id"].as_str().expect("session id").to_owned();

    let (status, tally) = call(
        &app,
        Method::POST,
        &format!("/sessions/{id}/votes"),
        Some(json!({ "round_number": 1, "choice": "agent1", "voter_id": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tally["total_votes"], 1);

    let (status, next) = call(&app, Method::POST, &format!("/sessions/{id}/advance"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["status"], "round");
    assert_eq!(next["round_number"], 2);

    let (status, done) = call(&app, Method::POST, &format!("/sessions/{id}/advance"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "finished");

    let (status, error) = call(&app, Method::POST, &format!("/sessions/{id}/finish"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "already_finished");

    let (status, listed) = call(&app, Method::GET, "/sessions?mode=gladiator", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (status, _) = call(&app, Method::DELETE, &format!("/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, error) = call(&app, Method::GET, &format!("/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "not_found");
}

#[tokio::test]
async fn invalid_requests_share_the_error_body() {
    let app = app().await;

    let (status, error) = call(&app, Method::POST, "/modes/opera/sessions", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_request");

    let (status, error) = call(
        &app,
        Method::POST,
        "/modes/karaoke/sessions",
        Some(json!({ "max_songs": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_request");

    let (status, error) = call(&app, Method::POST, "/chat", Some(json!({ "query": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_request");
}

#[tokio::test]
async fn malformed_input_uses_the_error_body() {
    let app = app().await;

    let (status, error) = call(
        &app,
        Method::POST,
        "/modes/gladiator/sessions",
        Some(json!({ "max_rounds": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_request");

    let (_, round) = call(&app, Method::POST, "/modes/gladiator/sessions", Some(json!({}))).await;
    let votes = format!("/sessions/{}/votes", round["session_id"].as_str().expect("session id"));

    let (status, error) = call(
        &app,
        Method::POST,
        &votes,
        Some(json!({ "round_number": 1, "choice": "agent1", "voter_id": "u1", "score": 300 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_request");

    let (status, error) = call(
        &app,
        Method::POST,
        &votes,
        Some(json!({ "round_number": 1, "choice": "agent1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_request");

    let (status, error) = call(&app, Method::POST, &votes, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_request");

    let (status, error) = call(&app, Method::GET, "/history/chat?limit=lots", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_request");

    let (status, error) = call(&app, Method::DELETE, "/history/chat/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_request");
}

#[tokio::test]
async fn chat_is_logged_and_exported() {
    let app = app().await;

    let (status, answer) = call(
        &app,
        Method::POST,
        "/chat",
        Some(json!({ "query": "Co sądzisz o poniedziałkach?", "agent_type": "beata" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer["persona"], "beata");
    assert_eq!(answer["fallback"], true);
    assert!(!answer["response"].as_str().unwrap_or_default().is_empty());

    let (status, page) = call(&app, Method::GET, "/history/chat?persona=beata", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);

    let (status, export) = call(
        &app,
        Method::POST,
        "/history/export",
        Some(json!({ "format": "csv" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(export["total_records"], 1);
    assert!(export["content"].as_str().unwrap_or_default().lines().count() >= 2);

    let (status, error) = call(
        &app,
        Method::POST,
        "/history/export",
        Some(json!({ "format": "xml" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_request");
}

#[tokio::test]
async fn karaoke_song_catalogue_is_public() {
    let app = app().await;
    let (status, catalogue) = call(&app, Method::GET, "/modes/karaoke/songs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(catalogue["total_suggestions"].as_u64().unwrap_or_default() > 0);
}

#[tokio::test]
async fn agent_catalogue_and_entertainment_modes() {
    let app = app().await;

    let (status, catalogue) = call(&app, Method::GET, "/agents", None).await;
    assert_eq!(status, StatusCode::OK);
    let agents = catalogue["agents"].as_array().expect("agents");
    assert_eq!(agents.len(), 5);
    assert_eq!(agents[0]["key"], "adam");
    assert_eq!(agents[0]["color"], "blue");

    let (status, roast) = call(
        &app,
        Method::POST,
        "/agents/roast",
        Some(json!({ "target": "Adam", "intensity": 0.9 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roast["fallback"], true);
    assert!(!roast["roast"].as_str().expect("roast").is_empty());

    let (status, show) = call(
        &app,
        Method::POST,
        "/agents/reality-show",
        Some(json!({ "topic": "Kto zjadł ostatni kawałek pizzy", "max_turns": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(show["participants"], json!(["Adam", "Beata"]));
    assert_eq!(show["dialog"].as_array().expect("dialog").len(), 4);
    assert_eq!(show["drama_level"], 0.5);

    let (status, error) = call(
        &app,
        Method::POST,
        "/agents/reality-show",
        Some(json!({ "topic": "Kawa", "drama_level": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_request");
}

#[tokio::test]
async fn chat_stats_and_overview_follow_the_log() {
    let app = app().await;
    for persona in ["adam", "beata", "adam"] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/chat",
            Some(json!({ "query": "Jak się masz?", "persona": persona })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    call(&app, Method::POST, "/modes/tsunami/sessions", Some(json!({}))).await;

    let (status, stats) = call(&app, Method::GET, "/chat/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_messages"], 3);
    assert_eq!(stats["agent_stats"]["adam"], 2);

    let (status, overview) = call(&app, Method::GET, "/history/stats/overview?days=7", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["period_days"], 7);
    assert_eq!(overview["total_messages"], 3);
    assert_eq!(overview["total_sessions"], 1);
    assert_eq!(overview["sessions_by_mode"]["tsunami"], 1);

    let (status, error) = call(&app, Method::GET, "/history/stats/overview?days=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "invalid_request");
}
