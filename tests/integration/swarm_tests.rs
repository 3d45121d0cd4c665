//! Swarm integration tests.
//!
//! Tests for listing, creating, editing, running, and deleting saved swarms

use crate::common::{test_server, test_server_with_upstream};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_swarms_list() {
    let server = test_server().await;

    let response = server.get("/swarms").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Budget shoppers"));
    assert!(body.contains("2 agents"));
    assert!(body.contains("/swarms/swarm-1/delete"));
}

#[tokio::test]
async fn test_new_swarm_form() {
    let server = test_server().await;

    let response = server.get("/swarms/new").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("name=\"name\""));
}

#[tokio::test]
async fn test_new_swarm_requires_name() {
    let server = test_server().await;

    let response = server
        .post("/swarms/new")
        .form(&[
            ("name", ""),
            ("target_url", "https://shop.test"),
            ("user_description", "Budget runners"),
        ])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("banner error"));
}

#[tokio::test]
async fn test_create_and_save_swarm() {
    let (server, upstream) = test_server_with_upstream().await;

    let draft = server
        .post("/swarms/new")
        .form(&[
            ("name", "Night owls"),
            ("target_url", "https://shop.test"),
            ("user_description", "Late night shoppers"),
            ("agent_count", "3"),
        ])
        .await;
    assert_eq!(draft.status_code(), StatusCode::SEE_OTHER);
    let location = draft.headers().get("location").unwrap().to_str().unwrap().to_string();

    // two recommendations, topped up by relevance to the requested three
    let page = server.get(&location).await.text();
    assert!(page.contains("<strong>3/3</strong> personas selected"));
    assert!(page.contains("Save swarm"));
    assert!(page.contains("action=\"/swarms\""));

    // swarm drafts are saved, never launched as a test
    let launch = server.post(&format!("{}/launch", location)).await;
    assert_eq!(launch.status_code(), StatusCode::BAD_REQUEST);

    let draft_id = location.trim_start_matches("/tests/new/").to_string();
    let saved = server.post("/swarms").form(&[("draft", draft_id.as_str())]).await;
    assert_eq!(saved.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(
        saved.headers().get("location").unwrap().to_str().unwrap(),
        "/swarms"
    );

    let created = upstream.recorded.bodies("/api/swarms");
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["name"], "Night owls");
    assert_eq!(created[0]["description"], "Late night shoppers...");
    assert_eq!(created[0]["agentCount"], 3);
    let names: Vec<&str> = created[0]["personas"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Maya Chen", "Ines Duarte", "Lars Berg"]);

    let gone = server.get(&location).await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_run_swarm_uses_first_personas() {
    let (server, upstream) = test_server_with_upstream().await;

    let response = server
        .post("/swarms/swarm-1/run")
        .form(&[("target_url", "https://other.test")])
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get("location").unwrap().to_str().unwrap(),
        "/tests/bt-new"
    );

    let created = upstream.recorded.bodies("/api/batch-tests");
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["targetUrl"], "https://other.test");
    assert_eq!(created[0]["userDescription"], "Price-sensitive runners");
    assert_eq!(created[0]["selectedPersonaIndices"], json!([0, 1]));
    assert_eq!(created[0]["agentCount"], 2);
    assert_eq!(created[0]["useUXAgent"], false);
    assert_eq!(created[0]["generatedPersonas"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_run_swarm_with_timeout() {
    let (server, upstream) = test_server_with_upstream().await;

    server
        .post("/swarms/swarm-1/run")
        .form(&[("target_url", "https://other.test"), ("timeout_minutes", "30")])
        .await;
    let created = upstream.recorded.bodies("/api/batch-tests");
    assert_eq!(created[0]["timeoutMinutes"], 30);

    let rejected = server
        .post("/swarms/swarm-1/run")
        .form(&[("target_url", "https://other.test"), ("timeout_minutes", "0")])
        .await;
    assert_eq!(rejected.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(upstream.recorded.bodies("/api/batch-tests").len(), 1);
}

#[tokio::test]
async fn test_run_unknown_swarm() {
    let server = test_server().await;

    let response = server
        .post("/swarms/swarm-9/run")
        .form(&[("target_url", "https://other.test")])
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_swarm() {
    let server = test_server().await;

    let deleted = server.post("/swarms/swarm-1/delete").await;
    assert_eq!(deleted.status_code(), StatusCode::SEE_OTHER);

    let missing = server.post("/swarms/swarm-9/delete").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_swarm_form() {
    let server = test_server().await;

    let response = server.get("/swarms/swarm-1/edit").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("value=\"Budget shoppers\""));
    assert!(body.contains("value=\"Price-sensitive runners\""));
    assert!(body.contains("max=\"4\""));
}

#[tokio::test]
async fn test_update_swarm() {
    let (server, upstream) = test_server_with_upstream().await;

    let response = server
        .post("/swarms/swarm-1/edit")
        .form(&[
            ("name", " Thrifty runners "),
            ("description", "Renamed"),
            ("agent_count", "9"),
        ])
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get("location").unwrap().to_str().unwrap(),
        "/swarms"
    );

    let updates = upstream.recorded.bodies("/api/swarms/swarm-1");
    assert_eq!(updates.len(), 1);
    assert_eq!(
        updates[0],
        json!({"name": "Thrifty runners", "description": "Renamed", "agentCount": 4})
    );
}

#[tokio::test]
async fn test_update_swarm_requires_name() {
    let (server, upstream) = test_server_with_upstream().await;

    let response = server
        .post("/swarms/swarm-1/edit")
        .form(&[("name", "  "), ("agent_count", "2")])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("A swarm needs a name"));
    assert!(upstream.recorded.bodies("/api/swarms/swarm-1").is_empty());
}

#[tokio::test]
async fn test_edit_unknown_swarm() {
    let server = test_server().await;

    let response = server.get("/swarms/swarm-404/edit").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
