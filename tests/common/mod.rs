//! Shared test utilities for integration tests.
//!
//! Every test gets its own fake upstream API: an axum router bound to an
//! ephemeral port serving canned fixtures. The dashboard under test talks to
//! it over real HTTP.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_test::TestServer;
use serde_json::{Value, json};
use swarmdeck::{AppState, Config, create_app};

/// Request bodies the fake upstream received, keyed by path.
#[derive(Clone, Default)]
pub struct Recorded(Arc<Mutex<Vec<(String, Value)>>>);

impl Recorded {
    fn push(&self, path: &str, body: Value) {
        self.0.lock().unwrap().push((path.to_string(), body));
    }

    pub fn bodies(&self, path: &str) -> Vec<Value> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, b)| b.clone())
            .collect()
    }
}

pub struct Upstream {
    pub addr: SocketAddr,
    pub recorded: Recorded,
}

/// Creates a test server wired to a fresh fake upstream.
pub async fn test_server() -> TestServer {
    test_server_with_upstream().await.0
}

pub async fn test_server_with_upstream() -> (TestServer, Upstream) {
    let upstream = spawn_upstream().await;
    let config = Config::new(format!("http://{}", upstream.addr))
        .with_session_cookie("session=test")
        .with_poll_interval(Duration::from_millis(20))
        .with_request_timeout(Duration::from_secs(5));
    let state = AppState::new(config).unwrap();
    let server = TestServer::new(create_app(Arc::new(state))).unwrap();
    (server, upstream)
}

/// Creates a test server whose upstream refuses every connection.
pub async fn test_server_without_upstream() -> TestServer {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = Config::new(format!("http://{}", addr))
        .with_request_timeout(Duration::from_secs(2));
    let state = AppState::new(config).unwrap();
    TestServer::new(create_app(Arc::new(state))).unwrap()
}

async fn spawn_upstream() -> Upstream {
    let recorded = Recorded::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = upstream_router(recorded.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Upstream { addr, recorded }
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": format!("{} not found", what)})),
    )
        .into_response()
}

fn upstream_router(recorded: Recorded) -> Router {
    Router::new()
        .route(
            "/api/batch-tests",
            get(|| async { Json(json!({"batchTests": [running_run(), completed_run()]})) }).post(
                |State(recorded): State<Recorded>, Json(body): Json<Value>| async move {
                    recorded.push("/api/batch-tests", body);
                    Json(json!({"batchTestRun": batch_run("bt-new", "running_tests", false)}))
                },
            ),
        )
        .route(
            "/api/batch-tests/generate-personas",
            post(
                |State(recorded): State<Recorded>, Json(body): Json<Value>| async move {
                    recorded.push("/api/batch-tests/generate-personas", body);
                    Json(json!({
                        "personas": personas(),
                        "recommendedIndices": [2, 0],
                        "selectionReasoning": "Two shoppers with opposite budgets",
                        "generationWarning": null
                    }))
                },
            ),
        )
        .route("/api/batch-tests/:id", get(batch_detail))
        .route(
            "/api/batch-tests/:id/terminate",
            post(|Path(id): Path<String>| async move {
                match id.as_str() {
                    "bt-running" => {
                        Json(json!({"batchTestRun": batch_run("bt-running", "terminated", false)}))
                            .into_response()
                    }
                    _ => (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"error": "Batch test is not running"})),
                    )
                        .into_response(),
                }
            }),
        )
        .route(
            "/api/swarms",
            get(|| async { Json(json!({"swarms": [swarm()]})) }).post(
                |State(recorded): State<Recorded>, Json(body): Json<Value>| async move {
                    recorded.push("/api/swarms", body.clone());
                    let mut created = swarm();
                    created["id"] = json!("swarm-new");
                    created["name"] = body["name"].clone();
                    Json(json!({"swarm": created}))
                },
            ),
        )
        .route(
            "/api/swarms/:id",
            axum::routing::delete(|Path(id): Path<String>| async move {
                if id == "swarm-1" {
                    Json(json!({"success": true})).into_response()
                } else {
                    not_found("Swarm")
                }
            })
            .put(
                |State(recorded): State<Recorded>, Path(id): Path<String>, Json(body): Json<Value>| async move {
                    recorded.push(&format!("/api/swarms/{}", id), body.clone());
                    if id != "swarm-1" {
                        return not_found("Swarm");
                    }
                    let mut updated = swarm();
                    for key in ["name", "description", "agentCount"] {
                        if let Some(value) = body.get(key) {
                            updated[key] = value.clone();
                        }
                    }
                    Json(json!({"swarm": updated})).into_response()
                },
            ),
        )
        .route(
            "/api/screenshot-tests",
            get(|| async {
                Json(json!({"tests": [
                    screenshot_run("st-1", "completed", Some(72.4)),
                    screenshot_run("st-2", "analyzing", None)
                ]}))
            }),
        )
        .route("/api/screenshot-tests/:id", get(screenshot_test))
        .route(
            "/api/screenshot-tests/:id/rerun",
            post(|Path(id): Path<String>| async move {
                match id.as_str() {
                    "st-1" => Json(json!({
                        "screenshotTestRun": screenshot_run("st-3", "pending", None),
                        "message": "Rerun started"
                    }))
                    .into_response(),
                    _ => (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"error": "Test is still being analyzed"})),
                    )
                        .into_response(),
                }
            }),
        )
        .route(
            "/api/tests/:id/transcript",
            get(|Path(id): Path<String>| async move {
                match id.as_str() {
                    "tr-1" => Json(transcript()).into_response(),
                    _ => not_found("Test run"),
                }
            }),
        )
        .route(
            "/api/uxagent/runs/:id/thoughts",
            get(|| async {
                Json(json!({"thoughts": [
                    {"id": "th-1", "kind": "observation", "content": "The cart icon is hidden", "importance": 80, "stepNumber": 2},
                    {"id": "th-2", "kind": "plan", "content": "Search for running shoes", "importance": null, "stepNumber": 1}
                ]}))
            }),
        )
        .route(
            "/api/uxagent/runs/:id/insights",
            get(|Path(id): Path<String>| async move {
                Json(json!({"insights": insights_for(&id)}))
            })
            .post(|Path(id): Path<String>| async move {
                if id == "ux-2" {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"error": "Insight generation failed", "details": "model timeout"})),
                    )
                        .into_response()
                } else {
                    Json(json!({"insights": insights_for(&id)})).into_response()
                }
            }),
        )
        .route(
            "/api/uxagent/runs/:id/chat",
            get(|| async {
                Json(json!({"messages": [
                    {"id": "m-1", "role": "user", "content": "What confused you?", "createdAt": "2026-10-01T10:05:00Z"},
                    {"id": "m-2", "role": "assistant", "content": "The **checkout** button.", "createdAt": "2026-10-01T10:05:03Z"}
                ]}))
            })
            .post(
                |State(recorded): State<Recorded>, Path(id): Path<String>, Json(body): Json<Value>| async move {
                    recorded.push(&format!("/api/uxagent/runs/{}/chat", id), body);
                    if id == "ux-2" {
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(json!({"error": "Failed to chat", "details": "persona memory unavailable"})),
                        )
                            .into_response();
                    }
                    Json(json!({
                        "response": "I could not find the cart.",
                        "persona": {"name": "Maya Chen", "age": 34, "occupation": "Nurse"}
                    }))
                    .into_response()
                },
            ),
        )
        .route(
            "/api/share/batch/:token",
            get(|Path(token): Path<String>| async move {
                match token.as_str() {
                    "good" => Json(shared_batch()).into_response(),
                    "revoked" => (
                        StatusCode::FORBIDDEN,
                        Json(json!({"error": "Sharing disabled for this test"})),
                    )
                        .into_response(),
                    _ => not_found("Share link"),
                }
            }),
        )
        .route(
            "/api/share/screenshot/:token",
            get(|Path(token): Path<String>| async move {
                match token.as_str() {
                    "good" => Json(shared_screenshot()).into_response(),
                    _ => not_found("Share link"),
                }
            }),
        )
        .with_state(recorded)
}

async fn batch_detail(Path(id): Path<String>) -> Response {
    let detail = match id.as_str() {
        "bt-running" => json!({
            "batchTestRun": running_run(),
            "testRuns": [
                test_run("tr-1", 0, "completed", Some(6.5)),
                test_run("tr-2", 1, "running", None)
            ],
            "aggregatedReport": null,
            "uxagentRuns": []
        }),
        "bt-done" => json!({
            "batchTestRun": completed_run(),
            "testRuns": [test_run("tr-3", 0, "completed", Some(8.0))],
            "aggregatedReport": aggregated_report(),
            "uxagentRuns": [uxagent_run("ux-1", "Maya Chen", 7.0), uxagent_run("ux-2", "", 5.0)]
        }),
        "bt-failed" => json!({
            "batchTestRun": {
                "id": "bt-failed",
                "targetUrl": "https://shop.test",
                "status": "failed",
                "createdAt": "2026-10-01T08:00:00Z",
                "errorMessage": "Browser pool exhausted"
            },
            "testRuns": [],
            "aggregatedReport": null,
            "uxagentRuns": []
        }),
        "bt-new" => json!({
            "batchTestRun": batch_run("bt-new", "completed", false),
            "testRuns": [test_run("tr-9", 0, "completed", Some(9.0))],
            "aggregatedReport": {"overallScore": 9.0},
            "uxagentRuns": []
        }),
        _ => return not_found("Batch test"),
    };
    Json(detail).into_response()
}

pub fn personas() -> Value {
    json!([
        persona("Maya Chen", 6.0),
        persona("Tom Okafor", 4.5),
        persona("Ines Duarte", 9.0),
        persona("Lars Berg", 7.5)
    ])
}

fn persona(name: &str, relevance: f64) -> Value {
    json!({
        "name": name,
        "age": 34,
        "country": "Portugal",
        "occupation": "Nurse",
        "incomeLevel": "medium",
        "techSavviness": "intermediate",
        "primaryGoal": "Buy running shoes quickly",
        "painPoints": ["Slow pages"],
        "relevanceScore": relevance
    })
}

fn batch_run(id: &str, status: &str, use_uxagent: bool) -> Value {
    json!({
        "id": id,
        "targetUrl": "https://shop.test",
        "userDescription": "Budget runners",
        "generatedPersonas": personas(),
        "selectedPersonaIndices": [0, 2],
        "status": status,
        "useUXAgent": use_uxagent,
        "createdAt": "2026-10-01T09:00:00Z"
    })
}

fn running_run() -> Value {
    batch_run("bt-running", "running_tests", false)
}

fn completed_run() -> Value {
    let mut run = batch_run("bt-done", "completed", true);
    run["createdAt"] = json!("2026-10-02T09:00:00Z");
    run["completedAt"] = json!("2026-10-02T09:30:00Z");
    run
}

fn test_run(id: &str, index: usize, status: &str, score: Option<f64>) -> Value {
    let names = ["Maya Chen", "Tom Okafor"];
    json!({
        "testRun": {
            "id": id,
            "personaIndex": index,
            "personaName": names[index % names.len()],
            "status": status
        },
        "report": score.map(|s| json!({
            "score": s,
            "summary": "Checkout was smooth",
            "positiveAspects": ["Clear pricing"],
            "usabilityIssues": [{"severity": "high", "description": "Hidden cart icon", "recommendation": "Show the cart"}]
        }))
    })
}

fn aggregated_report() -> Value {
    json!({
        "overallScore": 7.3,
        "executiveSummary": "Shoppers found products fast.",
        "commonIssues": [
            {"issue": "Slow filters", "severity": "low", "affectedPersonas": ["Maya Chen"], "recommendation": "Cache filter results"},
            {"issue": "Hidden cart icon", "severity": "critical", "affectedPersonas": ["Maya Chen", "Tom Okafor"], "recommendation": "Show the cart"}
        ],
        "recommendations": [
            {"priority": "high", "recommendation": "Show the cart", "impact": "Fewer abandoned checkouts"}
        ],
        "strengthsAcrossPersonas": ["Clear pricing"]
    })
}

fn uxagent_run(id: &str, name: &str, score: f64) -> Value {
    let persona_data = if name.is_empty() {
        json!({})
    } else {
        json!({"name": name, "age": 34, "occupation": "Nurse"})
    };
    json!({
        "id": id,
        "intent": "Buy running shoes",
        "startUrl": "https://shop.test",
        "personaData": persona_data,
        "status": "completed",
        "score": score,
        "stepsTaken": 3,
        "basicInfo": {
            "persona": "Name: Ravi Patel is a retired librarian",
            "timing_metrics": {"total_duration_ms": 42000, "time_to_first_action_ms": 1500, "backtrack_count": 1}
        },
        "actionTrace": [
            {"action": "click", "target": "Add to cart", "description": "Clicked add to cart"},
            {"action": "type", "target": "search", "description": "Typed running shoes"}
        ],
        "memoryTrace": [{"kind": "Observation", "content": "Saw the homepage", "importance": 0.5}],
        "observationTrace": [{"url": "https://shop.test/"}, {"url": "https://shop.test/cart"}],
        "logContent": "step 1: loaded homepage",
        "screenshots": [
            {"id": "s-1", "stepNumber": 1, "signedUrl": "https://cdn.test/1.png"},
            {"id": "s-2", "stepNumber": 2, "s3Url": "https://cdn.test/2.png"}
        ]
    })
}

fn insights_for(run_id: &str) -> Value {
    json!([
        {
            "id": format!("{}-i1", run_id),
            "uxagentRunId": run_id,
            "category": "navigation",
            "severity": "high",
            "title": "Cart is hard to find",
            "description": "The agent looped twice looking for the cart.",
            "recommendation": "Pin the cart to the header"
        },
        {
            "id": format!("{}-i2", run_id),
            "uxagentRunId": run_id,
            "category": "content",
            "severity": "low",
            "title": "Vague sizing copy",
            "description": "Size guide is buried."
        },
        {
            "id": format!("{}-i3", run_id),
            "uxagentRunId": run_id,
            "category": "navigation",
            "severity": "critical",
            "title": "Checkout link missing on mobile",
            "description": "The menu hides the checkout link below 400px."
        }
    ])
}

fn swarm() -> Value {
    json!({
        "id": "swarm-1",
        "name": "Budget shoppers",
        "description": "Price-sensitive runners",
        "personas": personas(),
        "agentCount": 2,
        "createdAt": "2026-09-20T12:00:00Z"
    })
}

fn shared_batch() -> Value {
    json!({
        "batchTestRun": {
            "id": "bt-done",
            "targetUrl": "https://shop.test",
            "userDescription": "Budget runners",
            "status": "completed",
            "createdAt": "2026-10-02T09:00:00Z"
        },
        "testRuns": [
            {"id": "tr-3", "personaName": "Maya Chen", "status": "completed", "report": {"score": 8.0}}
        ],
        "aggregatedReport": aggregated_report(),
        "uxagentRuns": [uxagent_run("ux-1", "Maya Chen", 7.0)],
        "isSharedView": true
    })
}

fn shared_screenshot() -> Value {
    json!({
        "testRun": {
            "id": "st-1",
            "testName": "Checkout flow",
            "expectedTask": "Pay for an order",
            "status": "completed",
            "overallScore": 62.0,
            "summary": "Payment step confused both personas.",
            "createdAt": "2026-10-03T09:00:00Z"
        },
        "screenshots": [
            {"id": "img-2", "orderIndex": 1, "signedUrl": "https://cdn.test/pay.png", "description": "Payment form"},
            {"id": "img-1", "orderIndex": 0, "signedUrl": "https://cdn.test/cart.png", "description": "Cart page"}
        ],
        "personaResults": [
            {
                "personaIndex": 0,
                "personaName": "Maya Chen",
                "analyses": [
                    {"screenshotOrder": 0, "observations": ["Totals are clear"], "thoughts": "Looks fine"},
                    {"screenshotOrder": 1, "issues": [{"severity": "medium", "description": "Card field too small"}]}
                ]
            }
        ]
    })
}

fn screenshot_run(id: &str, status: &str, score: Option<f64>) -> Value {
    // st-2 was created without a name
    let test_name = (id != "st-2").then_some("Checkout flow");
    json!({
        "id": id,
        "userId": "user-1",
        "testName": test_name,
        "userDescription": "First-time buyers on mobile",
        "expectedTask": "Pay for an order",
        "agentCount": 2,
        "status": status,
        "overallScore": score,
        "summary": null,
        "createdAt": "2026-10-03T09:00:00Z",
        "completedAt": null,
        "errorMessage": null
    })
}

async fn screenshot_test(Path(id): Path<String>) -> Response {
    let screenshots = json!([
        {"id": "img-2", "orderIndex": 1, "signedUrl": "https://cdn.test/pay.png", "description": "Payment form"},
        {"id": "img-1", "orderIndex": 0, "signedUrl": "https://cdn.test/cart.png", "description": "Cart page"}
    ]);
    let result = match id.as_str() {
        "st-1" => json!({
            "testRun": screenshot_run("st-1", "completed", Some(72.4)),
            "screenshots": screenshots,
            "personaResults": [
                {
                    "personaIndex": 0,
                    "personaName": "Maya Chen",
                    "analyses": [
                        {"screenshotOrder": 0, "observations": ["Totals are clear"], "thoughts": "The cart looks tidy"},
                        {"screenshotOrder": 1, "issues": [{"severity": "high", "description": "Card field too small", "recommendation": "Widen the input"}],
                         "comparisonWithPrevious": "Busier than the cart"}
                    ]
                },
                {
                    "personaIndex": 1,
                    "personaName": "Ravi Patel",
                    "analyses": [
                        {"screenshotOrder": 0, "thoughts": "Where is the coupon box?"}
                    ]
                }
            ],
            "overallReport": {
                "score": 72.4,
                "summary": "Payment form needs work.",
                "fullReport": {"personaResults": [
                    {"personaIndex": 0, "overallScore": 80, "summary": "Mostly smooth"},
                    {"personaIndex": 1, "overallScore": 64, "summary": "Hunted for discounts"}
                ]}
            }
        }),
        "st-2" => json!({
            "testRun": screenshot_run("st-2", "analyzing", None),
            "screenshots": screenshots,
            "overallReport": null
        }),
        "st-legacy" => json!({
            "testRun": screenshot_run("st-legacy", "completed", Some(55.0)),
            "screenshots": [
                {"id": "img-9", "orderIndex": 0, "thoughts": "Too many banners", "positiveAspects": ["Clear prices"]}
            ],
            "overallReport": {"score": 55.0, "summary": null, "fullReport": {}}
        }),
        _ => return not_found("Test"),
    };
    Json(result).into_response()
}

fn transcript() -> Value {
    json!({
        "agentActions": [],
        "agentReasoning": "I looked for the **cart** first.",
        "agentLogs": [],
        "screenshots": [
            {"id": "sc-1", "stepNumber": 1, "description": "Home page", "base64Data": "iVBORw0KGgo=", "createdAt": "2026-10-01T09:00:05Z"},
            {"id": "sc-2", "stepNumber": 2, "description": "Not captured", "base64Data": null, "createdAt": "2026-10-01T09:00:09Z"}
        ],
        "timeline": [
            {"type": "log", "timestamp": 1790845200000u64, "data": {"level": "info", "message": "Browser session started"}},
            {"type": "action", "timestamp": 1790845203000u64, "data": {"type": "open_web_browser", "pageUrl": "https://shop.test"}},
            {"type": "reasoning", "timestamp": 1790845204000u64, "data": {"text": "private chain of thought"}},
            {"type": "action", "timestamp": 1790845265000u64, "data": {"type": "click", "x": 310, "y": 42, "button": "left"}}
        ],
        "testRun": {
            "startedAt": "2026-10-01T09:00:00Z",
            "completedAt": "2026-10-01T09:05:00Z",
            "targetUrl": "https://shop.test"
        }
    })
}
