//! Throwaway HTTP servers standing in for the external services
//!
//! Each fake binds `127.0.0.1:0`, answers POSTs on configured paths with a
//! canned status and body, and records every request it receives.

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A request as seen by the fake
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

/// Builder for a fake service
pub struct FakeService {
    routes: Vec<(String, Canned)>,
}

/// A running fake
pub struct RunningFake {
    pub base_url: String,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl RunningFake {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }
}

impl FakeService {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Answer `path` with 200 and a JSON body
    pub fn json(self, path: &str, body: Value) -> Self {
        self.raw(path, StatusCode::OK, body.to_string())
    }

    /// Answer `path` with an arbitrary status and raw body
    pub fn raw(mut self, path: &str, status: StatusCode, body: impl Into<String>) -> Self {
        self.routes.push((
            path.to_string(),
            Canned {
                status,
                body: body.into(),
                delay: None,
            },
        ));
        self
    }

    /// Answer `path` with 200 after sleeping
    pub fn slow(mut self, path: &str, delay: Duration, body: Value) -> Self {
        self.routes.push((
            path.to_string(),
            Canned {
                status: StatusCode::OK,
                body: body.to_string(),
                delay: Some(delay),
            },
        ));
        self
    }

    pub async fn spawn(self) -> RunningFake {
        let recorded: Arc<Mutex<Vec<RecordedRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();

        for (path, canned) in self.routes {
            let recorded = recorded.clone();
            let route_path = path.clone();
            router = router.route(
                &path,
                post(move |headers: HeaderMap, body: String| {
                    let recorded = recorded.clone();
                    let canned = canned.clone();
                    let path = route_path.clone();
                    async move {
                        recorded.lock().unwrap().push(RecordedRequest {
                            path,
                            authorization: headers
                                .get(AUTHORIZATION)
                                .and_then(|v| v.to_str().ok())
                                .map(String::from),
                            body: serde_json::from_str(&body).unwrap_or(Value::Null),
                        });
                        if let Some(delay) = canned.delay {
                            tokio::time::sleep(delay).await;
                        }
                        (canned.status, [(CONTENT_TYPE, "application/json")], canned.body)
                    }
                }),
            );
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        RunningFake {
            base_url: format!("http://{}", addr),
            recorded,
        }
    }
}

/// Chat completion body whose first choice says `content`
pub fn chat_reply(content: &str) -> Value {
    serde_json::json!({
        "id": "cmpl-test",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}}
        ]
    })
}

/// Consensus search body with `(relevance, support)` pairs
pub fn papers(scores: &[(f64, f64)]) -> Value {
    let results: Vec<Value> = scores
        .iter()
        .enumerate()
        .map(|(i, (relevance, support))| {
            serde_json::json!({
                "title": format!("Paper {}", i + 1),
                "url": format!("https://papers.example/{}", i + 1),
                "relevanceScore": relevance,
                "supportScore": support,
            })
        })
        .collect();
    serde_json::json!({ "results": results })
}
