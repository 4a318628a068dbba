//! Router over a live controller, driven with `tower::ServiceExt::oneshot`

use super::harness::{test_db, TestAudio};
use axum::body::Body;
use axum::http::StatusCode;
use axum::Router;
use http::{Method, Request};
use serde_json::Value;
use serene_ap::api::{create_router, AppContext};
use sqlx::{Pool, Sqlite};
use tower::ServiceExt;

pub struct TestServer {
    pub app: Router,
    pub audio: TestAudio,
    pub db_pool: Pool<Sqlite>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::with_audio(TestAudio::start()).await
    }

    pub async fn with_audio(audio: TestAudio) -> Self {
        let db_pool = test_db().await;
        let app = create_router(AppContext {
            audio: audio.handle.clone(),
            db_pool: db_pool.clone(),
        });
        Self {
            app,
            audio,
            db_pool,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Option<Value>) {
        make_request(&self.app, method, path, body).await
    }
}

pub async fn make_request(
    app: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    let method = match method {
        "GET" => Method::GET,
        "POST" => Method::POST,
        "DELETE" => Method::DELETE,
        _ => panic!("Unsupported method {}", method),
    };

    let request = Request::builder().method(method).uri(path);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json = if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(&bytes).ok()
    };
    (status, json)
}
