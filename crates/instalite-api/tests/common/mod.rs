#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use instalite_api::auth::create_token;
use instalite_api::rate_limit::RateLimiter;
use instalite_api::storage::Storage;
use instalite_api::{AppState, AppStateInner, router};
use instalite_caption::{CaptionError, CaptionService, VisionModel};
use instalite_db::Database;

pub const SECRET: &str = "test-secret";
const BOUNDARY: &str = "instalite-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub uploads: TempDir,
}

pub async fn app() -> TestApp {
    build(CaptionService::disabled()).await
}

pub async fn app_with_model(model: impl VisionModel + 'static) -> TestApp {
    build(CaptionService::new(Arc::new(model))).await
}

async fn build(captions: CaptionService) -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: SECRET.to_string(),
        storage: Storage::new(uploads.path().to_path_buf()).await.unwrap(),
        captions,
        caption_limiter: RateLimiter::for_captions(),
    });

    TestApp {
        router: router(state.clone()),
        state,
        uploads,
    }
}

impl TestApp {
    /// Insert a user directly and return `(id, bearer token)`.
    pub fn user(&self, name: &str) -> (i64, String) {
        let id = self
            .state
            .db
            .create_user(name, &format!("{name}@example.com"), "unused-hash")
            .unwrap();
        (id, create_token(SECRET, id, name).unwrap())
    }

    pub fn post(&self, user_id: i64, caption: &str) -> i64 {
        self.state.db.create_post(user_id, "", caption).unwrap()
    }

    pub async fn send(&self, req: Request<Body>) -> Reply {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply { status, headers, body }
    }

    pub fn upload_exists(&self, url: &str) -> bool {
        let name = url.trim_start_matches("/uploads/");
        self.uploads.path().join(name).exists()
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request("GET", uri, token).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    request("DELETE", uri, token).body(Body::empty()).unwrap()
}

pub fn json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request(method, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// One multipart part: a text field, or a file with its content type.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        field: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn multipart(method: &str, uri: &str, token: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
                );
            }
            Part::File {
                field,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    request(method, uri, token)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn png(field: &str) -> Part<'_> {
    Part::File {
        field,
        file_name: "photo.png",
        content_type: "image/png",
        bytes: b"\x89PNG fake image bytes",
    }
}

fn request(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

/// Vision model that always answers with the same text.
pub struct CannedModel(pub Option<&'static str>);

#[async_trait]
impl VisionModel for CannedModel {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn describe(&self, _prompt: &str, image_url: &str) -> Result<Option<String>, CaptionError> {
        assert!(image_url.starts_with("data:image/png;base64,"));
        Ok(self.0.map(String::from))
    }
}

/// Vision model that fails like an upstream rate limit.
pub struct RateLimitedModel;

#[async_trait]
impl VisionModel for RateLimitedModel {
    fn name(&self) -> &'static str {
        "rate-limited"
    }

    async fn describe(&self, _prompt: &str, _image_url: &str) -> Result<Option<String>, CaptionError> {
        Err(CaptionError::RateLimited)
    }
}
