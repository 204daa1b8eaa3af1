//! The uniform response envelope.
//!
//! Every handler reply goes through either [`ApiSuccess`] or
//! [`crate::ApiError`]; no handler writes ad-hoc JSON. Success and
//! failure bodies share the same outer shape so clients can branch on
//! the `success` flag alone.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Successful response wrapper: `{success: true, data, meta}`.
#[derive(Debug)]
pub struct ApiSuccess<T> {
    status: StatusCode,
    data: T,
    meta: Map<String, Value>,
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
            meta: Map::new(),
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
            meta: Map::new(),
        }
    }

    /// Attach an extra `meta` entry (pagination counters and the like).
    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        let mut meta = self.meta;
        meta.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));

        let body = json!({
            "success": true,
            "data": self.data,
            "meta": meta,
        });

        (self.status, Json(body)).into_response()
    }
}

/// A fresh random token identifying one error response. Collision
/// tolerant and diagnostic only.
pub fn request_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}
