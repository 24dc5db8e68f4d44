//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - Router wired to in-memory tables and accounts
//! - A cookie-carrying browser driving the router with `oneshot`
//! - Form, JSON and response helpers

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use taskboard_shared::{auth::memory::MemoryIdentity, remote::MemoryStore};
use taskboard_web::{
    app::{build_router, AppState, SESSION_COOKIE},
    config::Config,
};
use tower::ServiceExt;

pub const PASSWORD: &str = "hunter22";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub identity: Arc<MemoryIdentity>,
    pub state: AppState,
    pub app: Router,
}

impl TestContext {
    /// Creates a context with fresh in-memory backends
    pub fn new() -> Self {
        Self::with_identity(MemoryIdentity::new())
    }

    /// Creates a context around a customized identity store
    pub fn with_identity(identity: MemoryIdentity) -> Self {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(identity);

        let state = AppState::new(Config::offline(), store.clone(), identity.clone());
        let app = build_router(state.clone());

        Self {
            store,
            identity,
            state,
            app,
        }
    }

    /// A browser without cookies
    pub fn browser(&self) -> Browser {
        Browser {
            app: self.app.clone(),
            cookie: None,
        }
    }

    /// A browser signed in as a freshly registered user
    pub async fn signed_in(&self, email: &str) -> Browser {
        let mut browser = self.browser();
        let response = browser
            .post_form("/signup", &[("email", email), ("password", PASSWORD)])
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        assert!(browser.cookie.is_some(), "sign-up should set a session cookie");
        browser
    }
}

/// Cookie-carrying client for the router
pub struct Browser {
    app: Router,
    pub cookie: Option<String>,
}

impl Browser {
    /// Sends a request, attaching and updating the session cookie
    pub async fn send(&mut self, mut request: Request<Body>) -> Response<Body> {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap().trim();
            if let Some((name, value)) = pair.split_once('=') {
                if name == SESSION_COOKIE {
                    self.cookie = if value.is_empty() {
                        None
                    } else {
                        Some(pair.to_string())
                    };
                }
            }
        }

        response
    }

    pub async fn get(&mut self, path: &str) -> Response<Body> {
        self.send(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        self.send(
            Request::post(path)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    pub async fn json(
        &mut self,
        method: Method,
        path: &str,
        body: Option<JsonValue>,
    ) -> Response<Body> {
        let builder = Request::builder().method(method).uri(path);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };

        self.send(request.unwrap()).await
    }

    /// Follows the dashboard and returns its HTML
    pub async fn dashboard(&mut self) -> String {
        let response = self.get("/").await;
        assert_eq!(response.status(), StatusCode::OK);
        body_text(response).await
    }
}

/// `Location` header of a redirect
pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub async fn body_json(response: Response<Body>) -> JsonValue {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
