//! DineTab API Library
//!
//! This crate provides the core functionality for the DineTab table-side
//! ordering API: menu browsing, carts, checkout, order history, and daily
//! sales analytics.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod cart;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod session;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::events::EventSender;
use crate::handlers::AppServices;

/// Shared state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<EventSender>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Arc<EventSender>,
        services: AppServices,
    ) -> Self {
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// Standard envelope for the service-level endpoints (`/health`, `/status`).
/// Resource endpoints return their DTOs directly.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn now() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: ResponseMeta::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors: None,
            meta: ResponseMeta::now(),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: ResponseMeta::now(),
        }
    }
}

/// Convenience alias used by service-level handlers.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Routes mounted under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/menu", handlers::menu::routes())
        .nest("/carts", handlers::carts::routes())
        .nest("/checkout", handlers::checkout::routes())
        .nest("/orders", handlers::orders::routes())
        .nest("/analytics", handlers::analytics::routes())
}

/// Root-level service routes: liveness and build info.
pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(api_status))
}

async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "service": "dinetab-api",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let db_status = match db::check_connection(state.db.as_ref()).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_response_carries_data() {
        let resp = ApiResponse::success(json!({"ok": true}));
        assert!(resp.success);
        assert_eq!(resp.data, Some(json!({"ok": true})));
        assert!(resp.message.is_none());
    }

    #[test]
    fn error_response_has_message_and_no_data() {
        let resp: ApiResponse<Value> = ApiResponse::error("boom");
        assert!(!resp.success);
        assert!(resp.data.is_none());
        assert_eq!(resp.message.as_deref(), Some("boom"));
    }

    #[test]
    fn validation_errors_are_listed() {
        let resp: ApiResponse<Value> =
            ApiResponse::validation_errors(vec!["quantity must be positive".to_string()]);
        assert!(!resp.success);
        assert_eq!(resp.errors.as_ref().map(|e| e.len()), Some(1));
    }

    #[test]
    fn serialized_response_skips_empty_fields() {
        let resp = ApiResponse::success(json!({"ok": true}));
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("message").is_none());
        assert!(value.get("errors").is_none());
        assert!(value.get("meta").and_then(|m| m.get("timestamp")).is_some());
    }
}
