use std::sync::Arc;

use axum::{
    body,
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use dinetab_api::{
    config::AppConfig,
    db,
    entities::menu_item,
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};

/// Helper harness for spinning up an application backed by a throwaway
/// SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    db_file: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_file = format!("dinetab_test_{}.db", Uuid::new_v4().simple());
        let _ = std::fs::remove_file(&db_file);

        let mut cfg = AppConfig::new(
            format!("sqlite://{db_file}?mode=rwc"),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.cors_allow_any_origin = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));

        let services = AppServices::new(db_arc.clone(), event_sender.clone());
        let event_task = tokio::spawn(events::process_events(event_rx, services.sales.clone()));

        let state = AppState::new(db_arc, cfg, event_sender, services);

        let router = Router::new()
            .merge(dinetab_api::service_routes())
            .nest("/api/v1", dinetab_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            db_file,
            _event_task: event_task,
        }
    }

    /// Send a request against the router with an optional session user id.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        user_id: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(user) = user_id {
            builder = builder.header("x-user-id", user);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            body::Body::from(
                serde_json::to_vec(&json).expect("failed to serialize json request body"),
            )
        } else {
            body::Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for anonymous requests.
    pub async fn request_anonymous(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, None).await
    }

    /// Insert a menu item directly, returning the stored row.
    pub async fn seed_menu_item(
        &self,
        name: &str,
        price: Decimal,
        category: &str,
    ) -> menu_item::Model {
        menu_item::ActiveModel {
            name: Set(name.to_string()),
            price: Set(price),
            category: Set(category.to_string()),
            description: Set(format!("{name} seeded for integration tests")),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed menu item for tests")
    }

    /// Wait until the event loop has drained everything queued so far.
    #[allow(dead_code)]
    pub async fn drain_events(&self) {
        // The channel is FIFO; a short yield loop lets the processor catch
        // up before assertions against the rollup tables.
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

#[allow(dead_code)]
pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
        let _ = std::fs::remove_file(&self.db_file);
    }
}
