#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseBackend as DbBackend, Statement};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use machinery_store_api::{
    config::AppConfig,
    db::{self, DbConfig},
    entities::{BrandModel, CategoryModel, ProductModel},
    events::{self, EventSender},
    handlers::AppServices,
    services::catalog::{CreateProductInput, UpsertBrandInput, UpsertCategoryInput},
    AppState,
};

/// Harness spinning up the full router on a fresh SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    db_file: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        // One file per harness so parallel tests never share a schema.
        let db_file = format!("machinery_test_{}.db", Uuid::new_v4().simple());
        let _ = std::fs::remove_file(&db_file);

        let cfg = AppConfig {
            database_url: format!("sqlite://{db_file}?mode=rwc"),
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            log_level: "warn".to_string(),
            log_json: false,
            auto_migrate: true,
            cors_allowed_origins: None,
            session_cookie: "machinery_session".to_string(),
            db_max_connections: 1,
            db_min_connections: 1,
        };

        let pool = db::establish_connection_with_config(&DbConfig {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            ..Default::default()
        })
        .await
        .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        // SQLite does not enforce foreign keys unless asked to.
        pool.execute(Statement::from_string(
            DbBackend::Sqlite,
            "PRAGMA foreign_keys = ON;".to_string(),
        ))
        .await
        .expect("enable sqlite foreign keys");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), event_sender.clone());

        let state = AppState {
            db: db_arc,
            config: cfg.clone(),
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/health", machinery_store_api::handlers::health_routes())
            .nest("/api", machinery_store_api::api_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            db_file,
            _event_task: event_task,
        }
    }

    /// Send a request against the router, optionally carrying a session
    /// cookie and a JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        session: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(session_id) = session {
            builder = builder.header("cookie", format!("machinery_session={}", session_id));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_category(&self, slug: &str, name: &str) -> CategoryModel {
        self.state
            .services
            .catalog
            .upsert_category(UpsertCategoryInput {
                slug: slug.to_string(),
                name: name.to_string(),
                description: None,
                image_url: None,
            })
            .await
            .expect("seed category for tests")
    }

    pub async fn seed_brand(&self, slug: &str, name: &str) -> BrandModel {
        self.state
            .services
            .catalog
            .upsert_brand(UpsertBrandInput {
                slug: slug.to_string(),
                name: name.to_string(),
                description: None,
                logo_url: None,
                website: None,
            })
            .await
            .expect("seed brand for tests")
    }

    pub async fn seed_product(
        &self,
        slug: &str,
        name: &str,
        price: Decimal,
        category_id: Uuid,
        brand_id: Uuid,
    ) -> ProductModel {
        self.seed_product_with_specs(
            slug,
            name,
            price,
            category_id,
            brand_id,
            serde_json::json!({}),
        )
        .await
    }

    pub async fn seed_product_with_specs(
        &self,
        slug: &str,
        name: &str,
        price: Decimal,
        category_id: Uuid,
        brand_id: Uuid,
        specs: Value,
    ) -> ProductModel {
        self.state
            .services
            .catalog
            .create_product(CreateProductInput {
                slug: slug.to_string(),
                name: name.to_string(),
                description: format!("{} seeded for integration tests", name),
                price,
                stock_qty: 10,
                images: Vec::new(),
                specs,
                category_id,
                brand_id,
            })
            .await
            .expect("seed product for tests")
    }

    /// Flip a product's active flag directly in the store.
    pub async fn deactivate_product(&self, id: Uuid) {
        use machinery_store_api::entities::product;
        use sea_orm::{ActiveModelTrait, ActiveValue::Set};

        let model = product::ActiveModel {
            id: Set(id),
            is_active: Set(false),
            ..Default::default()
        };
        model
            .update(&*self.state.db)
            .await
            .expect("deactivate product");
    }

    /// Overwrite a product's list price directly in the store.
    pub async fn reprice_product(&self, id: Uuid, price: Decimal) {
        use machinery_store_api::entities::product;
        use sea_orm::{ActiveModelTrait, ActiveValue::Set};

        let model = product::ActiveModel {
            id: Set(id),
            price: Set(price),
            ..Default::default()
        };
        model
            .update(&*self.state.db)
            .await
            .expect("reprice product");
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
        let _ = std::fs::remove_file(&self.db_file);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_file));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_file));
    }
}

/// Collects a response body into JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
