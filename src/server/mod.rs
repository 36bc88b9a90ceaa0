//! REST backend serving documents in the `{success, data}` envelope.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `GET /api/{collection}`: List documents. Accepts `eq.<field>`,
//!   `contains.<field>`, `order` and `limit`; `page` / `pageSize` switch
//!   the response to a `Page`.
//! - `GET /api/{collection}/{id}`: One document, `data: null` when absent.

mod auth;
mod handlers;
mod seed;

pub use auth::{auth_middleware, ApiKeyStore, AuthUser};
pub use seed::{seed_store, SeedError};

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use swoptrader_core::DocumentStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub api_keys: Arc<ApiKeyStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, api_keys: ApiKeyStore) -> Self {
        Self {
            store,
            api_keys: Arc::new(api_keys),
        }
    }
}

pub fn router(state: AppState) -> Router {
    // Public routes (no auth)
    let public_routes = Router::new().route("/health", get(handlers::health));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/{collection}", get(handlers::list))
        .route("/api/{collection}/{id}", get(handlers::get_one))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use swoptrader_core::{Collection, DocumentCodec, Item, MemoryDocumentStore};
    use tower::ServiceExt;

    async fn seeded_store() -> Arc<MemoryDocumentStore> {
        let store = Arc::new(MemoryDocumentStore::new());
        for (id, name, owner, created_at) in [
            ("item_1", "Lamp", "alice", 1),
            ("item_2", "Desk", "alice", 2),
            ("item_3", "Bike", "bob", 3),
        ] {
            let mut item = Item::new(name, owner);
            item.id = id.to_string();
            item.created_at = created_at;
            store
                .set(Collection::Items, id, item.to_document())
                .await
                .unwrap();
        }
        store
    }

    async fn app(keys: ApiKeyStore) -> (Router, Arc<MemoryDocumentStore>) {
        let store = seeded_store().await;
        (router(AppState::new(store.clone(), keys)), store)
    }

    async fn send(app: Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(ApiKeyStore::default()).await;
        let (status, body) = send(app, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_get_one_and_missing() {
        let (app, _) = app(ApiKeyStore::default()).await;

        let (status, body) = send(app.clone(), "/api/items/item_1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Lamp");
        assert_eq!(body["data"]["ownerId"], "alice");

        let (status, body) = send(app, "/api/items/item_9", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": null}));
    }

    #[tokio::test]
    async fn test_list_with_filters() {
        let (app, _) = app(ApiKeyStore::default()).await;

        let (status, body) = send(
            app,
            "/api/items?eq.ownerId=%22alice%22&order=createdAt.desc",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Desk", "Lamp"]);
    }

    #[tokio::test]
    async fn test_list_paged() {
        let (app, _) = app(ApiKeyStore::default()).await;

        let (status, body) =
            send(app, "/api/items?order=createdAt.asc&page=2&pageSize=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 3);
        assert_eq!(body["data"]["page"], 2);
        assert_eq!(body["data"]["hasMore"], false);
        assert_eq!(body["data"]["items"][0]["name"], "Bike");
    }

    #[tokio::test]
    async fn test_list_skips_malformed_documents() {
        let (app, store) = app(ApiKeyStore::default()).await;
        let mut orphan = serde_json::Map::new();
        orphan.insert("name".into(), json!("No owner"));
        store.set(Collection::Items, "item_bad", orphan).await.unwrap();

        let (_, body) = send(app, "/api/items", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_collection_and_bad_query() {
        let (app, _) = app(ApiKeyStore::default()).await;

        let (status, body) = send(app.clone(), "/api/widgets", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, _) = send(app, "/api/items?limit=lots", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_outage_is_a_failure_envelope() {
        let (app, store) = app(ApiKeyStore::default()).await;
        store.set_offline(true);

        let (status, body) = send(app, "/api/items", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_auth_required_when_keys_configured() {
        let (app, _) = app(ApiKeyStore::from_keys([("secret", "alice")])).await;

        let (status, body) = send(app.clone(), "/api/items", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_auth");

        let (status, body) = send(app.clone(), "/api/items", Some("wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_key");

        let (status, _) = send(app.clone(), "/api/items", Some("secret")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(app, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_client_reads_through_live_server() {
        use crate::db::{init_db, SqliteCacheProvider};
        use swoptrader_core::{ApiClient, DataSources, Repositories};

        let (app, _) = app(ApiKeyStore::from_keys([("secret", "alice")])).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        let base_url = format!("http://{}", addr);

        let health: Value = reqwest::get(format!("{}/health", base_url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");

        let temp_dir = tempfile::tempdir().unwrap();
        let pool = init_db(&temp_dir.path().join("cache.db")).await.unwrap();
        let sources =
            DataSources::offline().with_api(ApiClient::new(&base_url).with_token("secret"));
        let repos = Repositories::new(&sources, &SqliteCacheProvider::new(pool.clone()));

        let owned = repos.items.list_by_owner("alice").await.unwrap();
        assert_eq!(owned.len(), 2);

        // Mirrored into the local cache: still readable with no remotes.
        let offline = Repositories::new(&DataSources::offline(), &SqliteCacheProvider::new(pool));
        let lamp = offline.items.get("item_1").await.unwrap().unwrap();
        assert_eq!(lamp.name, "Lamp");
    }
}
