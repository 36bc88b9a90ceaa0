use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::AppState;

/// API key entry in config
#[derive(Debug, Clone, Deserialize)]
struct ApiKeyEntry {
    key: String,
    user_id: String,
}

/// Config file structure
#[derive(Debug, Clone, Deserialize, Default)]
struct KeyFile {
    #[serde(default)]
    api_keys: Vec<ApiKeyEntry>,
}

/// Authenticated caller, added to request extensions after auth
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: String,
}

/// API key store - maps key -> AuthUser
#[derive(Debug, Clone, Default)]
pub struct ApiKeyStore {
    keys: HashMap<String, AuthUser>,
}

impl ApiKeyStore {
    /// Load API keys from a YAML file. Unreadable files yield an empty store.
    pub fn load(config_path: &Path) -> Self {
        let keys = match std::fs::read_to_string(config_path) {
            Ok(contents) => match serde_yaml::from_str::<KeyFile>(&contents) {
                Ok(file) => {
                    let map: HashMap<_, _> = file
                        .api_keys
                        .into_iter()
                        .map(|entry| {
                            (
                                entry.key,
                                AuthUser {
                                    user_id: entry.user_id,
                                },
                            )
                        })
                        .collect();
                    tracing::info!("Loaded {} API key(s)", map.len());
                    map
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    HashMap::new()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
                HashMap::new()
            }
        };

        let store = Self { keys };
        if store.is_open() {
            tracing::warn!("No API keys loaded - /api routes accept unauthenticated requests");
        }
        store
    }

    pub fn from_keys<I, K, U>(keys: I) -> Self
    where
        I: IntoIterator<Item = (K, U)>,
        K: Into<String>,
        U: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(|(key, user)| (key.into(), AuthUser { user_id: user.into() }))
                .collect(),
        }
    }

    /// No keys configured: every request is let through.
    pub fn is_open(&self) -> bool {
        self.keys.is_empty()
    }

    /// Validate an API key and return the associated user
    pub fn validate(&self, key: &str) -> Option<AuthUser> {
        self.keys.get(key).cloned()
    }
}

/// Auth error response
#[derive(Serialize)]
struct AuthError {
    error: &'static str,
    message: &'static str,
}

fn unauthorized(error: &'static str, message: &'static str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(AuthError { error, message })).into_response()
}

/// Bearer-key check for the `/api` routes
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if state.api_keys.is_open() {
        return next.run(request).await;
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let api_key = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(key) => key,
            None => {
                return unauthorized(
                    "invalid_auth",
                    "Authorization header must use Bearer scheme",
                )
            }
        },
        None => return unauthorized("missing_auth", "Authorization header required"),
    };

    match state.api_keys.validate(api_key) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => unauthorized("invalid_key", "Invalid API key"),
    }
}
