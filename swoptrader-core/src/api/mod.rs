//! Client for the SwopTrader REST backend.
//!
//! Every response is wrapped in an [`Envelope`]; list endpoints return
//! either a bare array or a [`Page`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::Entity;
use crate::query::EntityQuery;
use crate::sync::{RemoteSource, SourceError};

/// `{"success": bool, "data": T, "error"?: string}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<D> {
    pub success: bool,
    pub data: Option<D>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<D> Envelope<D> {
    pub fn ok(data: Option<D>) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListData<T> {
    Page(Page<T>),
    Items(Vec<T>),
}

impl<T> ListData<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            ListData::Page(page) => page.items,
            ListData::Items(items) => items,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request<D: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Option<D>, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let mut request = self.http.get(&url).query(params);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let envelope: Envelope<D> = response.json().await?;
        if !envelope.success {
            return Err(SourceError::Rejected(
                envelope
                    .error
                    .unwrap_or_else(|| "request failed".to_string()),
            ));
        }
        Ok(envelope.data)
    }
}

#[async_trait]
impl<T: Entity> RemoteSource<T> for ApiClient {
    async fn fetch(&self, id: &str) -> Result<Option<T>, SourceError> {
        self.request(&format!("/api/{}/{}", T::COLLECTION, id), &[])
            .await
    }

    async fn fetch_all(&self, query: &EntityQuery) -> Result<Vec<T>, SourceError> {
        let data: Option<ListData<T>> = self
            .request(&format!("/api/{}", T::COLLECTION), &query.to_params())
            .await?;
        Ok(data.map(ListData::into_items).unwrap_or_default())
    }
}
