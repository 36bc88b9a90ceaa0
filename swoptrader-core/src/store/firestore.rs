//! Firestore REST (v1) client.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde_json::{json, Map, Value};

use super::value::{decode_fields, encode_fields, encode_value};
use super::{DocumentStore, StoreError};
use crate::documents::Document;
use crate::models::Collection;
use crate::query::{Direction, EntityQuery, Filter};

const PRODUCTION_HOST: &str = "https://firestore.googleapis.com";

/// Connection settings for a Firestore project.
#[derive(Debug, Clone, PartialEq)]
pub struct FirestoreSettings {
    pub project_id: String,
    pub database: String,
    /// `host:port` of a local emulator. When set, requests go over plain HTTP.
    pub emulator_host: Option<String>,
    /// OAuth access token sent as a bearer token.
    pub access_token: Option<String>,
}

impl FirestoreSettings {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: "(default)".to_string(),
            emulator_host: None,
            access_token: None,
        }
    }

    pub fn with_emulator(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// `.../v1/projects/{project}/databases/{database}/documents`
    pub fn documents_url(&self) -> String {
        let host = match &self.emulator_host {
            Some(host) if host.starts_with("http://") || host.starts_with("https://") => {
                host.trim_end_matches('/').to_string()
            }
            Some(host) => format!("http://{}", host.trim_end_matches('/')),
            None => PRODUCTION_HOST.to_string(),
        };
        format!(
            "{}/v1/projects/{}/databases/{}/documents",
            host, self.project_id, self.database
        )
    }
}

#[derive(Debug, Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    settings: FirestoreSettings,
}

impl FirestoreClient {
    pub fn new(settings: FirestoreSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &FirestoreSettings {
        &self.settings
    }

    fn document_url(&self, collection: Collection, id: &str) -> String {
        format!("{}/{}/{}", self.settings.documents_url(), collection, id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.settings.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Builds the `structuredQuery` body for a runQuery request.
pub(crate) fn structured_query(collection: Collection, query: &EntityQuery) -> Value {
    let mut structured = Map::new();
    structured.insert(
        "from".to_string(),
        json!([{ "collectionId": collection.as_str() }]),
    );

    let filters: Vec<Value> = query
        .filters
        .iter()
        .map(|filter| {
            let op = match filter {
                Filter::Equal(..) => "EQUAL",
                Filter::ArrayContains(..) => "ARRAY_CONTAINS",
            };
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": filter.field() },
                    "op": op,
                    "value": encode_value(filter.value()),
                }
            })
        })
        .collect();

    match filters.len() {
        0 => {}
        1 => {
            structured.insert("where".to_string(), filters[0].clone());
        }
        _ => {
            structured.insert(
                "where".to_string(),
                json!({ "compositeFilter": { "op": "AND", "filters": filters } }),
            );
        }
    }

    if let Some(order) = &query.order_by {
        let direction = match order.direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured.insert(
            "orderBy".to_string(),
            json!([{ "field": { "fieldPath": order.field }, "direction": direction }]),
        );
    }

    if let Some(limit) = query.limit {
        structured.insert("limit".to_string(), json!(limit));
    }

    json!({ "structuredQuery": structured })
}

/// Splits a `{name, fields}` document resource into its id and decoded body.
fn parse_document(resource: &Value) -> Result<(String, Document), StoreError> {
    let name = resource
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Malformed("document without a name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();
    let fields = resource
        .get("fields")
        .and_then(Value::as_object)
        .map(decode_fields)
        .unwrap_or_default();
    Ok((id, fields))
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let response = self
            .authorize(self.http.get(self.document_url(collection, id)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let resource: Value = Self::check(response).await?.json().await?;
        let (_, fields) = parse_document(&resource)?;
        Ok(Some(fields))
    }

    async fn set(&self, collection: Collection, id: &str, doc: Document) -> Result<(), StoreError> {
        // PATCH without an update mask replaces the whole document, creating it if needed
        let response = self
            .authorize(self.http.patch(self.document_url(collection, id)))
            .json(&json!({ "fields": encode_fields(&doc) }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        let mut params: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let response = self
            .authorize(self.http.patch(self.document_url(collection, id)))
            .query(&params)
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let response = self
            .authorize(self.http.delete(self.document_url(collection, id)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        query: &EntityQuery,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let url = format!("{}:runQuery", self.settings.documents_url());
        let response = self
            .authorize(self.http.post(url))
            .json(&structured_query(collection, query))
            .send()
            .await?;

        let results: Vec<Value> = Self::check(response).await?.json().await?;

        // Results without a `document` key only carry a readTime
        results
            .iter()
            .filter_map(|result| result.get("document"))
            .map(parse_document)
            .collect()
    }
}
