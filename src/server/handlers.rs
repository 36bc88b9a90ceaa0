use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use swoptrader_core::entity::to_json_document;
use swoptrader_core::{
    Chat, ChatMessage, Collection, Comment, DecodeError, Document, Entity, EntityQuery, Envelope,
    Item, Meetup, Offer, Page, TradeHistory, User,
};

use super::AppState;

const DEFAULT_PAGE_SIZE: usize = 20;

pub type ApiResponse = (StatusCode, Json<Envelope<Value>>);

fn ok(data: Option<Value>) -> ApiResponse {
    (StatusCode::OK, Json(Envelope::ok(data)))
}

fn fail(status: StatusCode, message: impl Into<String>) -> ApiResponse {
    (status, Json(Envelope::failure(message)))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

type Decoder = fn(&str, &Document) -> Result<Value, DecodeError>;

/// Decodes a stored document into the entity's JSON body.
fn decode_as<T: Entity>(id: &str, doc: &Document) -> Result<Value, DecodeError> {
    let entity = T::from_document(id, doc)?;
    Ok(Value::Object(to_json_document(&entity)))
}

fn decoder(collection: Collection) -> Decoder {
    match collection {
        Collection::Items => decode_as::<Item>,
        Collection::Users => decode_as::<User>,
        Collection::Comments => decode_as::<Comment>,
        Collection::Chats => decode_as::<Chat>,
        Collection::ChatMessages => decode_as::<ChatMessage>,
        Collection::Offers => decode_as::<Offer>,
        Collection::Meetups => decode_as::<Meetup>,
        Collection::TradeHistory => decode_as::<TradeHistory>,
    }
}

fn parse_collection(name: &str) -> Result<Collection, ApiResponse> {
    name.parse()
        .map_err(|e: String| fail(StatusCode::NOT_FOUND, e))
}

/// `page` (1-based) and `pageSize` query parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PageRequest {
    page: u32,
    page_size: usize,
}

impl PageRequest {
    fn from_params(params: &[(String, String)]) -> Result<Option<Self>, String> {
        let lookup = |key: &str| params.iter().find(|(k, _)| k == key).map(|(_, v)| v);
        let page = lookup("page");
        let page_size = lookup("pageSize");
        if page.is_none() && page_size.is_none() {
            return Ok(None);
        }

        let page = match page {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| format!("Invalid page '{}'", raw))?,
            None => 1,
        };
        let page_size = match page_size {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|s| *s >= 1)
                .ok_or_else(|| format!("Invalid pageSize '{}'", raw))?,
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Some(Self { page, page_size }))
    }

    fn paginate(&self, items: Vec<Value>) -> Page<Value> {
        let total = items.len();
        let skip = (self.page as usize - 1).saturating_mul(self.page_size);
        let items: Vec<Value> = items.into_iter().skip(skip).take(self.page_size).collect();
        let has_more = skip + items.len() < total;

        Page {
            items,
            total: total as u64,
            page: self.page,
            has_more,
        }
    }
}

/// `GET /api/{collection}`: filtered list, paged when asked.
pub async fn list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResponse {
    let collection = match parse_collection(&collection) {
        Ok(collection) => collection,
        Err(response) => return response,
    };
    let query = match EntityQuery::from_params(&params) {
        Ok(query) => query,
        Err(e) => return fail(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let paging = match PageRequest::from_params(&params) {
        Ok(paging) => paging,
        Err(e) => return fail(StatusCode::BAD_REQUEST, e),
    };

    let docs = match state.store.query(collection, &query).await {
        Ok(docs) => docs,
        Err(e) => {
            tracing::error!("Query on {} failed: {}", collection, e);
            return fail(StatusCode::BAD_GATEWAY, e.to_string());
        }
    };

    let decode = decoder(collection);
    let items: Vec<Value> = docs
        .iter()
        .filter_map(|(id, doc)| match decode(id, doc) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Skipping {}/{}: {}", collection, id, e);
                None
            }
        })
        .collect();

    let data = match paging {
        Some(paging) => serde_json::to_value(paging.paginate(items)),
        None => Ok(Value::Array(items)),
    };
    match data {
        Ok(data) => ok(Some(data)),
        Err(e) => fail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// `GET /api/{collection}/{id}`: a missing document is `data: null`.
pub async fn get_one(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResponse {
    let collection = match parse_collection(&collection) {
        Ok(collection) => collection,
        Err(response) => return response,
    };

    match state.store.get(collection, &id).await {
        Ok(Some(doc)) => match decoder(collection)(&id, &doc) {
            Ok(value) => ok(Some(value)),
            Err(e) => fail(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        },
        Ok(None) => ok(None),
        Err(e) => {
            tracing::error!("Get {}/{} failed: {}", collection, id, e);
            fail(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}
