//! Source-independent description of the queries the data layer issues.
//!
//! Each backing store interprets an [`EntityQuery`] its own way: the REST
//! client encodes it as query parameters, the Firestore client as a
//! `structuredQuery`, the SQLite cache as `json_extract` clauses, and the
//! in-memory stores evaluate it directly against JSON documents.

use serde_json::Value;
use std::cmp::Ordering;

use crate::documents::Document;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// field == value
    Equal(String, Value),
    /// field is an array containing value
    ArrayContains(String, Value),
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Filter::Equal(field, _) | Filter::ArrayContains(field, _) => field,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Filter::Equal(_, value) | Filter::ArrayContains(_, value) => value,
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Equal(field, value) => doc.get(field).unwrap_or(&Value::Null) == value,
            Filter::ArrayContains(field, value) => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|values| values.contains(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Equality / array-contains filters, a single ordering and a limit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityQuery {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryParamError {
    #[error("Invalid value for '{0}': {1}")]
    InvalidValue(String, String),
    #[error("Invalid order '{0}', expected <field>.asc or <field>.desc")]
    InvalidOrder(String),
    #[error("Invalid limit '{0}'")]
    InvalidLimit(String),
}

impl EntityQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Equal(field.into(), value.into()));
        self
    }

    pub fn where_contains(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters
            .push(Filter::ArrayContains(field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Filters, orders and truncates keyed documents.
    pub fn apply<K>(&self, docs: Vec<(K, Document)>) -> Vec<(K, Document)> {
        let mut matched: Vec<(K, Document)> =
            docs.into_iter().filter(|(_, doc)| self.matches(doc)).collect();

        if let Some(order) = &self.order_by {
            matched.sort_by(|(_, a), (_, b)| {
                let ordering = compare_values(a.get(&order.field), b.get(&order.field));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }

        matched
    }

    /// Encodes the query as REST query parameters. Values are JSON literals.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        for filter in &self.filters {
            let prefix = match filter {
                Filter::Equal(..) => "eq",
                Filter::ArrayContains(..) => "contains",
            };
            params.push((
                format!("{}.{}", prefix, filter.field()),
                filter.value().to_string(),
            ));
        }
        if let Some(order) = &self.order_by {
            params.push((
                "order".to_string(),
                format!("{}.{}", order.field, order.direction.as_str()),
            ));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Decodes parameters produced by [`EntityQuery::to_params`]. Unknown keys are ignored.
    pub fn from_params(params: &[(String, String)]) -> Result<Self, QueryParamError> {
        let mut query = Self::default();

        for (key, raw) in params {
            if let Some(field) = key.strip_prefix("eq.") {
                query = query.where_eq(field, parse_param_value(key, raw)?);
            } else if let Some(field) = key.strip_prefix("contains.") {
                query = query.where_contains(field, parse_param_value(key, raw)?);
            } else if key == "order" {
                let (field, direction) = raw
                    .rsplit_once('.')
                    .ok_or_else(|| QueryParamError::InvalidOrder(raw.clone()))?;
                let direction = match direction {
                    "asc" => Direction::Ascending,
                    "desc" => Direction::Descending,
                    _ => return Err(QueryParamError::InvalidOrder(raw.clone())),
                };
                query = query.order_by(field, direction);
            } else if key == "limit" {
                let limit = raw
                    .parse()
                    .map_err(|_| QueryParamError::InvalidLimit(raw.clone()))?;
                query = query.limit(limit);
            }
        }

        Ok(query)
    }
}

fn parse_param_value(key: &str, raw: &str) -> Result<Value, QueryParamError> {
    serde_json::from_str(raw).map_err(|e| QueryParamError::InvalidValue(key.to_string(), e.to_string()))
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over optional JSON values; missing and null sort first.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn keyed(docs: Vec<Value>) -> Vec<(usize, Document)> {
        docs.into_iter().map(doc).enumerate().collect()
    }

    #[test]
    fn test_equal_filter() {
        let query = EntityQuery::all().where_eq("ownerId", "u1");
        assert!(query.matches(&doc(json!({"ownerId": "u1"}))));
        assert!(!query.matches(&doc(json!({"ownerId": "u2"}))));
        assert!(!query.matches(&doc(json!({}))));
    }

    #[test]
    fn test_array_contains_filter() {
        let query = EntityQuery::all().where_contains("participantIds", "bob");
        assert!(query.matches(&doc(json!({"participantIds": ["alice", "bob"]}))));
        assert!(!query.matches(&doc(json!({"participantIds": ["alice"]}))));
        assert!(!query.matches(&doc(json!({"participantIds": "bob"}))));
    }

    #[test]
    fn test_apply_orders_descending_and_limits() {
        let docs = keyed(vec![
            json!({"createdAt": 1}),
            json!({"createdAt": 3}),
            json!({"createdAt": 2}),
        ]);

        let result = EntityQuery::all()
            .order_by("createdAt", Direction::Descending)
            .limit(2)
            .apply(docs);

        let order: Vec<i64> = result
            .iter()
            .map(|(_, d)| d["createdAt"].as_i64().unwrap())
            .collect();
        assert_eq!(order, vec![3, 2]);
    }

    #[test]
    fn test_missing_order_field_sorts_first_ascending() {
        let docs = keyed(vec![json!({"createdAt": 5}), json!({})]);
        let result = EntityQuery::all()
            .order_by("createdAt", Direction::Ascending)
            .apply(docs);
        assert_eq!(result[0].0, 1);
    }

    #[test]
    fn test_params_roundtrip() {
        let query = EntityQuery::all()
            .where_eq("ownerId", "u1")
            .where_eq("isAvailable", true)
            .where_contains("participantIds", "bob")
            .order_by("created.at", Direction::Descending)
            .limit(10);

        let params = query.to_params();
        assert!(params.contains(&("eq.ownerId".to_string(), "\"u1\"".to_string())));
        assert!(params.contains(&("limit".to_string(), "10".to_string())));

        let parsed = EntityQuery::from_params(&params).unwrap();
        assert_eq!(parsed, query);
    }

    #[test]
    fn test_from_params_rejects_bad_order() {
        let params = vec![("order".to_string(), "createdAt.sideways".to_string())];
        assert_eq!(
            EntityQuery::from_params(&params),
            Err(QueryParamError::InvalidOrder("createdAt.sideways".into()))
        );
    }

    #[test]
    fn test_from_params_rejects_unquoted_string() {
        let params = vec![("eq.ownerId".to_string(), "u1".to_string())];
        assert!(EntityQuery::from_params(&params).is_err());
    }
}
