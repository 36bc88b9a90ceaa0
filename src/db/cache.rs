use async_trait::async_trait;
use serde_json::Value;
use sqlx::SqlitePool;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;

use swoptrader_core::models::now_millis;
use swoptrader_core::query::{Direction, EntityQuery, Filter};
use swoptrader_core::sync::{CacheError, CacheProvider, LocalCache};
use swoptrader_core::Entity;

/// One cached entity: its JSON body and when it was written.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CacheRow {
    pub id: String,
    pub data: String,
    pub cached_at: i64,
}

impl CacheRow {
    pub fn from_entity<T: Entity>(entity: &T) -> Result<Self, CacheError> {
        let data = serde_json::to_string(entity).map_err(|e| CacheError::Corrupt {
            id: entity.id().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            id: entity.id().to_string(),
            data,
            cached_at: now_millis(),
        })
    }

    pub fn to_entity<T: Entity>(&self) -> Result<T, CacheError> {
        serde_json::from_str(&self.data).map_err(|e| CacheError::Corrupt {
            id: self.id.clone(),
            message: e.to_string(),
        })
    }
}

/// A value bound into a cache query.
#[derive(Debug, Clone, PartialEq)]
enum SqlArg {
    Int(i64),
    Real(f64),
    Text(String),
}

impl SqlArg {
    /// Matches how SQLite's JSON functions surface a JSON value.
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(SqlArg::Int(i64::from(*b))),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => SqlArg::Int(i),
                None => SqlArg::Real(n.as_f64().unwrap_or_default()),
            }),
            Value::String(s) => Some(SqlArg::Text(s.clone())),
            other => Some(SqlArg::Text(other.to_string())),
        }
    }
}

fn json_path(field: &str) -> SqlArg {
    SqlArg::Text(format!("$.{}", field))
}

/// Translates a query into SQL over the JSON `data` column.
fn select_sql(table: &str, query: &EntityQuery) -> (String, Vec<SqlArg>) {
    let mut sql = format!("SELECT id, data, cached_at FROM {}", table);
    let mut args = Vec::new();
    let mut clauses = Vec::new();

    for filter in &query.filters {
        match filter {
            Filter::Equal(field, value) => match SqlArg::from_json(value) {
                Some(arg) => {
                    clauses.push("json_extract(data, ?) = ?");
                    args.push(json_path(field));
                    args.push(arg);
                }
                None => {
                    clauses.push("json_extract(data, ?) IS NULL");
                    args.push(json_path(field));
                }
            },
            Filter::ArrayContains(field, value) => match SqlArg::from_json(value) {
                Some(arg) => {
                    clauses.push(
                        "EXISTS (SELECT 1 FROM json_each(data, ?) WHERE json_each.value = ?)",
                    );
                    args.push(json_path(field));
                    args.push(arg);
                }
                None => {
                    clauses.push(
                        "EXISTS (SELECT 1 FROM json_each(data, ?) WHERE json_each.value IS NULL)",
                    );
                    args.push(json_path(field));
                }
            },
        }
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    match &query.order_by {
        Some(order) => {
            let direction = match order.direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            sql.push_str(&format!(" ORDER BY json_extract(data, ?) {}, id", direction));
            args.push(json_path(&order.field));
        }
        None => sql.push_str(" ORDER BY id"),
    }

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        args.push(SqlArg::Int(limit as i64));
    }

    (sql, args)
}

fn backend(e: sqlx::Error) -> CacheError {
    CacheError::Backend(e.to_string())
}

/// Local cache table for one entity type.
pub struct SqliteCache<T> {
    pool: SqlitePool,
    changes: watch::Sender<u64>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> SqliteCache<T> {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            pool,
            changes,
            _entity: PhantomData,
        }
    }

    fn table() -> &'static str {
        T::COLLECTION.as_str()
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    fn upsert_sql() -> String {
        format!(
            "INSERT INTO {} (id, data, cached_at) VALUES (?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, cached_at = excluded.cached_at",
            Self::table()
        )
    }
}

#[async_trait]
impl<T: Entity> LocalCache<T> for SqliteCache<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, CacheError> {
        let sql = format!("SELECT id, data, cached_at FROM {} WHERE id = ?", Self::table());
        let row: Option<CacheRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(|row| row.to_entity()).transpose()
    }

    async fn query(&self, query: &EntityQuery) -> Result<Vec<T>, CacheError> {
        let (sql, args) = select_sql(Self::table(), query);

        let mut statement = sqlx::query_as::<_, CacheRow>(&sql);
        for arg in args {
            statement = match arg {
                SqlArg::Int(i) => statement.bind(i),
                SqlArg::Real(f) => statement.bind(f),
                SqlArg::Text(s) => statement.bind(s),
            };
        }

        let rows = statement.fetch_all(&self.pool).await.map_err(backend)?;
        rows.iter().map(CacheRow::to_entity).collect()
    }

    async fn upsert(&self, entity: &T) -> Result<(), CacheError> {
        let row = CacheRow::from_entity(entity)?;
        sqlx::query(&Self::upsert_sql())
            .bind(&row.id)
            .bind(&row.data)
            .bind(row.cached_at)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        self.notify();
        Ok(())
    }

    async fn upsert_all(&self, entities: &[T]) -> Result<(), CacheError> {
        let sql = Self::upsert_sql();
        let mut tx = self.pool.begin().await.map_err(backend)?;

        for entity in entities {
            let row = CacheRow::from_entity(entity)?;
            sqlx::query(&sql)
                .bind(&row.id)
                .bind(&row.data)
                .bind(row.cached_at)
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        }

        tx.commit().await.map_err(backend)?;
        self.notify();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), CacheError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", Self::table());
        sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        self.notify();
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

/// Hands out SQLite-backed caches sharing one pool.
#[derive(Debug, Clone)]
pub struct SqliteCacheProvider {
    pool: SqlitePool,
}

impl SqliteCacheProvider {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl CacheProvider for SqliteCacheProvider {
    fn cache<T: Entity>(&self) -> Arc<dyn LocalCache<T>> {
        Arc::new(SqliteCache::<T>::new(self.pool.clone()))
    }
}
