//! Thin wrapper around the SurrealDB SDK
//!
//! Connects through the `any` engine so one endpoint string selects the
//! backend:
//!
//! - **Memory**: `mem://`, for tests and dry runs
//! - **File**: `rocksdb://path/to/db`
//! - **Remote**: `ws://host:port`, with root credentials
//!
//! ```no_run
//! use docgeom_surrealdb::SurrealClient;
//!
//! # async fn example() -> Result<(), docgeom_surrealdb::SurrealError> {
//! let client = SurrealClient::new_memory().await?;
//! let rows = client.query("SELECT * FROM record_link LIMIT 10", &[]).await?;
//! println!("{} documents", rows.len());
//! # Ok(())
//! # }
//! ```

use crate::error::{SurrealError, SurrealResult};
use docgeom_config::SourceStoreConfig;
use serde_json::{Map, Value};
use std::sync::Arc;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::debug;

/// One document returned by a query, with SurrealDB type wrappers removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// `table:key` when the query returned an `id` field
    pub id: Option<String>,
    pub data: Map<String, Value>,
}

impl Document {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

/// SurrealDB connection scoped to one namespace and database.
///
/// Cloning shares the connection.
#[derive(Clone)]
pub struct SurrealClient {
    inner: Arc<SurrealClientInner>,
}

struct SurrealClientInner {
    db: Surreal<Any>,
    endpoint: String,
}

impl std::fmt::Debug for SurrealClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurrealClient")
            .field("endpoint", &self.inner.endpoint)
            .finish()
    }
}

impl SurrealClient {
    /// Connect to `config.host`, sign in when credentials are set and select
    /// the configured namespace and database
    pub async fn connect(config: &SourceStoreConfig) -> SurrealResult<Self> {
        let endpoint = config.host.trim().to_string();
        let db = any::connect(endpoint.as_str())
            .await
            .map_err(|e| SurrealError::Connection {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            db.signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await
            .map_err(|e| SurrealError::Auth(e.to_string()))?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| SurrealError::Connection {
                endpoint: endpoint.clone(),
                message: format!(
                    "cannot use namespace '{}' and database '{}': {}",
                    config.namespace, config.database, e
                ),
            })?;

        debug!(%endpoint, namespace = %config.namespace, database = %config.database, "Connected to SurrealDB");

        Ok(Self {
            inner: Arc::new(SurrealClientInner { db, endpoint }),
        })
    }

    /// In-memory database in the default `docs` namespace
    pub async fn new_memory() -> SurrealResult<Self> {
        let config = SourceStoreConfig {
            host: "mem://".to_string(),
            namespace: "docs".to_string(),
            database: "docs".to_string(),
            username: None,
            password: None,
            table_meta_table: "table_meta".to_string(),
            record_link_table: "record_link".to_string(),
            table_meta_limit: docgeom_config::DEFAULT_TABLE_META_LIMIT,
            record_link_limit: docgeom_config::DEFAULT_RECORD_LINK_LIMIT,
        };
        Self::connect(&config).await
    }

    /// Run a SurrealQL statement and return the documents of its first result set.
    ///
    /// `params` are objects whose entries are bound by name, e.g.
    /// `json!({"table": "record_link", "limit": 10})`.
    pub async fn query(&self, sql: &str, params: &[Value]) -> SurrealResult<Vec<Document>> {
        let mut query = self.inner.db.query(sql);
        for param in params {
            if let Value::Object(map) = param {
                for (key, value) in map {
                    query = query.bind((key.clone(), value.clone()));
                }
            }
        }

        let response = query
            .await
            .map_err(|e| SurrealError::Query(format!("Query execution failed: {}", e)))?;
        let mut response = response
            .check()
            .map_err(|e| SurrealError::Query(format!("Query returned error: {}", e)))?;

        let surreal_value: surrealdb::Value = response
            .take(0)
            .map_err(|e| SurrealError::Query(format!("Failed to extract query results: {}", e)))?;

        // Round-trip through JSON, then strip the {"Strand": ..} style wrappers
        let json_value = serde_json::to_value(&surreal_value)
            .map_err(|e| SurrealError::Query(format!("Failed to serialize result: {}", e)))?;

        let items = match unwrap_surreal_value(json_value) {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };

        Ok(items.into_iter().map(into_document).collect())
    }
}

fn into_document(value: Value) -> Document {
    let mut data = match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    let id = data
        .remove("id")
        .and_then(|v| v.as_str().map(str::to_string));
    Document { id, data }
}

/// Remove SurrealDB's typed wrappers from a serialized value.
///
/// `{"Number": {"Int": 30}}` becomes `30`, `{"Strand": "a"}` becomes `"a"` and a
/// `Thing` becomes `"table:key"`. Plain JSON passes through unchanged.
pub(crate) fn unwrap_surreal_value(value: Value) -> Value {
    let mut obj = match value {
        Value::Object(obj) => obj,
        Value::Array(items) => {
            return Value::Array(items.into_iter().map(unwrap_surreal_value).collect())
        }
        other => return other,
    };

    if obj.len() == 1 {
        if let Some(inner) = obj.remove("Number") {
            return match inner {
                Value::Object(mut num) => num
                    .remove("Int")
                    .or_else(|| num.remove("Float"))
                    .or_else(|| {
                        num.remove("Decimal")
                            .and_then(|d| d.as_str().and_then(|s| s.parse::<f64>().ok()))
                            .map(Value::from)
                    })
                    .unwrap_or(Value::Object(num)),
                other => other,
            };
        }
        for wrapper in ["Strand", "String", "Datetime", "Uuid"] {
            if let Some(Value::String(s)) = obj.get(wrapper) {
                return Value::String(s.clone());
            }
        }
        if let Some(Value::Bool(b)) = obj.get("Bool") {
            return Value::Bool(*b);
        }
        if obj.contains_key("None") || obj.contains_key("Null") {
            return Value::Null;
        }
        if let Some(thing) = obj.remove("Thing") {
            return unwrap_thing(thing);
        }
        if let Some(inner) = obj.remove("Array") {
            return unwrap_surreal_value(inner);
        }
        if let Some(inner) = obj.remove("Object") {
            return unwrap_surreal_value(inner);
        }
    }

    Value::Object(
        obj.into_iter()
            .map(|(k, v)| (k, unwrap_surreal_value(v)))
            .collect(),
    )
}

fn unwrap_thing(thing: Value) -> Value {
    let Value::Object(mut thing) = thing else {
        return thing;
    };
    let table = thing
        .remove("tb")
        .and_then(|v| v.as_str().map(str::to_string));
    let key = thing.remove("id").map(unwrap_surreal_value);
    match (table, key) {
        (Some(table), Some(Value::String(key))) => Value::String(format!("{}:{}", table, key)),
        (Some(table), Some(Value::Number(key))) => Value::String(format!("{}:{}", table, key)),
        (Some(table), Some(other)) => Value::String(format!("{}:{}", table, other)),
        _ => Value::Object(thing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_scalars() {
        assert_eq!(
            unwrap_surreal_value(json!({"Number": {"Int": 30}})),
            json!(30)
        );
        assert_eq!(
            unwrap_surreal_value(json!({"Number": {"Float": -26.2}})),
            json!(-26.2)
        );
        assert_eq!(unwrap_surreal_value(json!({"Strand": "A123"})), json!("A123"));
        assert_eq!(unwrap_surreal_value(json!({"Bool": true})), json!(true));
    }

    #[test]
    fn test_unwrap_thing() {
        assert_eq!(
            unwrap_surreal_value(json!({"Thing": {"tb": "record_link", "id": {"Number": 7}}})),
            json!("record_link:7")
        );
        assert_eq!(
            unwrap_surreal_value(json!({"Thing": {"tb": "record_link", "id": {"String": "abc"}}})),
            json!("record_link:abc")
        );
    }

    #[test]
    fn test_unwrap_nested_document() {
        let wrapped = json!({"Array": [{"Object": {
            "keyValue": {"Strand": "A123"},
            "lat": {"Number": {"Float": 0.0}},
            "tableID": {"Number": {"Int": 1}}
        }}]});
        assert_eq!(
            unwrap_surreal_value(wrapped),
            json!([{"keyValue": "A123", "lat": 0.0, "tableID": 1}])
        );
    }

    #[test]
    fn test_plain_json_passes_through() {
        let plain = json!([{"keyValue": "A123", "lat": 0.5}]);
        assert_eq!(unwrap_surreal_value(plain.clone()), plain);
    }

    #[tokio::test]
    async fn test_memory_query_round_trip() {
        let client = SurrealClient::new_memory().await.unwrap();
        client
            .query(
                "CREATE type::thing('table_meta', 1) CONTENT { db: 'gis', table: 'Parcels', keyField: 'ParcelID' }",
                &[],
            )
            .await
            .unwrap();

        let docs = client
            .query("SELECT *, meta::id(id) AS record_key FROM table_meta", &[])
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("table").and_then(Value::as_str), Some("Parcels"));
        assert_eq!(docs[0].get("record_key").and_then(Value::as_i64), Some(1));
    }

    #[tokio::test]
    async fn test_bad_endpoint_is_a_connection_error() {
        let config = SourceStoreConfig {
            host: "nosuchscheme://x".to_string(),
            namespace: "docs".to_string(),
            database: "docs".to_string(),
            username: None,
            password: None,
            table_meta_table: "table_meta".to_string(),
            record_link_table: "record_link".to_string(),
            table_meta_limit: 1,
            record_link_limit: 1,
        };
        let err = SurrealClient::connect(&config).await.unwrap_err();
        assert!(matches!(err, SurrealError::Connection { .. }));
    }
}
