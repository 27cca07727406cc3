use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One result row, keyed by column name.
///
/// Keys iterate in the column order reported by the engine.
pub type Row = Map<String, Value>;

/// A query submission against one named database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Name of the target database.
    pub database: String,
    /// SQL text.
    pub query: String,
    /// Positional parameters bound to `?` placeholders.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub params: Vec<Value>,
}

impl Request {
    pub fn new(database: impl Into<String>, query: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            database: database.into(),
            query: query.into(),
            params,
        }
    }
}

/// The outcome of one request.
///
/// Successful responses carry `columns` and `rows` (each omitted when empty);
/// failed responses carry only `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Row>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Creates a successful response.
    pub fn ok(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            error: None,
        }
    }

    /// Creates an error-only response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_params_default_to_empty() {
        let req: Request = serde_json::from_value(json!({"database": "a", "query": "SELECT 1"})).unwrap();
        assert!(req.params.is_empty());

        let req: Request =
            serde_json::from_value(json!({"database": "a", "query": "SELECT 1", "params": null}))
                .unwrap();
        assert!(req.params.is_empty());
    }

    #[test]
    fn test_request_ignores_unknown_fields() {
        let req: Request = serde_json::from_value(
            json!({"database": "a", "query": "SELECT ?", "params": [1, "x"], "extra": true}),
        )
        .unwrap();
        assert_eq!(req.params, vec![json!(1), json!("x")]);
    }

    #[test]
    fn test_request_requires_database_and_query() {
        assert!(serde_json::from_value::<Request>(json!({"query": "SELECT 1"})).is_err());
        assert!(serde_json::from_value::<Request>(json!({"database": "a"})).is_err());
    }

    #[test]
    fn test_error_response_omits_result_fields() {
        let encoded = serde_json::to_value(Response::error("boom")).unwrap();
        assert_eq!(encoded, json!({"error": "boom"}));
    }

    #[test]
    fn test_ok_response_omits_error() {
        let mut row = Row::new();
        row.insert("x".to_string(), json!(1));
        let encoded = serde_json::to_value(Response::ok(vec!["x".to_string()], vec![row])).unwrap();
        assert_eq!(encoded, json!({"columns": ["x"], "rows": [{"x": 1}]}));
    }

    #[test]
    fn test_statement_without_columns_encodes_empty_object() {
        let encoded = serde_json::to_string(&Response::ok(vec![], vec![])).unwrap();
        assert_eq!(encoded, "{}");
    }

    #[test]
    fn test_row_keeps_column_order() {
        let mut row = Row::new();
        row.insert("z".to_string(), json!(1));
        row.insert("a".to_string(), json!(2));
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"z":1,"a":2}"#);
    }
}
