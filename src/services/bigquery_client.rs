//! BigQuery REST client (`jobs.query`)
//!
//! Rows come back as `{"f": [{"v": ...}]}` tuples; they are converted into JSON
//! objects keyed by column name so the normalizer sees the same row shape as
//! from the MySQL client.

use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::WarehouseConfig;
use crate::utils::{ApiError, ApiResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    dry_run: bool,
    timeout_ms: u64,
}

#[derive(Clone)]
pub struct BigQueryClient {
    http_client: Client,
    api_base: String,
    project_id: String,
    access_token: String,
    timeout_secs: u64,
}

impl BigQueryClient {
    pub fn new(config: &WarehouseConfig) -> ApiResult<Self> {
        let project_id = config
            .project_id
            .clone()
            .ok_or_else(|| ApiError::connection_unavailable("warehouse.project_id not configured"))?;
        let access_token = config
            .access_token
            .clone()
            .ok_or_else(|| ApiError::connection_unavailable("warehouse.access_token not configured"))?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::internal_error(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            project_id,
            access_token,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Run a query and return its rows as JSON objects
    pub async fn query(&self, sql: &str) -> ApiResult<Vec<Value>> {
        let response = self.jobs_query(self.query_body(sql)).await?;

        if response.get("jobComplete").and_then(Value::as_bool) == Some(false) {
            return Err(ApiError::backend_failure(format!(
                "BigQuery job did not complete within {}s",
                self.timeout_secs
            )));
        }

        let rows = rows_to_objects(&response);
        tracing::debug!("[Warehouse] Query returned {} rows", rows.len());
        Ok(rows)
    }

    /// Validate a query without executing it. The raw response carries
    /// `totalBytesProcessed`.
    pub async fn dry_run(&self, sql: &str) -> ApiResult<Value> {
        self.jobs_query(self.dry_run_body(sql)).await
    }

    /// Body that runs the job
    fn query_body<'a>(&self, sql: &'a str) -> QueryRequest<'a> {
        QueryRequest {
            query: sql,
            use_legacy_sql: false,
            dry_run: false,
            timeout_ms: self.timeout_secs * 1000,
        }
    }

    /// Body that only plans the job; BigQuery never executes a dry run
    fn dry_run_body<'a>(&self, sql: &'a str) -> QueryRequest<'a> {
        QueryRequest { dry_run: true, ..self.query_body(sql) }
    }

    async fn jobs_query(&self, body: QueryRequest<'_>) -> ApiResult<Value> {
        let url = format!(
            "{}/projects/{}/queries",
            self.api_base,
            urlencoding::encode(&self.project_id)
        );

        tracing::debug!("[Warehouse] POST {} (dry_run={})", url, body.dry_run);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("[Warehouse] Request failed: {}", e);
                if e.is_timeout() || e.is_connect() {
                    ApiError::connection_unavailable(format!("BigQuery unreachable: {}", e))
                } else {
                    ApiError::backend_failure(format!("BigQuery request failed: {}", e))
                }
            })?;

        let status = response.status();
        let payload: Value = response.json().await.map_err(|e| {
            ApiError::backend_failure(format!("Failed to parse BigQuery response: {}", e))
        })?;

        if !status.is_success() {
            let message = payload
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| payload.to_string());
            tracing::warn!("[Warehouse] API error {}: {}", status, message);
            return Err(ApiError::backend_failure(message));
        }

        Ok(payload)
    }
}

/// Zip `schema.fields[].name` with each row's `f[].v`
pub fn rows_to_objects(response: &Value) -> Vec<Value> {
    let columns: Vec<&str> = response
        .pointer("/schema/fields")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .map(|f| f.get("name").and_then(Value::as_str).unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();

    let Some(rows) = response.get("rows").and_then(Value::as_array) else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| {
            let mut obj = Map::new();
            let cells = row.get("f").and_then(Value::as_array);
            for (i, col_name) in columns.iter().enumerate() {
                let value = cells
                    .and_then(|c| c.get(i))
                    .and_then(|cell| cell.get("v"))
                    .cloned()
                    .unwrap_or(Value::Null);
                obj.insert(col_name.to_string(), value);
            }
            Value::Object(obj)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_to_objects() {
        let response = json!({
            "schema": {"fields": [{"name": "project_id"}, {"name": "total_bytes_billed"}]},
            "rows": [
                {"f": [{"v": "analytics"}, {"v": "1024"}]},
                {"f": [{"v": "marketing"}, {"v": null}]}
            ]
        });
        let rows = rows_to_objects(&response);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["project_id"], "analytics");
        assert_eq!(rows[0]["total_bytes_billed"], "1024");
        assert!(rows[1]["total_bytes_billed"].is_null());
    }

    #[test]
    fn test_rows_to_objects_without_rows() {
        let response = json!({"schema": {"fields": [{"name": "a"}]}, "totalRows": "0"});
        assert!(rows_to_objects(&response).is_empty());
    }

    fn configured_client() -> BigQueryClient {
        let config = WarehouseConfig {
            project_id: Some("my-project".to_string()),
            access_token: Some("token".to_string()),
            ..WarehouseConfig::default()
        };
        BigQueryClient::new(&config).unwrap()
    }

    #[test]
    fn test_dry_run_body_never_executes() {
        let client = configured_client();
        let body = serde_json::to_value(client.dry_run_body("SELECT * FROM t")).unwrap();
        assert_eq!(body["dryRun"], true);
        assert_eq!(body["useLegacySql"], false);
        assert_eq!(body["query"], "SELECT * FROM t");
        assert_eq!(body["timeoutMs"], client.timeout_secs * 1000);
    }

    #[test]
    fn test_query_body_executes() {
        let client = configured_client();
        let body = serde_json::to_value(client.query_body("SELECT 1")).unwrap();
        assert_eq!(body["dryRun"], false);
        assert_eq!(body["query"], "SELECT 1");
    }

    #[test]
    fn test_new_requires_credentials() {
        let config = WarehouseConfig::default();
        let err = BigQueryClient::new(&config).err().unwrap();
        assert!(matches!(err, ApiError::ConnectionUnavailable(_)));
    }
}
