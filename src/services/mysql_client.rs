use crate::config::RelationalConfig;
use crate::utils::error::{ApiError, ApiResult};
use mysql_async::{OptsBuilder, Pool, SslOpts, prelude::Queryable};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct MySQLClient {
    pool: Arc<Pool>,
}

impl MySQLClient {
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Build a pool for the configured server. No connection is opened until
    /// the first query.
    pub fn create_pool(config: &RelationalConfig) -> ApiResult<Pool> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| ApiError::connection_unavailable("relational.host not configured"))?;

        let ssl_opts = config.use_ssl.then(SslOpts::default);

        let opts = OptsBuilder::default()
            .ip_or_hostname(host)
            .tcp_port(config.port)
            .user(config.username.clone())
            .pass(config.password.clone())
            .db_name(config.database.clone())
            .prefer_socket(false)
            .ssl_opts(ssl_opts)
            .tcp_keepalive(Some(30_000_u32))
            .tcp_nodelay(true)
            .pool_opts(
                mysql_async::PoolOpts::default()
                    .with_constraints(mysql_async::PoolConstraints::new(1, 10).ok_or_else(
                        || ApiError::internal_error("Failed to create pool constraints: invalid min/max values"),
                    )?)
                    .with_inactive_connection_ttl(std::time::Duration::from_secs(300))
                    .with_ttl_check_interval(std::time::Duration::from_secs(60)),
            );

        tracing::info!("[Relational] Created MySQL connection pool for {}:{}", host, config.port);
        Ok(Pool::new(opts))
    }

    /// Execute a query and return results as (column_names, rows). SQL NULL
    /// stays `Value::Null`; everything else is text.
    pub async fn query_raw(&self, sql: &str) -> ApiResult<(Vec<String>, Vec<Vec<Value>>)> {
        let mut conn = self.pool.get_conn().await.map_err(|e| {
            tracing::error!("[Relational] Failed to get connection from pool: {}", e);
            ApiError::connection_unavailable(format!("Failed to get connection: {}", e))
        })?;

        let rows: Vec<mysql_async::Row> = conn.query(sql).await.map_err(|e| {
            tracing::error!("[Relational] Query execution failed: {}", e);
            ApiError::backend_failure(format!("SQL execution failed: {}", e))
        })?;

        tracing::debug!("[Relational] Query returned {} rows", rows.len());

        drop(conn);

        Ok(process_query_result(rows))
    }

    /// Execute a query and return each row as a JSON object keyed by column name
    pub async fn query(&self, sql: &str) -> ApiResult<Vec<Value>> {
        let (column_names, rows) = self.query_raw(sql).await?;
        Ok(rows_to_objects(&column_names, rows))
    }

    /// Round-trip a trivial statement to prove the credentials work
    pub async fn ping(&self) -> ApiResult<()> {
        self.query_raw("SELECT 1").await.map(|_| ())
    }
}

fn process_query_result(rows: Vec<mysql_async::Row>) -> (Vec<String>, Vec<Vec<Value>>) {
    if rows.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let columns: Vec<String> = rows[0]
        .columns_ref()
        .iter()
        .map(|col| col.name_str().to_string())
        .collect();
    let col_count = columns.len();

    let result_rows = rows
        .iter()
        .map(|row| (0..col_count).map(|idx| value_to_json(&row[idx])).collect())
        .collect();

    (columns, result_rows)
}

fn rows_to_objects(columns: &[String], rows: Vec<Vec<Value>>) -> Vec<Value> {
    rows.into_iter()
        .map(|row| {
            let obj: Map<String, Value> = columns.iter().cloned().zip(row).collect();
            Value::Object(obj)
        })
        .collect()
}

fn value_to_json(value: &mysql_async::Value) -> Value {
    match value {
        mysql_async::Value::NULL => Value::Null,
        other => Value::String(value_to_string(other)),
    }
}

fn value_to_string(value: &mysql_async::Value) -> String {
    match value {
        mysql_async::Value::NULL => String::new(),
        mysql_async::Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        mysql_async::Value::Int(i) => i.to_string(),
        mysql_async::Value::UInt(u) => u.to_string(),
        mysql_async::Value::Float(f) => f.to_string(),
        mysql_async::Value::Double(d) => d.to_string(),
        mysql_async::Value::Date(year, month, day, hour, minute, second, _micro) => format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            year, month, day, hour, minute, second
        ),
        mysql_async::Value::Time(_neg, days, hours, minutes, seconds, _micro) => {
            let total_hours = days * 24 + (*hours as u32);
            format!("{}:{:02}:{:02}", total_hours, minutes, seconds)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&mysql_async::Value::Int(-3)), "-3");
        assert_eq!(value_to_string(&mysql_async::Value::Bytes(b"orders".to_vec())), "orders");
        assert_eq!(
            value_to_string(&mysql_async::Value::Date(2024, 5, 1, 10, 0, 0, 0)),
            "2024-05-01 10:00:00"
        );
    }

    #[test]
    fn test_sql_null_is_json_null() {
        assert_eq!(value_to_json(&mysql_async::Value::NULL), Value::Null);
        assert_eq!(
            value_to_json(&mysql_async::Value::Bytes(b"NULL".to_vec())),
            Value::String("NULL".to_string())
        );
    }

    #[test]
    fn test_rows_to_objects() {
        let columns = vec!["USER".to_string(), "exec_count".to_string()];
        let rows = vec![
            vec![Value::String("NULL".to_string()), Value::String("3".to_string())],
            vec![Value::Null, Value::String("1".to_string())],
        ];
        let objects = rows_to_objects(&columns, rows);
        assert_eq!(objects[0]["USER"], "NULL");
        assert_eq!(objects[0]["exec_count"], "3");
        assert!(objects[1]["USER"].is_null());
    }

    #[test]
    fn test_create_pool_requires_host() {
        let err = MySQLClient::create_pool(&RelationalConfig::default()).err().unwrap();
        assert!(matches!(err, ApiError::ConnectionUnavailable(_)));
    }
}
