//! Azure Monitor metrics REST client
//!
//! Utilization percentages are the only cost signal a provisioned-capacity
//! server exposes when no monthly price is configured.

use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::RelationalConfig;
use crate::utils::{ApiError, ApiResult};

pub const MANAGEMENT_BASE: &str = "https://management.azure.com";
pub const METRICS_API_VERSION: &str = "2018-01-01";

#[derive(Clone)]
pub struct AzureMonitorClient {
    http_client: Client,
    resource_uri: String,
    access_token: String,
}

impl AzureMonitorClient {
    /// `None` when the monitor resource or token is not configured
    pub fn from_config(config: &RelationalConfig) -> ApiResult<Option<Self>> {
        let (Some(resource_uri), Some(access_token)) =
            (config.monitor_resource_uri.clone(), config.monitor_access_token.clone())
        else {
            return Ok(None);
        };

        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::internal_error(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Some(Self {
            http_client,
            resource_uri: format!("/{}", resource_uri.trim_matches('/')),
            access_token,
        }))
    }

    /// Average of each metric over the last `days`, bucketed by `interval`
    /// (ISO-8601 duration, e.g. "PT1H" or "P1D")
    pub async fn metrics(&self, names: &[&str], days: i64, interval: &str) -> ApiResult<Value> {
        let end = Utc::now();
        let start = end - ChronoDuration::days(days.max(1));
        let timespan = format!(
            "{}/{}",
            start.to_rfc3339_opts(SecondsFormat::Secs, true),
            end.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        let metric_names = names.join(",");
        let url = format!(
            "{}{}/providers/Microsoft.Insights/metrics",
            MANAGEMENT_BASE, self.resource_uri
        );

        tracing::debug!("[Relational] Fetching metrics {:?} over {}", names, timespan);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("api-version", METRICS_API_VERSION),
                ("metricnames", metric_names.as_str()),
                ("timespan", timespan.as_str()),
                ("interval", interval),
                ("aggregation", "Average"),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("[Relational] Azure Monitor request failed: {}", e);
                ApiError::backend_failure(format!("Azure Monitor request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::backend_failure(format!(
                "Azure Monitor error {}: {}",
                status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            ApiError::backend_failure(format!("Failed to parse Azure Monitor response: {}", e))
        })
    }
}
