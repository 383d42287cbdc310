//! Natural language to SQL through an OpenAI-compatible chat completion API
//!
//! With `api_version` set the Azure OpenAI deployment URL layout and `api-key`
//! header are used; otherwise `{endpoint}/chat/completions` with a bearer
//! token and the deployment as model name.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Nl2SqlConfig;
use crate::utils::{ApiError, ApiResult};

const SYSTEM_PROMPT: &str = "You translate natural language questions into a single SQL query \
    for a MySQL-compatible database. Reply with the SQL query only, without explanation or \
    markdown fences.";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Clone)]
pub struct Nl2SqlClient {
    http_client: Client,
    url: String,
    api_key: String,
    model: Option<String>,
    azure_style: bool,
}

impl Nl2SqlClient {
    /// `None` when endpoint, key or deployment is missing
    pub fn from_config(config: &Nl2SqlConfig) -> ApiResult<Option<Self>> {
        let (Some(endpoint), Some(api_key), Some(deployment)) =
            (&config.endpoint, &config.api_key, &config.deployment)
        else {
            return Ok(None);
        };

        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ApiError::internal_error(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = endpoint.trim_end_matches('/');
        let (url, model, azure_style) = match &config.api_version {
            Some(version) => (
                format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={}",
                    endpoint,
                    urlencoding::encode(deployment),
                    urlencoding::encode(version)
                ),
                None,
                true,
            ),
            None => (format!("{}/chat/completions", endpoint), Some(deployment.clone()), false),
        };

        Ok(Some(Self { http_client, url, api_key: api_key.clone(), model, azure_style }))
    }

    pub async fn translate(&self, question: &str) -> ApiResult<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: Some(SYSTEM_PROMPT.to_string()) },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(format!("Question: {}\n\nSQL Query:", question)),
                },
            ],
            max_tokens: 300,
            temperature: 0.0,
        };

        let builder = self.http_client.post(&self.url).json(&request);
        let builder = if self.azure_style {
            builder.header("api-key", &self.api_key)
        } else {
            builder.bearer_auth(&self.api_key)
        };

        tracing::debug!("[Relational] Calling NL2SQL endpoint {}", self.url);

        let response = builder.send().await.map_err(|e| {
            tracing::error!("[Relational] NL2SQL request failed: {}", e);
            ApiError::backend_failure(format!("Chat completion request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::backend_failure(format!("API error {}: {}", status, error_text)));
        }

        let chat_response: ChatCompletionResponse = response.json().await.map_err(|e| {
            ApiError::backend_failure(format!("Failed to parse chat completion response: {}", e))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ApiError::backend_failure("Empty response from model"))?;

        Ok(strip_code_fence(&content))
    }
}

/// Models sometimes wrap the answer in ```sql fences despite the prompt
pub fn strip_code_fence(content: &str) -> String {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let inner = inner.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    inner.trim_end_matches("```").trim().to_string()
}
