use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::utils::StringExt;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub backend: BackendConfig,
    pub warehouse: WarehouseConfig,
    pub relational: RelationalConfig,
    pub nl2sql: Nl2SqlConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Warehouse,
    Relational,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Warehouse => "warehouse",
            BackendKind::Relational => "relational",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warehouse" | "bigquery" => Ok(BackendKind::Warehouse),
            "relational" | "azure" | "mysql" => Ok(BackendKind::Relational),
            other => Err(format!("unknown backend kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
}

/// Pay-per-bytes-scanned warehouse (BigQuery REST API)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub project_id: Option<String>,
    /// Region qualifier for `INFORMATION_SCHEMA.JOBS_BY_PROJECT`, e.g. "region-us"
    pub region: String,
    /// OAuth2 bearer token
    pub access_token: Option<String>,
    pub api_base: String,
    /// USD per TiB scanned
    pub price_per_tb: f64,
    pub timeout_secs: u64,
}

/// Provisioned-capacity relational database (MySQL protocol)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelationalConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    /// Require TLS on the MySQL connection (managed cloud servers usually do)
    pub use_ssl: bool,
    /// Provisioned monthly cost apportioned across queries and users
    pub monthly_cost_usd: f64,
    pub service_tier: Option<String>,
    /// Azure resource id used for metrics, e.g. "/subscriptions/.../servers/<name>"
    pub monitor_resource_uri: Option<String>,
    pub monitor_access_token: Option<String>,
}

/// OpenAI-compatible chat completion endpoint for natural-language-to-SQL
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Nl2SqlConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub deployment: Option<String>,
    pub api_version: Option<String>,
}

impl Nl2SqlConfig {
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some() && self.deployment.is_some()
    }
}

impl RelationalConfig {
    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.username.is_some()
    }

    pub fn monitor_configured(&self) -> bool {
        self.monitor_resource_uri.is_some() && self.monitor_access_token.is_some()
    }
}

impl WarehouseConfig {
    pub fn is_configured(&self) -> bool {
        self.project_id.is_some() && self.access_token.is_some()
    }
}

/// Command line arguments for configuration overrides
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "finops-advisor")]
#[command(version, about = "FinOps Advisor - Query cost analytics and optimization service")]
pub struct CommandLineArgs {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Server host (overrides config file)
    #[arg(long, value_name = "HOST")]
    pub server_host: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Logging level (overrides config file, e.g., "info,finops_advisor=debug")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Backend kind: warehouse or relational (overrides config file)
    #[arg(long, value_name = "KIND")]
    pub backend: Option<String>,

    /// Print the effective settings, try a backend connection and exit
    #[arg(long)]
    pub verify: bool,
}

impl Config {
    /// Load configuration with command line, environment variable, and file support
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables (prefixed with APP_, `.env` honoured)
    /// 3. Configuration file (config.toml)
    /// 4. Default values
    pub fn load(cli_args: &CommandLineArgs) -> Result<Self, anyhow::Error> {
        let config_path = cli_args.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok().clean());
        config.apply_cli_overrides(cli_args);
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST / APP_SERVER_PORT
    /// - APP_LOG_LEVEL
    /// - APP_BACKEND: warehouse | relational
    /// - APP_WAREHOUSE_PROJECT_ID, APP_WAREHOUSE_REGION, APP_WAREHOUSE_ACCESS_TOKEN,
    ///   APP_WAREHOUSE_PRICE_PER_TB
    /// - APP_RELATIONAL_HOST, APP_RELATIONAL_PORT, APP_RELATIONAL_USERNAME,
    ///   APP_RELATIONAL_PASSWORD, APP_RELATIONAL_DATABASE, APP_RELATIONAL_MONTHLY_COST_USD,
    ///   APP_RELATIONAL_MONITOR_RESOURCE_URI, APP_RELATIONAL_MONITOR_ACCESS_TOKEN
    /// - APP_NL2SQL_ENDPOINT, APP_NL2SQL_API_KEY, APP_NL2SQL_DEPLOYMENT, APP_NL2SQL_API_VERSION
    fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Some(port) = var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Some(level) = var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Some(kind) = var("APP_BACKEND") {
            match kind.parse() {
                Ok(kind) => {
                    self.backend.kind = kind;
                    tracing::info!("Override backend.kind from env: {}", self.backend.kind.as_str());
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_BACKEND '{}': {} (keep {})",
                    kind,
                    e,
                    self.backend.kind.as_str()
                ),
            }
        }

        // Warehouse
        if let Some(project) = var("APP_WAREHOUSE_PROJECT_ID") {
            self.warehouse.project_id = Some(project);
            tracing::info!("Override warehouse.project_id from env");
        }
        if let Some(region) = var("APP_WAREHOUSE_REGION") {
            self.warehouse.region = region;
        }
        if let Some(token) = var("APP_WAREHOUSE_ACCESS_TOKEN") {
            self.warehouse.access_token = Some(token);
            tracing::info!("Override warehouse.access_token from env");
        }
        if let Some(price) = var("APP_WAREHOUSE_PRICE_PER_TB")
            && let Ok(price) = price.parse()
        {
            self.warehouse.price_per_tb = price;
        }

        // Relational
        if let Some(host) = var("APP_RELATIONAL_HOST") {
            self.relational.host = Some(host);
            tracing::info!("Override relational.host from env");
        }
        if let Some(port) = var("APP_RELATIONAL_PORT")
            && let Ok(port) = port.parse()
        {
            self.relational.port = port;
        }
        if let Some(user) = var("APP_RELATIONAL_USERNAME") {
            self.relational.username = Some(user);
        }
        if let Some(password) = var("APP_RELATIONAL_PASSWORD") {
            self.relational.password = Some(password);
            tracing::info!("Override relational.password from env");
        }
        if let Some(database) = var("APP_RELATIONAL_DATABASE") {
            self.relational.database = Some(database);
        }
        if let Some(cost) = var("APP_RELATIONAL_MONTHLY_COST_USD")
            && let Ok(cost) = cost.parse()
        {
            self.relational.monthly_cost_usd = cost;
        }
        if let Some(uri) = var("APP_RELATIONAL_MONITOR_RESOURCE_URI") {
            self.relational.monitor_resource_uri = Some(uri);
        }
        if let Some(token) = var("APP_RELATIONAL_MONITOR_ACCESS_TOKEN") {
            self.relational.monitor_access_token = Some(token);
        }

        // NL2SQL
        if let Some(endpoint) = var("APP_NL2SQL_ENDPOINT") {
            self.nl2sql.endpoint = Some(endpoint);
            tracing::info!("Override nl2sql.endpoint from env");
        }
        if let Some(key) = var("APP_NL2SQL_API_KEY") {
            self.nl2sql.api_key = Some(key);
        }
        if let Some(deployment) = var("APP_NL2SQL_DEPLOYMENT") {
            self.nl2sql.deployment = Some(deployment);
        }
        if let Some(version) = var("APP_NL2SQL_API_VERSION") {
            self.nl2sql.api_version = Some(version);
        }
    }

    /// Apply command line argument overrides (highest priority)
    fn apply_cli_overrides(&mut self, args: &CommandLineArgs) {
        if let Some(host) = &args.server_host {
            self.server.host = host.clone();
            tracing::info!("Override server.host from CLI: {}", self.server.host);
        }

        if let Some(port) = args.server_port {
            self.server.port = port;
            tracing::info!("Override server.port from CLI: {}", self.server.port);
        }

        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
            tracing::info!("Override logging.level from CLI: {}", self.logging.level);
        }

        if let Some(kind) = &args.backend {
            match kind.parse() {
                Ok(kind) => {
                    self.backend.kind = kind;
                    tracing::info!("Override backend.kind from CLI: {}", self.backend.kind.as_str());
                },
                Err(e) => tracing::warn!(
                    "Invalid --backend '{}': {} (keep {})",
                    kind,
                    e,
                    self.backend.kind.as_str()
                ),
            }
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if !(self.warehouse.price_per_tb > 0.0) {
            anyhow::bail!("warehouse.price_per_tb must be > 0");
        }

        if !(self.relational.monthly_cost_usd >= 0.0) {
            anyhow::bail!("relational.monthly_cost_usd must be >= 0");
        }

        match self.backend.kind {
            BackendKind::Warehouse if !self.warehouse.is_configured() => tracing::warn!(
                "Warehouse backend selected without project_id/access_token, fallback data will be served"
            ),
            BackendKind::Relational if !self.relational.is_configured() => tracing::warn!(
                "Relational backend selected without host/username, fallback data will be served"
            ),
            _ => {},
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,finops_advisor=debug".to_string(),
            file: Some("logs/finops-advisor.log".to_string()),
        }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            region: "region-us".to_string(),
            access_token: None,
            api_base: "https://bigquery.googleapis.com/bigquery/v2".to_string(),
            price_per_tb: 5.0,
            timeout_secs: 60,
        }
    }
}

impl Default for RelationalConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 3306,
            username: None,
            password: None,
            database: None,
            use_ssl: true,
            monthly_cost_usd: 0.0,
            service_tier: None,
            monitor_resource_uri: None,
            monitor_access_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.kind, BackendKind::Warehouse);
        assert_eq!(config.warehouse.price_per_tb, 5.0);
        assert_eq!(config.relational.port, 3306);
    }

    #[test]
    fn test_parse_toml_sections() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9090

            [backend]
            kind = "relational"

            [relational]
            host = "db.example.com"
            username = "finops"
            monthly_cost_usd = 750.0
            service_tier = "General Purpose"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.backend.kind, BackendKind::Relational);
        assert!(config.relational.is_configured());
        assert_eq!(config.relational.monthly_cost_usd, 750.0);
        assert!(!config.nl2sql.is_configured());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("APP_SERVER_PORT", "7000"),
            ("APP_BACKEND", "relational"),
            ("APP_RELATIONAL_HOST", "db"),
            ("APP_WAREHOUSE_PRICE_PER_TB", "6.25"),
            ("APP_NL2SQL_API_KEY", "secret"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.backend.kind, BackendKind::Relational);
        assert_eq!(config.relational.host.as_deref(), Some("db"));
        assert_eq!(config.warehouse.price_per_tb, 6.25);
        assert_eq!(config.nl2sql.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_invalid_backend_kind_keeps_previous() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| (key == "APP_BACKEND").then(|| "oracle".to_string()));
        assert_eq!(config.backend.kind, BackendKind::Warehouse);
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut config = Config::default();
        let args = CommandLineArgs {
            server_port: Some(9999),
            backend: Some("relational".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.backend.kind, BackendKind::Relational);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.warehouse.price_per_tb = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.relational.monthly_cost_usd = -1.0;
        assert!(config.validate().is_err());
    }
}
