//! `--verify`: report the effective settings and try the backend connection

use crate::config::{BackendKind, Config};
use crate::services::CostBackend;
use crate::utils::mask_secret;

/// Characters of a secret shown before the mask
const VISIBLE_SECRET_CHARS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub key: &'static str,
    /// `None` when unset
    pub value: Option<String>,
    pub required: bool,
}

impl Setting {
    fn plain(key: &'static str, value: Option<String>, required: bool) -> Self {
        Self { key, value, required }
    }

    fn secret(key: &'static str, value: Option<&str>, required: bool) -> Self {
        Self { key, value: value.map(|v| mask_secret(v, VISIBLE_SECRET_CHARS)), required }
    }
}

/// Settings relevant to the selected backend, secrets masked
pub fn settings_report(config: &Config) -> Vec<Setting> {
    let mut settings = vec![
        Setting::plain("backend.kind", Some(config.backend.kind.as_str().to_string()), true),
        Setting::plain(
            "server",
            Some(format!("{}:{}", config.server.host, config.server.port)),
            true,
        ),
    ];

    match config.backend.kind {
        BackendKind::Warehouse => {
            let wh = &config.warehouse;
            settings.extend([
                Setting::plain("warehouse.project_id", wh.project_id.clone(), true),
                Setting::plain("warehouse.region", Some(wh.region.clone()), true),
                Setting::secret("warehouse.access_token", wh.access_token.as_deref(), true),
                Setting::plain("warehouse.price_per_tb", Some(wh.price_per_tb.to_string()), true),
            ]);
        },
        BackendKind::Relational => {
            let rel = &config.relational;
            settings.extend([
                Setting::plain("relational.host", rel.host.clone(), true),
                Setting::plain("relational.port", Some(rel.port.to_string()), true),
                Setting::plain("relational.username", rel.username.clone(), true),
                Setting::secret("relational.password", rel.password.as_deref(), false),
                Setting::plain("relational.database", rel.database.clone(), false),
                Setting::plain(
                    "relational.monthly_cost_usd",
                    Some(rel.monthly_cost_usd.to_string()),
                    false,
                ),
                Setting::plain("relational.monitor_resource_uri", rel.monitor_resource_uri.clone(), false),
                Setting::secret(
                    "relational.monitor_access_token",
                    rel.monitor_access_token.as_deref(),
                    false,
                ),
                Setting::plain("nl2sql.endpoint", config.nl2sql.endpoint.clone(), false),
                Setting::secret("nl2sql.api_key", config.nl2sql.api_key.as_deref(), false),
                Setting::plain("nl2sql.deployment", config.nl2sql.deployment.clone(), false),
            ]);
        },
    }

    settings
}

/// Print the report, attempt a connection and return whether it succeeded
pub async fn run(config: &Config, backend: &dyn CostBackend) -> bool {
    println!("{}", "=".repeat(60));
    println!("Environment Verification");
    println!("{}", "=".repeat(60));

    let dotenv = std::path::Path::new(".env");
    if dotenv.exists() {
        println!("✓ .env file found");
    } else {
        println!("- no .env file in working directory");
    }

    println!("{}", "-".repeat(60));
    let mut missing_required = 0;
    for setting in settings_report(config) {
        match &setting.value {
            Some(value) => println!("✓ {} = {}", setting.key, value),
            None if setting.required => {
                missing_required += 1;
                println!("✗ {} - NOT SET (required)", setting.key);
            },
            None => println!("- {} - not set", setting.key),
        }
    }

    println!("{}", "-".repeat(60));
    let connected = match backend.connect().await {
        Ok(()) => {
            println!("✓ Connected to {} backend", backend.kind().as_str());
            true
        },
        Err(e) => {
            println!("✗ Connection to {} backend failed: {}", backend.kind().as_str(), e);
            println!("  The server would start and serve fallback data");
            false
        },
    };

    println!("{}", "=".repeat(60));
    println!(
        "Summary: {} required setting(s) missing, connection {}",
        missing_required,
        if connected { "OK" } else { "FAILED" }
    );

    connected
}
