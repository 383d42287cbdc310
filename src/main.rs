use axum::Router;
use clap::Parser;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use finops_advisor::config::{CommandLineArgs, Config, LoggingConfig};
use finops_advisor::{AppState, Dispatcher, create_backend, handlers, models, services, utils, verify};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Resources
        handlers::resources::list_resources,
        handlers::resources::read_resource,
        // Tools
        handlers::tools::list_tools,
        handlers::tools::call_tool,
        // Dispatch
        handlers::dispatch::dispatch,
        // System
        handlers::health::health_check,
        handlers::health::ready_check,
    ),
    components(
        schemas(
            models::CostSummary,
            models::ResourceUtilization,
            models::ExpensiveQueryEntry,
            models::OptimizationFinding,
            models::Severity,
            models::CostUnit,
            models::ProjectCostEntry,
            models::TrendPoint,
            models::UserCostEntry,
            models::QueryCostAnalysis,
            models::Recommendation,
            models::RecommendationReport,
            models::SavingsEstimate,
            models::ResourceDescriptor,
            models::ToolDescriptor,
            models::DispatchRequest,
            models::OperationKind,
            services::DispatcherState,
            handlers::health::ReadyResponse,
            utils::error::ErrorBody,
        )
    ),
    tags(
        (name = "Resources", description = "Read-only cost resources"),
        (name = "Tools", description = "Cost analysis and optimization tools"),
        (name = "Dispatch", description = "Generic operation envelope"),
        (name = "System", description = "Health and readiness"),
    )
)]
struct ApiDoc;

/// Stdout plus an optional daily-rolling file. The returned guard must live
/// as long as the process or buffered file lines are lost.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let log_filter = tracing_subscriber::EnvFilter::new(&logging.level);
    let registry = tracing_subscriber::registry().with(log_filter);

    let Some(log_file) = &logging.file else {
        registry.with(tracing_subscriber::fmt::layer()).init();
        return None;
    };

    let log_path = std::path::Path::new(log_file);
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_dir = log_path.parent().and_then(|p| p.to_str()).filter(|p| !p.is_empty()).unwrap_or("logs");
    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("finops-advisor.log");
    // Rolling appender adds a date suffix
    let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

    let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    registry
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(tracing_subscriber::fmt::layer())
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli_args = CommandLineArgs::parse();
    let config = Config::load(&cli_args)?;

    let log_guard = init_logging(&config.logging);
    tracing::info!("FinOps Advisor starting up");
    tracing::info!("Configuration loaded successfully (backend: {})", config.backend.kind.as_str());

    let backend = create_backend(&config);

    if cli_args.verify {
        let connected = verify::run(&config, backend.as_ref()).await;
        if !connected {
            drop(log_guard);
            std::process::exit(1);
        }
        return Ok(());
    }

    let dispatcher = Arc::new(Dispatcher::new(backend));
    let state = dispatcher.initialize().await;
    tracing::info!("Dispatcher initialized: {:?}", state);

    let app_state = Arc::new(AppState::new(dispatcher));

    let app = Router::new()
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(handlers::routes(app_state))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API documentation available at http://{}/api-docs", addr);

    axum::serve(listener, app).await?;

    drop(log_guard);
    Ok(())
}
