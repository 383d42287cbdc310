pub mod azure_monitor_client;
pub mod bigquery_client;
pub mod cost_backend;
pub mod dispatcher;
pub mod mysql_client;
pub mod nl2sql_client;
pub mod normalizer;
pub mod optimization_rules;
pub mod recommendation_aggregator;

pub use azure_monitor_client::AzureMonitorClient;
pub use bigquery_client::BigQueryClient;
pub use cost_backend::{CostBackend, RelationalBackend, WarehouseBackend, create_backend};
pub use dispatcher::{Dispatcher, DispatcherState};
pub use mysql_client::MySQLClient;
pub use nl2sql_client::Nl2SqlClient;
pub use optimization_rules::classify;
pub use recommendation_aggregator::{aggregate, estimate_savings};
