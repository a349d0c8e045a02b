//! NutriLog
//!
//! An MCP server for food, recipe and diary nutrition tracking.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use nutrilog::build_info;
use nutrilog::config::{AppConfig, DEFAULT_LOG_DIRECTIVE};
use nutrilog::db;
use nutrilog::mcp::NutriLogService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // Initialize logging (output to stderr to not interfere with MCP stdio)
    let mut filter = EnvFilter::from_default_env().add_directive(DEFAULT_LOG_DIRECTIVE.parse()?);
    if config.log_directive != DEFAULT_LOG_DIRECTIVE {
        filter = filter.add_directive(config.log_directive.parse()?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let db_path = config.database_path.clone();
    eprintln!("Database path: {}", db_path.display());

    // Ensure data directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    eprintln!("Initializing database...");
    let database = db::Database::new(&db_path)?;

    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    tracing::info!(user_id = config.user_id, "serving requests");
    let service = NutriLogService::new(db_path, database, config.user_id);

    let server = service.serve((stdin(), stdout())).await?;
    server.waiting().await?;

    Ok(())
}
