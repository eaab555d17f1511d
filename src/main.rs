//! Todo microservice entry point.

use clap::{Parser, Subcommand};
use sqlx::Connection;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use todo_api::api::{create_router, AppState};
use todo_api::config::{Config, PasswordSource};
use todo_api::metrics;
use todo_api::store::PgConnector;
use todo_api::utils::shutdown_signal;

/// Todo microservice REST API.
#[derive(Parser, Debug)]
#[command(name = "todo-api")]
#[command(about = "Task-list REST API backed by PostgreSQL")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Open and close one database connection.
    CheckDb,

    /// Create the items table if it does not exist.
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Config errors are reported by the subcommand once logging is up.
    let directive = Config::load()
        .unwrap_or_default()
        .log_filter(args.verbose);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::CheckDb) => cmd_check_db().await,
        Some(Command::InitDb) => cmd_init_db().await,
        None => cmd_serve(args.port).await,
    }
}

fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("TODO API - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    let (_, source) = config.resolve_password();

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Database: {}@{}:{}/{}", config.db_user, config.db_host, config.db_port, config.db_name);
    println!("  Password: {}", match source {
        PasswordSource::SecretFile => format!("secret file ({})", config.db_password_file),
        PasswordSource::InsecureFallback => "INSECURE FALLBACK (secret file not found)".to_string(),
    });
    println!("  Listen: {}", config.bind_address());
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Open and close one database connection.
async fn cmd_check_db() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("TODO API - DATABASE CHECK");
    println!("======================================================================");

    let config = load_config()?;
    let connector = PgConnector::new(config.clone());

    print!("Connecting to {}:{}/{}... ", config.db_host, config.db_port, config.db_name);
    match connector.try_connect().await {
        Ok(conn) => {
            println!("OK");
            conn.close().await?;
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Database connection failed"));
        }
    }

    println!("======================================================================");
    println!("DATABASE CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Create the items table.
async fn cmd_init_db() -> anyhow::Result<()> {
    let config = load_config()?;
    let connector = PgConnector::new(config);

    connector.init_schema().await?;
    info!("Table `items` is ready");

    Ok(())
}

/// Run the HTTP server until a shutdown signal arrives.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = load_config()?;

    if let Some(port) = port_override {
        config.port = port;
    }

    if let PasswordSource::InsecureFallback = config.resolve_password().1 {
        warn!(
            path = %config.db_password_file,
            "secret file not found, using insecure fallback password"
        );
    }

    info!(
        "Database: {}@{}:{}/{}",
        config.db_user, config.db_host, config.db_port, config.db_name
    );

    let mut app_state = AppState::new(PgConnector::new(config.clone()));
    match metrics::init_metrics() {
        Ok(handle) => app_state = app_state.with_metrics(handle),
        Err(e) => warn!("Metrics disabled: {}", e),
    }

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
