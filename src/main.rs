use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use focus_tracker::{api, config::AppConfig, db::Database};

#[derive(Parser)]
#[command(name = "focus-tracker")]
#[command(about = "Project, goal and pomodoro tracking service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// SQLite database file (defaults to FOCUS_TRACKER_DB, then the data directory)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Apply pending schema migrations and exit
    Migrate {
        /// SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "focus_tracker=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn open_database(config: &AppConfig) -> anyhow::Result<Database> {
    let db = match &config.database_path {
        Some(path) => Database::open(path.clone())?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(host: String, port: u16, db: Option<PathBuf>) -> anyhow::Result<()> {
    let config = AppConfig::load(db);
    let db = open_database(&config)?;

    if config.security.api_key.is_none() {
        tracing::warn!("No gateway key configured; accepting requests from any client");
    }

    let app = api::create_router_with_config(db, config.security);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Focus tracker listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve { port, host, db }) => serve(host, port, db).await?,
        Some(Commands::Migrate { db }) => {
            let config = AppConfig::load(db);
            open_database(&config)?;
            tracing::info!("Migrations applied");
        }
        None => serve("127.0.0.1".to_string(), 3000, None).await?,
    }

    Ok(())
}
