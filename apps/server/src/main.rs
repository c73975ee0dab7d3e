use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use unieats_api::{build_router, AppState};
use unieats_config::load as load_config;
use unieats_runtime::{telemetry, BackendServices};

mod maintenance;

#[derive(Parser)]
#[command(name = "unieats-server")]
#[command(about = "UniEats campus food-ordering backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Seed an empty database with demo accounts, a cafeteria and a sample order
    SeedData,
    /// Print the main tables of the database
    DumpData,
    /// Delete every row except the migration history
    ClearData,
    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long, env = "UNIEATS_ADMIN_PASSWORD")]
        password: String,
        #[arg(long, default_value = "Administrator")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;
    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(&config, services).await,
        Commands::SeedData => {
            let summary = maintenance::seed_data(&services, &config).await?;
            println!("{summary}");
            Ok(())
        }
        Commands::DumpData => maintenance::dump_data(&services.db_pool).await,
        Commands::ClearData => {
            let deleted = maintenance::clear_data(&services.db_pool).await?;
            println!("Database cleared:");
            for (table, rows) in deleted {
                println!("- {rows} rows deleted from {table}");
            }
            Ok(())
        }
        Commands::CreateAdmin {
            email,
            password,
            name,
        } => {
            let admin = maintenance::create_admin(&services, &email, &password, &name).await?;
            println!("Created admin {} ({})", admin.email, admin.public_id);
            Ok(())
        }
    }
}

async fn run_server(
    config: &unieats_config::AppConfig,
    services: BackendServices,
) -> anyhow::Result<()> {
    info!("starting UniEats backend");

    let state = AppState::from_config(services.db_pool.clone(), config);
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(unieats_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    services.db_pool.close().await;
    info!("backend shut down");
    Ok(())
}
