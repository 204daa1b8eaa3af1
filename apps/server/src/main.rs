use anyhow::Context;
use billbuddy_backend_api::{build_router, AppState};
use billbuddy_config::load as load_config;
use billbuddy_database::{
    BillRepository, CreateHouseholdRequest, HouseholdRepository, NewBill,
};
use billbuddy_runtime::{telemetry, BackendServices};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "billbuddy-backend")]
#[command(about = "BillBuddy backend server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Seed the database with demo data
    SeedData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::SeedData => seed_data().await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting BillBuddy backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let state = AppState::new(
        services.db_pool.clone(),
        services.authenticator.clone(),
        &config.rate_limit,
    );
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(billbuddy_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn seed_data() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("seeding database with demo data");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let user = match services
        .authenticator
        .register("demo", "demo123", None, None)
        .await
    {
        Ok(user) => user,
        Err(billbuddy_auth::AuthError::UserExists) => {
            println!("demo user already present, nothing to seed");
            return Ok(());
        }
        Err(err) => return Err(err).context("failed to seed demo user"),
    };

    let households = HouseholdRepository::new(services.db_pool.clone());
    let household = households
        .create(
            &CreateHouseholdRequest {
                name: Some("Demo Household".to_string()),
                household_type: "home".to_string(),
                role_label: "owner".to_string(),
            },
            &user.public_id,
        )
        .await
        .context("failed to seed household")?;

    let bills = BillRepository::new(services.db_pool.clone());
    for (amount, due_date, biller_name) in [
        (42.50, "2024-07-01T00:00:00Z", "Power & Light Co"),
        (89.99, "2024-07-05T00:00:00Z", "City Water"),
        (15.00, "2024-07-12T00:00:00Z", "Streaming Service"),
    ] {
        bills
            .create(&NewBill {
                household_public_id: household.public_id.clone(),
                amount,
                due_date: due_date.to_string(),
                status: "upcoming".to_string(),
                biller_name: biller_name.to_string(),
                category: None,
                is_recurring: Some(true),
                predicted_amount: None,
            })
            .await
            .context("failed to seed bill")?;
    }

    println!("Database seeded with demo data:");
    println!("- user 'demo' (password: demo123)");
    println!("- 1 household created");
    println!("- 3 bills created");

    Ok(())
}
