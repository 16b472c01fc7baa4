use clap::{Parser, Subcommand};
use gtfs_vehicle_positions::config::Config;
use gtfs_vehicle_positions::gateway;
use gtfs_vehicle_positions::state::AppState;

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the configured feed and serve the HTTP query gateway.
    Serve,
    /// Load the configured feed, print the health counts, and exit.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();
    let config = Config::from_env()?;

    match args.command {
        Commands::Check => {
            let state = AppState::new();
            gtfs_vehicle_positions::load_dataset(&config, &state)?;
            let dataset = state.get().expect("just installed");
            println!(
                "shapes={} stops={} routes={} trips={} calendars={} calendar_dates={}",
                dataset.shapes.len(),
                dataset.stops.len(),
                dataset.routes.len(),
                dataset.trips.len(),
                dataset.calendars.len(),
                dataset.calendar_exceptions.len(),
            );
            Ok(())
        }
        Commands::Serve => {
            let state = AppState::new();
            gtfs_vehicle_positions::load_dataset(&config, &state)?;

            let app = gateway::router(state);
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
            tracing::info!(port = config.port, "listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}
