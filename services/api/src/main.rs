//! dispatch API service
//!
//! Hosts the kitchen scheduling core behind a JSON API and runs the
//! background decay minimizer when the topology enables it.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dispatch_api::{api, config::Config, state::AppState};
use dispatch_kitchen::{DecayMinimizer, Kitchen, KitchenConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting dispatch API");
    info!(
        listen_addr = %config.listen_addr,
        topology = %config.topology_path,
        "Configuration loaded"
    );

    // Build the kitchen from the topology file
    let kitchen_config = KitchenConfig::load(&config.topology_path)?;
    let kitchen = Arc::new(Kitchen::new(&kitchen_config)?);
    info!(
        shelves = kitchen.shelves_asc().len(),
        minimize_decay = kitchen_config.minimize_decay,
        "Kitchen topology loaded"
    );

    // Start the decay minimizer if enabled
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let minimizer_handle = if kitchen_config.minimize_decay {
        let minimizer = DecayMinimizer::new(Arc::clone(&kitchen));
        Some(tokio::spawn(async move {
            minimizer.run(shutdown_rx).await;
        }))
    } else {
        None
    };

    // Build and run the server
    let state = AppState::new(kitchen);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Drain the minimizer after its current sweep
    info!("Shutting down");
    let _ = shutdown_tx.send(true);
    if let Some(handle) = minimizer_handle {
        let _ = handle.await;
    }

    Ok(())
}
