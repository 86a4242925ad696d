use clap::Parser;
use std::sync::Arc;
use tokio::sync::broadcast;

use salvo_server::config::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use salvo_server::errors::ServerResult;
use salvo_server::registry::SessionRegistry;
use salvo_server::websocket::router;

/// Multiplayer salvo card game server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Address to bind to
    #[clap(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,
    /// Port to listen on
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> ServerResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        ..ServerConfig::default()
    };

    let registry = Arc::new(SessionRegistry::new());
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let reaper = SessionRegistry::spawn_reaper(
        Arc::clone(&registry),
        config.reap_interval,
        config.inactivity_threshold,
        shutdown_rx,
    );

    let address = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("❌ Failed to bind {}: {}", address, e);
            return Err(e.into());
        }
    };
    log::info!("🚀 Salvo server listening on {}", address);

    let mut shutdown_signal = shutdown_tx.subscribe();
    let serve = axum::serve(listener, router(registry)).with_graceful_shutdown(async move {
        let _ = shutdown_signal.recv().await;
    });

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        log::info!("Shutdown signal received");
        let _ = signal_tx.send(());
    });

    serve.await?;

    let _ = shutdown_tx.send(());
    if let Err(e) = reaper.await {
        log::warn!("Reaper task ended abnormally: {}", e);
    }
    log::info!("Server stopped");
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
