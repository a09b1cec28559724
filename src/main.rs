use std::sync::Arc;

use log::info;
use warp::Filter;

use studio_sync::registry::Registry;
use studio_sync::types::SharedRegistry;
use studio_sync::ws;

const DEFAULT_PORT: u16 = 3001;

fn port_from_env() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[tokio::main]
async fn main() {
    // Default level INFO, overridable with RUST_LOG.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = port_from_env();
    let registry: SharedRegistry = Arc::new(tokio::sync::RwLock::new(Registry::new()));

    let registry_filter = {
        let registry = registry.clone();
        warp::any().map(move || registry.clone())
    };

    let ws_route = warp::path("ws")
        .and(warp::ws())
        .and(registry_filter.clone())
        .map(|ws: warp::ws::Ws, registry: SharedRegistry| {
            ws.on_upgrade(move |socket| ws::client_connection(socket, registry))
        });

    let health_route = warp::path("health")
        .and(warp::get())
        .and(registry_filter)
        .and_then(|registry: SharedRegistry| async move {
            let locked = registry.read().await;
            Ok::<_, warp::Rejection>(warp::reply::json(&serde_json::json!({
                "status": "ok",
                "connectedScreens": locked.screen_ids(),
                "controlPanels": locked.panel_count(),
            })))
        });

    let routes = ws_route.or(health_route);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
            let mut sigint =
                signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
            }
        }
        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
            info!("Received Ctrl+C, shutting down...");
        }
        let _ = tx.send(());
    });

    info!("Relay server listening on 0.0.0.0:{}", port);
    info!("Health check: http://localhost:{}/health", port);
    let (_, server) = warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async {
        rx.await.ok();
    });

    server.await;
    info!("Server shutdown complete");
}
