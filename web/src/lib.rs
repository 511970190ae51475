use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use hub::HubHandle;
use jobs::JobServer;
use log::*;
use service::config::Config;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

mod controller;
mod error;
mod params;
mod router;
mod ws;

pub use error::{Error, Result};
pub use router::define_routes;

/// Everything a request handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub hub: HubHandle,
    pub jobs: JobServer,
}

impl AppState {
    pub fn new(service_state: service::AppState, hub: HubHandle, jobs: JobServer) -> Self {
        Self {
            service_state,
            hub,
            jobs,
        }
    }

    pub fn config(&self) -> &Config {
        &self.service_state.config
    }
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let config = app_state.config();
    let interface = config.interface.as_deref().unwrap_or("127.0.0.1");
    let listen_addr = format!("{interface}:{}", config.port);
    let cors = configure_cors(&config.allowed_origins);

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Server starting... listening for connections on http://{listen_addr}");

    axum::serve(listener, define_routes(app_state).layer(cors))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

fn configure_cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin \"{origin}\"");
                None
            }
        })
        .collect();
    info!("Allowing CORS requests from {allowed:?}");

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::list(allowed))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested, draining HTTP connections"),
        Err(e) => {
            error!("Could not listen for the shutdown signal: {e}");
            std::future::pending::<()>().await
        }
    }
}
