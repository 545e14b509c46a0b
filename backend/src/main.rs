//! Hotkey Agents daemon
//!
//! Registers global shortcuts, routes activations to agents and serves the
//! REST/WebSocket API the GUI talks to.

use axum::{extract::Request, middleware::Next, response::Response};
use hotkey_agents_backend::{
    api,
    collaborators::{GlobalHotkeyBinder, HotkeyBinder, InactiveHotkeyBinder},
    config::Config,
    state::{AppState, PreferenceStore, Services},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

fn hotkey_binder(config: &Config) -> (Arc<dyn HotkeyBinder>, Option<UnboundedReceiver<String>>) {
    if !config.shortcuts.hotkeys_enabled {
        info!("Global hotkeys disabled by configuration");
        return (Arc::new(InactiveHotkeyBinder), None);
    }

    match GlobalHotkeyBinder::spawn() {
        Ok((binder, activations)) => (Arc::new(binder), Some(activations)),
        Err(e) => {
            warn!(error = %e, "Global hotkeys unavailable, continuing without them");
            (Arc::new(InactiveHotkeyBinder), None)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);
    if config.llm.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; translation, summaries and transcription will fail");
    }

    let preferences = PreferenceStore::load_or_default(
        config.preferences_path(),
        config.llm.default_target_language.clone(),
    );
    info!(
        path = %preferences.path().display(),
        language = %preferences.selected_language(),
        "Preferences loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()?;

    let (hotkeys, activations) = hotkey_binder(&config);
    let services = Services::live(&config, client, hotkeys);
    let app_state = Arc::new(AppState::new(&config, services, preferences));

    let report = app_state.router.bind_enabled_shortcuts();
    info!(
        bound = ?report.bound,
        failed = report.failed.len(),
        "Shortcut registration finished"
    );

    if let Some(activations) = activations {
        tokio::spawn(Arc::clone(&app_state.router).run(activations));
    }

    let app = api::router(Arc::clone(&app_state))
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive());

    // Bind to address from config
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    info!("Daemon listening on http://{}", addr);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app_state.router.unbind_all();
    info!("Daemon shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
