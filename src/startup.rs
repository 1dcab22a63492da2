//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;

use crate::application::dispatch::DispatchTable;
use crate::application::monitoring::ErrorMonitor;
use crate::application::registry::{ErrorExtension, ErrorRegistry};
use crate::application::translator::{CatalogTranslator, IdentityTranslator, Translator};
use crate::config::Settings;
use crate::extensions::AiErrorExtension;
use crate::infrastructure::metrics::PrometheusErrorMonitor;
use crate::presentation::http::{handlers::health, routes};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<ErrorRegistry>,
    pub dispatch: Arc<DispatchTable>,
}

/// Assemble the error registry and dispatch table described by `settings`.
///
/// # Errors
///
/// Fails when a configured message catalog directory cannot be loaded.
pub fn build_state(settings: Settings) -> Result<AppState> {
    let default_language = settings.i18n.default_language.clone();

    let translator: Arc<dyn Translator> = match &settings.i18n.catalog_dir {
        Some(dir) => {
            let catalogs = CatalogTranslator::load(dir, &default_language)
                .with_context(|| format!("Failed to load message catalogs from {}", dir.display()))?;
            tracing::info!(
                dir = %dir.display(),
                languages = catalogs.languages().count(),
                "Message catalogs loaded"
            );
            Arc::new(catalogs)
        }
        None => Arc::new(IdentityTranslator),
    };

    let extension = settings.errors.ai_extension.then_some(AiErrorExtension);
    let registry = ErrorRegistry::with_extension(
        extension.as_ref().map(|e| e as &dyn ErrorExtension),
    );

    let monitor: Option<Arc<dyn ErrorMonitor>> = settings
        .errors
        .monitor_ai_errors
        .then(|| Arc::new(PrometheusErrorMonitor::new()) as Arc<dyn ErrorMonitor>);

    let mut dispatch = DispatchTable::new(translator, default_language, settings.app.debug);
    registry.register_all(&mut dispatch, monitor);

    tracing::info!(
        kinds = registry.kinds().len(),
        debug = settings.app.debug,
        "Error handling configured"
    );

    Ok(AppState {
        settings: Arc::new(settings),
        registry: Arc::new(registry),
        dispatch: Arc::new(dispatch),
    })
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let addr = settings.server_addr();
        let state = build_state(settings)?;

        health::init_server_start();
        let router = routes::create_router(state);

        // Bind to address
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
