//! Storefront admin dashboard runner.
//!
//! Mounts one page per resource family against the configured admin API,
//! polls notifications until interrupted, then tears every page down.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storefront_admin::{
    Config, LogFormat, PresenterSettings, ResourceKind, ResourcePresenter, RestGateway,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting storefront admin dashboard");
    tracing::info!("API base URL: {}", config.api_base_url);

    if config.api_token.is_none() {
        tracing::warn!("No API token configured (ADMIN_API_TOKEN). Admin routes will reject requests!");
    }

    let gateway = Arc::new(RestGateway::from_config(&config)?);
    let settings = PresenterSettings::from(&config);

    let mut pages = Vec::with_capacity(ResourceKind::ALL.len());
    for kind in ResourceKind::ALL {
        let mut page = ResourcePresenter::new(kind, Arc::clone(&gateway), settings);
        match page.mount().await {
            Ok(()) => tracing::info!(
                "{}: {} entries, {} pages",
                kind.label(),
                page.page_info().total_items,
                page.page_info().total_pages
            ),
            Err(e) => tracing::error!("{}: initial load failed: {}", kind.label(), e),
        }
        if kind == ResourceKind::Notification {
            page.start_polling(config.poll_interval);
        }
        pages.push(page);
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    for page in &mut pages {
        for notice in page.notices() {
            tracing::info!("{}: pending notice: {}", page.kind().label(), notice.message);
        }
        page.teardown();
    }

    Ok(())
}
