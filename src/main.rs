mod api;
mod app;
mod auth;
mod config;
mod db;
mod domain;
mod error;
mod geo;
mod logging;
mod middleware;
mod routes;
mod services;
mod store;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use config::{Settings, StoreBackend};
use services::{EmailDispatcher, EmailQueue, EmailSender, HttpEmailSender, LogEmailSender};
use store::{MemoryStore, PgStore, Store};

const EMAIL_SEND_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;

    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting carwash backend"
    );

    match &settings.store {
        StoreBackend::Postgres { url, max_connections } => {
            let pool = db::create_pool(url, *max_connections).await?;
            serve(Arc::new(PgStore::new(pool)), settings).await
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            serve(Arc::new(MemoryStore::new()), settings).await
        }
    }
}

async fn serve<S: Store + 'static>(store: Arc<S>, settings: Settings) -> Result<()> {
    let (emails, jobs) = EmailQueue::channel(settings.notification_queue_capacity);

    let sender: Arc<dyn EmailSender> = match &settings.email {
        Some(email) => Arc::new(HttpEmailSender::new(
            email.api_url.clone(),
            &email.api_key,
            &email.from,
            EMAIL_SEND_TIMEOUT,
        )?),
        None => {
            tracing::warn!("EMAIL_API_URL not set, notification emails will only be logged");
            Arc::new(LogEmailSender)
        }
    };

    tokio::spawn(EmailDispatcher::new(store.clone(), sender, jobs, settings.store_timeout).run());

    let server_addr = settings.server_addr.clone();
    let state = app::AppState::new(store, settings, emails);
    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&server_addr).await?;
    tracing::info!("Listening on {}", server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
