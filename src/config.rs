use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

/// Where records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { url: String, max_connections: u32 },
    Memory,
}

/// Outbound email API. Absent means emails are only logged.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub api_url: Url,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Persistence
    pub store: StoreBackend,
    pub store_timeout: Duration,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Auth
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,

    // Notifications
    pub email: Option<EmailSettings>,
    pub notification_queue_capacity: usize,
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Persistence
        let store = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres {
                url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
                max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 10),
            },
            "memory" => StoreBackend::Memory,
            other => bail!("STORE_BACKEND must be postgres or memory, got '{}'", other),
        };
        let store_timeout = Duration::from_secs(parsed_or("STORE_TIMEOUT_SECONDS", 10));

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Auth
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let jwt_issuer = env::var("JWT_ISSUER").ok().filter(|s| !s.is_empty());

        // Notifications
        let email = match env::var("EMAIL_API_URL").ok().filter(|s| !s.is_empty()) {
            Some(raw) => Some(EmailSettings {
                api_url: Url::parse(&raw).context("EMAIL_API_URL is not a valid URL")?,
                api_key: env::var("EMAIL_API_KEY").context("EMAIL_API_KEY must be set with EMAIL_API_URL")?,
                from: env::var("EMAIL_FROM").unwrap_or_else(|_| "no-reply@carwash.local".to_string()),
            }),
            None => None,
        };
        let notification_queue_capacity = parsed_or("NOTIFICATION_QUEUE_CAPACITY", 256);

        Ok(Settings {
            env,
            server_addr,
            store,
            store_timeout,
            cors_allow_origins,
            jwt_secret,
            jwt_issuer,
            email,
            notification_queue_capacity,
        })
    }
}
