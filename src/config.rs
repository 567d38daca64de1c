use serde::Deserialize;

/// `DATABASE_URL` value selecting the in-memory repository.
pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub page_size: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        Ok(Self {
            database_url,
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
            page_size: std::env::var("PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(10),
        })
    }

    /// Configuration backed by the in-memory repository, listening on localhost.
    pub fn in_memory() -> Self {
        Self {
            database_url: MEMORY_DATABASE_URL.into(),
            max_connections: 1,
            host: "127.0.0.1".into(),
            port: 8080,
            page_size: 10,
        }
    }

    pub fn uses_memory_storage(&self) -> bool {
        self.database_url.starts_with(MEMORY_DATABASE_URL)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
