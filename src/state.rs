use crate::config::AppConfig;
use crate::events::{EventDispatcher, LoggingListener};
use crate::personnes::{
    memory::MemoryPersonRepository,
    repo::{PersonRepository, PgPersonRepository},
};
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn PersonRepository>,
    pub events: Arc<EventDispatcher>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let events = Arc::new(EventDispatcher::new().subscribe(Arc::new(LoggingListener)));

        let repo = if config.uses_memory_storage() {
            tracing::warn!("using in-memory storage; records are lost on shutdown");
            Arc::new(MemoryPersonRepository::new()) as Arc<dyn PersonRepository>
        } else {
            let db = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.database_url)
                .await
                .context("connect to database")?;

            if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                tracing::warn!(error = %e, "migration failed; continuing");
            }
            Arc::new(PgPersonRepository::new(db)) as Arc<dyn PersonRepository>
        };

        Ok(Self::from_parts(repo, events, config))
    }

    pub fn from_parts(
        repo: Arc<dyn PersonRepository>,
        events: Arc<EventDispatcher>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            repo,
            events,
            config,
        }
    }

    #[cfg(test)]
    pub fn in_memory_for_tests(listener: Arc<dyn crate::events::PersonListener>) -> Self {
        Self::from_parts(
            Arc::new(MemoryPersonRepository::new()),
            Arc::new(EventDispatcher::new().subscribe(listener)),
            Arc::new(AppConfig::in_memory()),
        )
    }
}
