pub mod auth;
pub mod cache;
pub mod commands;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;

use cache::SummaryCache;
use commands::DashboardReport;
use db::Database;
use error::Result;
use metrics::SummaryStatistics;

/// Everything a command needs: the database plus the report caches built
/// from the stored settings.
pub struct AppState {
    pub db: Database,
    pub summaries: SummaryCache<SummaryStatistics>,
    pub dashboards: SummaryCache<DashboardReport>,
}

impl AppState {
    pub fn open(db_path: &str) -> Result<Self> {
        log::info!("Database path: {}", db_path);
        Self::with_database(Database::new(db_path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_database(Database::open_in_memory()?)
    }

    fn with_database(db: Database) -> Result<Self> {
        let ttl = {
            let conn = db.lock()?;
            db::settings::get_settings(&conn)?.cache_ttl_seconds
        };
        Ok(Self {
            db,
            summaries: SummaryCache::new("summary", ttl),
            dashboards: SummaryCache::new("dashboard", ttl),
        })
    }

    pub(crate) async fn invalidate_user(&self, user_id: i64) {
        self.summaries.invalidate_user(user_id).await;
        self.dashboards.invalidate_user(user_id).await;
    }

    pub(crate) async fn set_cache_ttl(&self, ttl_seconds: u64) {
        self.summaries.set_ttl(ttl_seconds).await;
        self.dashboards.set_ttl(ttl_seconds).await;
    }
}
