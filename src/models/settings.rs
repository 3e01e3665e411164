use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub id: i32,
    pub currency: String,
    /// Offset used to read wall-clock hours out of `created_at` timestamps.
    pub utc_offset_minutes: i32,
    /// How many recent trades feed insight generation.
    pub insight_window: u32,
    /// 0 disables the summary cache.
    pub cache_ttl_seconds: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Settings {
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsInput {
    pub currency: Option<String>,
    pub utc_offset_minutes: Option<i32>,
    pub insight_window: Option<u32>,
    pub cache_ttl_seconds: Option<u64>,
}
