use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Materialized aggregate of one user's trades on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricsRollup {
    pub user_id: i64,
    pub date: NaiveDate,
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub total_pnl: f64,
    pub win_rate: f64,
    pub avg_r_multiple: f64,
    pub plan_adherence_rate: f64,
    pub mistake_frequency_rate: f64,
}
