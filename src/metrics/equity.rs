use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::round2;
use crate::models::DailyMetricsRollup;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurvePoint {
    pub date: NaiveDate,
    pub daily_pnl: f64,
    pub cumulative_pnl: f64,
    pub trade_count: u32,
    pub win_rate: f64,
    pub avg_r_multiple: f64,
}

/// Running cumulative P&L, one point per day that has a rollup. Days without
/// trades are not filled in.
pub fn build_equity_curve(rollups: &[DailyMetricsRollup]) -> Vec<EquityCurvePoint> {
    let mut ordered: Vec<&DailyMetricsRollup> = rollups.iter().collect();
    ordered.sort_by_key(|r| r.date);

    let mut cumulative_pnl = 0.0;
    ordered
        .into_iter()
        .map(|rollup| {
            cumulative_pnl += rollup.total_pnl;
            EquityCurvePoint {
                date: rollup.date,
                daily_pnl: rollup.total_pnl,
                cumulative_pnl: round2(cumulative_pnl),
                trade_count: rollup.total_trades,
                win_rate: rollup.win_rate,
                avg_r_multiple: rollup.avg_r_multiple,
            }
        })
        .collect()
}
