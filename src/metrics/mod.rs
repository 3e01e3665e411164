//! Trade metrics engine: pure functions over in-memory trade collections.
//!
//! Nothing in here touches storage or shared state. Every function accepts an
//! empty slice and returns zeroed/empty results rather than failing.

pub mod calculator;
pub mod daily;
pub mod drawdown;
pub mod equity;
pub mod grouping;
pub mod insights;
pub mod patterns;
pub mod streaks;
pub mod summary;
pub mod time_of_day;

pub use calculator::{compute_trade_metrics, round2, TradeMetrics};
pub use daily::{compute_daily_rollup, compute_daily_rollups};
pub use drawdown::calculate_max_drawdown;
pub use equity::{build_equity_curve, EquityCurvePoint};
pub use grouping::{analyze_by_breakout, analyze_by_range, GroupAnalysis};
pub use insights::generate_insights;
pub use patterns::{find_mistake_patterns, MistakePattern};
pub use streaks::{calculate_streaks, StreakCounts};
pub use summary::{calculate_summary, SummaryStatistics};
pub use time_of_day::{analyze_time_of_day, SessionPerformance, TimeOfDayResult, TradingSession};

use crate::models::Trade;

/// Oldest first; same-day trades ordered by creation time.
pub(crate) fn chronological(trades: &[Trade]) -> Vec<&Trade> {
    let mut sorted: Vec<&Trade> = trades.iter().collect();
    sorted.sort_by(|a, b| {
        a.trade_date
            .cmp(&b.trade_date)
            .then(a.created_at.cmp(&b.created_at))
    });
    sorted
}

pub(crate) fn most_recent_first(trades: &[Trade]) -> Vec<&Trade> {
    let mut sorted = chronological(trades);
    sorted.reverse();
    sorted
}

pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub(crate) fn average(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Mean R-multiple over trades that carry one; trades without a stop are skipped.
pub(crate) fn average_r<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> f64 {
    let (sum, count) = trades
        .into_iter()
        .filter_map(|t| t.r_multiple)
        .fold((0.0, 0usize), |(sum, count), r| (sum + r, count + 1));
    average(sum, count)
}
