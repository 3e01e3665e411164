use chrono::NaiveDate;
use std::collections::BTreeSet;

use super::{average_r, percentage, round2};
use crate::models::{DailyMetricsRollup, Trade};

/// Rollup for one (user, date) from that user's trades. Returns `None` when the
/// date has no trades, so the caller can drop a stale row.
pub fn compute_daily_rollup(
    user_id: i64,
    date: NaiveDate,
    trades: &[Trade],
) -> Option<DailyMetricsRollup> {
    let day: Vec<&Trade> = trades
        .iter()
        .filter(|t| t.user_id == user_id && t.trade_date == date)
        .collect();
    if day.is_empty() {
        return None;
    }

    let total = day.len();
    let winning = day.iter().filter(|t| t.is_win()).count();
    let followed = day.iter().filter(|t| t.followed_plan).count();
    let with_mistakes = day.iter().filter(|t| !t.mistakes.is_empty()).count();

    Some(DailyMetricsRollup {
        user_id,
        date,
        total_trades: total as u32,
        winning_trades: winning as u32,
        losing_trades: (total - winning) as u32,
        total_pnl: round2(day.iter().map(|t| t.pnl).sum()),
        win_rate: round2(percentage(winning, total)),
        avg_r_multiple: round2(average_r(day.iter().copied())),
        plan_adherence_rate: round2(percentage(followed, total)),
        mistake_frequency_rate: round2(percentage(with_mistakes, total)),
    })
}

/// One rollup per date present in `trades`, oldest first.
pub fn compute_daily_rollups(user_id: i64, trades: &[Trade]) -> Vec<DailyMetricsRollup> {
    let dates: BTreeSet<NaiveDate> = trades
        .iter()
        .filter(|t| t.user_id == user_id)
        .map(|t| t.trade_date)
        .collect();

    dates
        .into_iter()
        .filter_map(|date| compute_daily_rollup(user_id, date, trades))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::fixtures::trade;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_rollup_for_one_day() {
        let trades = vec![
            trade("2024-03-01", 120.0).r(2.0).build(),
            trade("2024-03-01", -60.0).r(-1.0).plan(false).mistakes("moved stop").build(),
            trade("2024-03-01", 0.0).build(),
            trade("2024-03-02", 500.0).build(),
        ];
        let rollup = compute_daily_rollup(1, date("2024-03-01"), &trades).unwrap();

        assert_eq!(rollup.total_trades, 3);
        assert_eq!(rollup.winning_trades, 1);
        assert_eq!(rollup.losing_trades, 2);
        assert_eq!(rollup.total_pnl, 60.0);
        assert_eq!(rollup.win_rate, 33.33);
        assert_eq!(rollup.avg_r_multiple, 0.5);
        assert_eq!(rollup.plan_adherence_rate, 66.67);
        assert_eq!(rollup.mistake_frequency_rate, 33.33);
    }

    #[test]
    fn test_empty_day_has_no_rollup() {
        let trades = vec![trade("2024-03-02", 10.0).build()];
        assert!(compute_daily_rollup(1, date("2024-03-01"), &trades).is_none());
    }

    #[test]
    fn test_other_users_are_ignored() {
        let mut other = trade("2024-03-01", 999.0).build();
        other.user_id = 2;
        let trades = vec![trade("2024-03-01", 10.0).build(), other];
        let rollup = compute_daily_rollup(1, date("2024-03-01"), &trades).unwrap();
        assert_eq!(rollup.total_trades, 1);
        assert_eq!(rollup.total_pnl, 10.0);
    }

    #[test]
    fn test_all_dates() {
        let trades = vec![
            trade("2024-03-03", 10.0).build(),
            trade("2024-03-01", 20.0).build(),
            trade("2024-03-03", -5.0).build(),
        ];
        let rollups = compute_daily_rollups(1, &trades);
        assert_eq!(rollups.len(), 2);
        assert_eq!(rollups[0].date, date("2024-03-01"));
        assert_eq!(rollups[1].total_pnl, 5.0);
    }
}
