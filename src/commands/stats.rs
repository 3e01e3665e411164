use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cache::CacheKey;
use crate::db::{rollups, settings, trades};
use crate::error::Result;
use crate::metrics::{
    analyze_by_breakout, analyze_by_range, analyze_time_of_day, build_equity_curve,
    calculate_max_drawdown, calculate_streaks, calculate_summary, find_mistake_patterns,
    EquityCurvePoint, GroupAnalysis, MistakePattern, StreakCounts, SummaryStatistics,
    TimeOfDayResult,
};
use crate::models::{BreakoutType, DailyMetricsRollup, DateWindow, NiftyRange, Trade};
use crate::AppState;

/// Everything the dashboard shows for one date window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub window: DateWindow,
    pub summary: SummaryStatistics,
    pub max_drawdown: f64,
    pub streaks: StreakCounts,
    pub top_mistakes: Vec<MistakePattern>,
    pub breakout_analysis: BTreeMap<BreakoutType, GroupAnalysis>,
    pub range_analysis: BTreeMap<NiftyRange, GroupAnalysis>,
    pub time_of_day: TimeOfDayResult,
}

fn load_window(
    state: &AppState,
    user_id: i64,
    window: &DateWindow,
) -> Result<(Vec<Trade>, chrono::FixedOffset)> {
    let conn = state.db.lock()?;
    let offset = settings::get_settings(&conn)?.utc_offset();
    let trades = trades::trades_in_window(&conn, user_id, window, super::local_today(offset))?;
    Ok((trades, offset))
}

pub async fn get_summary(
    state: &AppState,
    user_id: i64,
    window: Option<DateWindow>,
) -> Result<SummaryStatistics> {
    let window = window.unwrap_or_default();
    let key = CacheKey::new(user_id, window);
    if let Some(summary) = state.summaries.get(&key).await {
        return Ok(summary);
    }
    let seen = state.summaries.generation(user_id).await;

    let (trades, _) = load_window(state, user_id, &window)?;
    let summary = calculate_summary(&trades);

    state.summaries.insert(key, summary.clone(), seen).await;
    Ok(summary)
}

pub async fn get_dashboard(
    state: &AppState,
    user_id: i64,
    window: Option<DateWindow>,
) -> Result<DashboardReport> {
    let window = window.unwrap_or_default();
    let key = CacheKey::new(user_id, window);
    if let Some(report) = state.dashboards.get(&key).await {
        return Ok(report);
    }
    let seen = state.dashboards.generation(user_id).await;

    let (trades, offset) = load_window(state, user_id, &window)?;
    let report = DashboardReport {
        window,
        summary: calculate_summary(&trades),
        max_drawdown: calculate_max_drawdown(&trades),
        streaks: calculate_streaks(&trades),
        top_mistakes: find_mistake_patterns(&trades),
        breakout_analysis: analyze_by_breakout(&trades),
        range_analysis: analyze_by_range(&trades),
        time_of_day: analyze_time_of_day(&trades, offset),
    };
    log::debug!(
        "Built dashboard for user {} over {} trades",
        user_id,
        report.summary.total_trades
    );

    state.dashboards.insert(key, report.clone(), seen).await;
    Ok(report)
}

pub async fn get_daily_metrics(
    state: &AppState,
    user_id: i64,
    window: Option<DateWindow>,
) -> Result<Vec<DailyMetricsRollup>> {
    let conn = state.db.lock()?;
    let offset = settings::get_settings(&conn)?.utc_offset();
    rollups::rollups_in_window(
        &conn,
        user_id,
        &window.unwrap_or_default(),
        super::local_today(offset),
    )
}

pub async fn get_equity_curve(
    state: &AppState,
    user_id: i64,
    window: Option<DateWindow>,
) -> Result<Vec<EquityCurvePoint>> {
    let daily = get_daily_metrics(state, user_id, window).await?;
    Ok(build_equity_curve(&daily))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{input, state_with_user};
    use crate::commands::{create_trade, delete_trade, update_settings};
    use crate::models::{TagSet, UpdateSettingsInput};

    #[tokio::test]
    async fn test_summary_end_to_end() {
        let (state, user_id) = state_with_user();

        let mut with_stop = input("2024-03-04", 100.0, 110.0);
        with_stop.stop_loss = Some(95.0);
        create_trade(&state, user_id, with_stop).await.unwrap();

        let mut without_stop = input("2024-03-04", 50.0, 40.0);
        without_stop.quantity = 20;
        create_trade(&state, user_id, without_stop).await.unwrap();

        let summary = get_summary(&state, user_id, None).await.unwrap();
        assert_eq!(summary.total_trades, 2);
        assert_eq!(summary.winning_trades, 1);
        assert_eq!(summary.avg_r_multiple, 2.0);
        assert_eq!(summary.stop_loss_usage_rate, 50.0);
        assert_eq!(summary.total_pnl, -100.0);
    }

    #[tokio::test]
    async fn test_dashboard_cache_invalidated_by_writes() {
        let (state, user_id) = state_with_user();
        let first = create_trade(&state, user_id, input("2024-03-04", 100.0, 110.0))
            .await
            .unwrap();

        let report = get_dashboard(&state, user_id, None).await.unwrap();
        assert_eq!(report.summary.total_trades, 1);
        assert_eq!(state.dashboards.len().await, 1);

        let mut second = input("2024-03-05", 100.0, 90.0);
        second.mistakes = TagSet::parse("fomo");
        create_trade(&state, user_id, second).await.unwrap();
        assert_eq!(state.dashboards.len().await, 0);

        let report = get_dashboard(&state, user_id, None).await.unwrap();
        assert_eq!(report.summary.total_trades, 2);
        assert_eq!(report.max_drawdown, 100.0);
        assert_eq!(report.top_mistakes[0].mistake, "fomo");
        assert_eq!(report.streaks.current_win_streak, 0);

        delete_trade(&state, user_id, &first.id).await.unwrap();
        let report = get_dashboard(&state, user_id, None).await.unwrap();
        assert_eq!(report.summary.total_trades, 1);
    }

    #[tokio::test]
    async fn test_write_during_load_is_not_masked_by_cache() {
        let (state, user_id) = state_with_user();
        create_trade(&state, user_id, input("2024-03-04", 100.0, 110.0))
            .await
            .unwrap();

        // Replays get_summary with a trade committed between load and insert.
        let key = CacheKey::new(user_id, DateWindow::All);
        let seen = state.summaries.generation(user_id).await;
        let (trades, _) = load_window(&state, user_id, &DateWindow::All).unwrap();
        create_trade(&state, user_id, input("2024-03-05", 100.0, 90.0))
            .await
            .unwrap();
        state
            .summaries
            .insert(key, calculate_summary(&trades), seen)
            .await;

        let summary = get_summary(&state, user_id, None).await.unwrap();
        assert_eq!(summary.total_trades, 2);
        assert_eq!(summary.total_pnl, 0.0);
    }

    #[tokio::test]
    async fn test_results_match_with_cache_disabled() {
        let (state, user_id) = state_with_user();
        create_trade(&state, user_id, input("2024-03-04", 100.0, 110.0))
            .await
            .unwrap();
        let cached = get_summary(&state, user_id, None).await.unwrap();

        update_settings(
            &state,
            UpdateSettingsInput {
                cache_ttl_seconds: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let uncached = get_summary(&state, user_id, None).await.unwrap();
        assert_eq!(cached, uncached);
        assert_eq!(state.summaries.len().await, 0);
    }

    #[tokio::test]
    async fn test_equity_curve_from_rollups() {
        let (state, user_id) = state_with_user();
        create_trade(&state, user_id, input("2024-03-01", 100.0, 110.0))
            .await
            .unwrap();
        create_trade(&state, user_id, input("2024-03-03", 100.0, 95.0))
            .await
            .unwrap();
        create_trade(&state, user_id, input("2024-03-03", 100.0, 102.0))
            .await
            .unwrap();

        let curve = get_equity_curve(&state, user_id, None).await.unwrap();
        assert_eq!(curve.len(), 2);
        assert_eq!(curve[0].cumulative_pnl, 100.0);
        assert_eq!(curve[1].daily_pnl, -30.0);
        assert_eq!(curve[1].cumulative_pnl, 70.0);
        assert_eq!(curve[1].trade_count, 2);
        assert_eq!(curve[1].win_rate, 50.0);

        let window = DateWindow::Between {
            start: chrono::NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            end: chrono::NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        };
        let daily = get_daily_metrics(&state, user_id, Some(window)).await.unwrap();
        assert_eq!(daily.len(), 1);
    }
}
