use serde::{Deserialize, Serialize};

use super::{average, average_r, percentage, round2};
use crate::models::Trade;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub total_trades: usize,
    pub winning_trades: usize,
    /// Includes breakeven trades.
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_pnl: f64,
    pub avg_return_pct: f64,
    /// Over trades with a stop loss only.
    pub avg_r_multiple: f64,
    pub avg_winner_r: f64,
    pub avg_loser_r: f64,
    /// Share of trades that carry an R-multiple.
    pub stop_loss_usage_rate: f64,
    pub plan_follow_rate: f64,
    /// Sum of positive P&L.
    pub total_profit: f64,
    /// Absolute sum of negative P&L.
    pub total_loss: f64,
    /// `None` when there are no losses to divide by.
    pub profit_factor: Option<f64>,
    pub best_trade: f64,
    pub worst_trade: f64,
}

pub fn calculate_summary(trades: &[Trade]) -> SummaryStatistics {
    if trades.is_empty() {
        return SummaryStatistics::default();
    }

    let total = trades.len();
    let winners: Vec<&Trade> = trades.iter().filter(|t| t.is_win()).collect();
    let losers: Vec<&Trade> = trades.iter().filter(|t| !t.is_win()).collect();

    let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
    let total_return: f64 = trades.iter().map(|t| t.return_pct).sum();
    let total_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let total_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();

    let with_stop = trades.iter().filter(|t| t.r_multiple.is_some()).count();
    let followed = trades.iter().filter(|t| t.followed_plan).count();

    let best_trade = trades.iter().map(|t| t.pnl).fold(f64::MIN, f64::max);
    let worst_trade = trades.iter().map(|t| t.pnl).fold(f64::MAX, f64::min);

    let profit_factor = if total_loss > 0.0 {
        Some(round2(total_profit / total_loss))
    } else {
        None
    };

    SummaryStatistics {
        total_trades: total,
        winning_trades: winners.len(),
        losing_trades: losers.len(),
        win_rate: round2(percentage(winners.len(), total)),
        total_pnl: round2(total_pnl),
        avg_pnl: round2(average(total_pnl, total)),
        avg_return_pct: round2(average(total_return, total)),
        avg_r_multiple: round2(average_r(trades)),
        avg_winner_r: round2(average_r(winners.iter().copied())),
        avg_loser_r: round2(average_r(losers.iter().copied())),
        stop_loss_usage_rate: round2(percentage(with_stop, total)),
        plan_follow_rate: round2(percentage(followed, total)),
        total_profit: round2(total_profit),
        total_loss: round2(total_loss),
        profit_factor,
        best_trade: round2(best_trade),
        worst_trade: round2(worst_trade),
    }
}
