use super::{chronological, round2};
use crate::models::Trade;

/// Largest peak-to-trough drop of cumulative P&L, walking trades oldest first.
///
/// Equity starts at 0, so a losing first trade already counts as drawdown.
/// The caller's slice is left in its original order.
pub fn calculate_max_drawdown(trades: &[Trade]) -> f64 {
    let mut cumulative = 0.0;
    let mut peak = 0.0_f64;
    let mut max_drawdown = 0.0_f64;

    for trade in chronological(trades) {
        cumulative += trade.pnl;
        peak = peak.max(cumulative);
        max_drawdown = max_drawdown.max(peak - cumulative);
    }

    round2(max_drawdown)
}
