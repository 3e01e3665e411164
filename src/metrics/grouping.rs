use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{average, average_r, percentage, round2};
use crate::models::{BreakoutType, NiftyRange, Trade};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAnalysis {
    pub trade_count: usize,
    pub win_rate: f64,
    pub avg_pnl: f64,
    pub avg_r_multiple: f64,
    pub total_pnl: f64,
}

impl GroupAnalysis {
    fn from_trades(trades: &[&Trade]) -> Self {
        let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
        let wins = trades.iter().filter(|t| t.is_win()).count();

        GroupAnalysis {
            trade_count: trades.len(),
            win_rate: round2(percentage(wins, trades.len())),
            avg_pnl: round2(average(total_pnl, trades.len())),
            avg_r_multiple: round2(average_r(trades.iter().copied())),
            total_pnl: round2(total_pnl),
        }
    }
}

/// Group by `key`, dropping trades without one. Empty groups never appear.
fn analyze_groups<K, F>(trades: &[Trade], key: F) -> BTreeMap<K, GroupAnalysis>
where
    K: Ord,
    F: Fn(&Trade) -> Option<K>,
{
    let mut groups: BTreeMap<K, Vec<&Trade>> = BTreeMap::new();
    for trade in trades {
        if let Some(k) = key(trade) {
            groups.entry(k).or_default().push(trade);
        }
    }

    groups
        .into_iter()
        .map(|(k, members)| (k, GroupAnalysis::from_trades(&members)))
        .collect()
}

pub fn analyze_by_breakout(trades: &[Trade]) -> BTreeMap<BreakoutType, GroupAnalysis> {
    analyze_groups(trades, |t| t.breakout_type)
}

pub fn analyze_by_range(trades: &[Trade]) -> BTreeMap<NiftyRange, GroupAnalysis> {
    analyze_groups(trades, |t| t.nifty_range)
}
