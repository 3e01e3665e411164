use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::round2;
use crate::models::Trade;

pub const TOP_MISTAKES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MistakePattern {
    pub mistake: String,
    pub frequency: u32,
    pub total_pnl: f64,
    pub avg_pnl: f64,
    pub trade_ids: Vec<String>,
}

/// Every mistake label with its frequency, most frequent first.
///
/// A label counts once per trade. Equal frequencies keep first-seen order.
pub fn rank_mistakes<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Vec<MistakePattern> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut patterns: Vec<MistakePattern> = Vec::new();

    for trade in trades {
        for label in trade.mistakes.iter() {
            let slot = *index.entry(label).or_insert_with(|| {
                patterns.push(MistakePattern {
                    mistake: label.to_string(),
                    frequency: 0,
                    total_pnl: 0.0,
                    avg_pnl: 0.0,
                    trade_ids: Vec::new(),
                });
                patterns.len() - 1
            });
            let pattern = &mut patterns[slot];
            pattern.frequency += 1;
            pattern.total_pnl += trade.pnl;
            pattern.trade_ids.push(trade.id.clone());
        }
    }

    for pattern in &mut patterns {
        pattern.avg_pnl = round2(pattern.total_pnl / pattern.frequency as f64);
        pattern.total_pnl = round2(pattern.total_pnl);
    }

    // stable sort keeps first-seen order among ties
    patterns.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    patterns
}

/// The five most frequent mistakes with their P&L impact.
pub fn find_mistake_patterns(trades: &[Trade]) -> Vec<MistakePattern> {
    let mut ranked = rank_mistakes(trades);
    ranked.truncate(TOP_MISTAKES);
    ranked
}
