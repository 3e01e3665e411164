use chrono::{DateTime, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

use super::round2;
use crate::models::Trade;

/// Fixed intraday windows, keyed on the hour a trade was logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingSession {
    /// 09:00-11:00
    FirstNinetyMinutes,
    /// 11:00-13:00
    MidMorning,
    /// 13:00 onwards, and anything outside the other two windows
    Afternoon,
}

impl TradingSession {
    pub const ALL: [TradingSession; 3] = [
        TradingSession::FirstNinetyMinutes,
        TradingSession::MidMorning,
        TradingSession::Afternoon,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            9..=10 => TradingSession::FirstNinetyMinutes,
            11..=12 => TradingSession::MidMorning,
            _ => TradingSession::Afternoon,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TradingSession::FirstNinetyMinutes => "the first 90 minutes (9:00-11:00)",
            TradingSession::MidMorning => "mid-morning (11:00-13:00)",
            TradingSession::Afternoon => "the afternoon (after 13:00)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPerformance {
    pub session: TradingSession,
    pub trade_count: usize,
    pub total_pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeOfDayResult {
    pub sessions: Vec<SessionPerformance>,
    /// Session with the highest summed P&L among sessions that have trades.
    pub best_time: Option<TradingSession>,
}

/// Bucket trades by the wall-clock hour of `created_at` in `offset`.
pub fn analyze_time_of_day(trades: &[Trade], offset: FixedOffset) -> TimeOfDayResult {
    let mut sessions: Vec<SessionPerformance> = TradingSession::ALL
        .iter()
        .map(|&session| SessionPerformance {
            session,
            trade_count: 0,
            total_pnl: 0.0,
        })
        .collect();

    for trade in trades {
        let Some(logged_at) = DateTime::from_timestamp(trade.created_at, 0) else {
            log::warn!("Trade {} has an out-of-range created_at, skipping", trade.id);
            continue;
        };
        let session = TradingSession::from_hour(logged_at.with_timezone(&offset).hour());
        if let Some(bucket) = sessions.iter_mut().find(|s| s.session == session) {
            bucket.trade_count += 1;
            bucket.total_pnl += trade.pnl;
        }
    }

    let mut best: Option<&SessionPerformance> = None;
    for bucket in sessions.iter().filter(|s| s.trade_count > 0) {
        if best.is_none_or(|b| bucket.total_pnl > b.total_pnl) {
            best = Some(bucket);
        }
    }
    let best_time = best.map(|b| b.session);

    for bucket in &mut sessions {
        bucket.total_pnl = round2(bucket.total_pnl);
    }

    TimeOfDayResult {
        sessions,
        best_time,
    }
}
