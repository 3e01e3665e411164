use chrono::FixedOffset;

use super::grouping::analyze_by_breakout;
use super::patterns::rank_mistakes;
use super::streaks::longest_run;
use super::time_of_day::analyze_time_of_day;
use super::{average, most_recent_first, percentage};
use crate::models::{BreakoutType, Insight, InsightType, Severity, Trade};

/// Recent trades considered at all.
pub const INSIGHT_WINDOW: usize = 20;
/// Trades per "week" slice.
pub const WEEK: usize = 7;
pub const MAX_INSIGHTS: usize = 7;

const MIN_PLAN_VIOLATIONS: usize = 2;
const MIN_MISTAKE_REPEATS: u32 = 3;
const MIN_EMOTIONAL_TRADES: usize = 3;
const MIN_LOSING_STREAK: u32 = 3;
const MIN_GROUP_TRADES: usize = 3;
const MIN_EDGE_PCT: f64 = 20.0;
const MIN_R_GAP: f64 = 0.5;

/// Run the heuristic battery over a user's most recent trades.
///
/// `recent` may be in any order and longer than [`INSIGHT_WINDOW`]; only the
/// newest 20 trades are used. The "last week" slice is the newest 7 of those
/// and the "previous week" the 7 before it.
pub fn generate_insights(recent: &[Trade], offset: FixedOffset) -> Vec<Insight> {
    let window: Vec<Trade> = most_recent_first(recent)
        .into_iter()
        .take(INSIGHT_WINDOW)
        .cloned()
        .collect();
    if window.is_empty() {
        return Vec::new();
    }

    let split = window.len().min(WEEK);
    let last_week = &window[..split];
    let previous_week = &window[split..window.len().min(2 * WEEK)];

    let mut insights: Vec<Insight> = [
        win_rate_improvement(last_week, previous_week),
        plan_violations(last_week),
        top_mistake(last_week),
        best_time_of_day(&window, offset),
        emotional_state(last_week),
        losing_streak(last_week),
    ]
    .into_iter()
    .flatten()
    .collect();
    insights.extend(breakout_edge(&window));

    insights.truncate(MAX_INSIGHTS);
    insights
}

fn win_rate(trades: &[Trade]) -> f64 {
    percentage(trades.iter().filter(|t| t.is_win()).count(), trades.len())
}

fn win_rate_improvement(last_week: &[Trade], previous_week: &[Trade]) -> Option<Insight> {
    let last = win_rate(last_week);
    let previous = win_rate(previous_week);
    if previous <= 0.0 || last <= previous {
        return None;
    }

    Some(Insight::new(
        InsightType::WinRateImprovement,
        Severity::Success,
        format!(
            "Your win rate improved by {}% over your last {} trades ({}% vs {}% before). Keep doing what's working.",
            (last - previous).round(),
            last_week.len(),
            last.round(),
            previous.round()
        ),
    ))
}

fn plan_violations(last_week: &[Trade]) -> Option<Insight> {
    let broken = last_week.iter().filter(|t| !t.followed_plan).count();
    if broken < MIN_PLAN_VIOLATIONS {
        return None;
    }

    Some(Insight::new(
        InsightType::PlanViolation,
        Severity::Warning,
        format!(
            "You broke your trading plan on {} of your last {} trades. Review your rules before the next entry.",
            broken,
            last_week.len()
        ),
    ))
}

fn top_mistake(last_week: &[Trade]) -> Option<Insight> {
    let ranked = rank_mistakes(last_week);
    let top = ranked.first().filter(|p| p.frequency >= MIN_MISTAKE_REPEATS)?;

    Some(Insight::new(
        InsightType::TopMistake,
        Severity::Warning,
        format!(
            "Your most frequent mistake lately is \"{}\" ({} times in your last {} trades).",
            top.mistake,
            top.frequency,
            last_week.len()
        ),
    ))
}

fn best_time_of_day(window: &[Trade], offset: FixedOffset) -> Option<Insight> {
    let best = analyze_time_of_day(window, offset).best_time?;

    Some(Insight::new(
        InsightType::BestTimeOfDay,
        Severity::Info,
        format!(
            "You trade best during {}. Consider concentrating your entries there.",
            best.label()
        ),
    ))
}

fn emotional_state(last_week: &[Trade]) -> Option<Insight> {
    let emotional: Vec<&Trade> = last_week
        .iter()
        .filter(|t| t.has_emotion("fearful") || t.has_emotion("overconfident"))
        .collect();
    let calm: Vec<&Trade> = last_week.iter().filter(|t| t.has_emotion("calm")).collect();
    // Without calm trades there is no baseline to compare against.
    if emotional.len() < MIN_EMOTIONAL_TRADES || calm.is_empty() {
        return None;
    }

    let emotional_avg = average(emotional.iter().map(|t| t.pnl).sum(), emotional.len());
    let calm_avg = average(calm.iter().map(|t| t.pnl).sum(), calm.len());
    if calm_avg <= emotional_avg {
        return None;
    }

    Some(Insight::new(
        InsightType::EmotionalState,
        Severity::Info,
        format!(
            "Calm trades average {:.2} P&L versus {:.2} when fearful or overconfident. Step away when emotions run high.",
            calm_avg, emotional_avg
        ),
    ))
}

fn losing_streak(last_week: &[Trade]) -> Option<Insight> {
    let streak = longest_run(last_week.iter().map(|t| !t.is_win()));
    if streak < MIN_LOSING_STREAK {
        return None;
    }

    Some(Insight::new(
        InsightType::LosingStreak,
        Severity::Warning,
        format!(
            "You had {} consecutive losing trades recently. Consider a break to reset before trading again.",
            streak
        ),
    ))
}

fn breakout_edge(window: &[Trade]) -> Vec<Insight> {
    let groups = analyze_by_breakout(window);
    let (Some(vertical), Some(horizontal)) = (
        groups.get(&BreakoutType::Vertical),
        groups.get(&BreakoutType::Horizontal),
    ) else {
        return Vec::new();
    };
    if vertical.trade_count < MIN_GROUP_TRADES || horizontal.trade_count < MIN_GROUP_TRADES {
        return Vec::new();
    }

    let mut insights = Vec::new();

    let ((strong, strong_stats), (weak, weak_stats)) = if vertical.avg_pnl >= horizontal.avg_pnl {
        ((BreakoutType::Vertical, vertical), (BreakoutType::Horizontal, horizontal))
    } else {
        ((BreakoutType::Horizontal, horizontal), (BreakoutType::Vertical, vertical))
    };
    let gap = strong_stats.avg_pnl - weak_stats.avg_pnl;
    let base = weak_stats.avg_pnl.abs();
    // A break-even weaker style has no relative scale; any positive gap counts.
    let edge = if base > 0.0 {
        let pct = gap / base * 100.0;
        (pct > MIN_EDGE_PCT).then(|| format!("{}%", pct.round()))
    } else {
        (gap > 0.0).then(|| format!("{:.2}", gap))
    };
    if let Some(edge) = edge {
        let severity = if strong_stats.avg_pnl > 0.0 {
            Severity::Success
        } else {
            Severity::Info
        };
        insights.push(Insight::new(
            InsightType::BreakoutEdge,
            severity,
            format!(
                "{} breakouts are outperforming {} breakouts by {} on average P&L ({:.2} vs {:.2}).",
                strong,
                weak.as_str(),
                edge,
                strong_stats.avg_pnl,
                weak_stats.avg_pnl
            ),
        ));
    }

    let r_gap = (vertical.avg_r_multiple - horizontal.avg_r_multiple).abs();
    if r_gap > MIN_R_GAP {
        let better = if vertical.avg_r_multiple >= horizontal.avg_r_multiple {
            BreakoutType::Vertical
        } else {
            BreakoutType::Horizontal
        };
        insights.push(Insight::new(
            InsightType::RiskAdjustedEdge,
            Severity::Info,
            format!(
                "{} breakouts return {:.2}R more per trade on a risk-adjusted basis.",
                better, r_gap
            ),
        ));
    }

    insights
}
