use serde::{Deserialize, Serialize};

use super::most_recent_first;
use crate::models::Trade;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakCounts {
    pub current_win_streak: u32,
    pub max_win_streak: u32,
    pub current_plan_streak: u32,
    pub max_plan_streak: u32,
}

/// Length of the run at the head of the sequence; stops at the first `false`.
pub(crate) fn leading_run(flags: impl IntoIterator<Item = bool>) -> u32 {
    flags.into_iter().take_while(|f| *f).count() as u32
}

/// Longest run of `true` anywhere in the sequence.
pub(crate) fn longest_run(flags: impl IntoIterator<Item = bool>) -> u32 {
    let mut current = 0;
    let mut longest = 0;
    for flag in flags {
        if flag {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Current streaks count back from the most recent trade; max streaks scan all of history.
pub fn calculate_streaks(trades: &[Trade]) -> StreakCounts {
    let ordered = most_recent_first(trades);
    let wins = || ordered.iter().map(|t| t.is_win());
    let plans = || ordered.iter().map(|t| t.followed_plan);

    StreakCounts {
        current_win_streak: leading_run(wins()),
        max_win_streak: longest_run(wins()),
        current_plan_streak: leading_run(plans()),
        max_plan_streak: longest_run(plans()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::fixtures::trade;

    #[test]
    fn test_empty_history() {
        assert_eq!(calculate_streaks(&[]), StreakCounts::default());
    }

    #[test]
    fn test_current_and_max_differ() {
        // oldest -> newest: W W W L W W
        let trades = vec![
            trade("2024-02-01", 10.0).build(),
            trade("2024-02-02", 10.0).build(),
            trade("2024-02-03", 10.0).build(),
            trade("2024-02-04", -10.0).build(),
            trade("2024-02-05", 10.0).build(),
            trade("2024-02-06", 10.0).build(),
        ];
        let streaks = calculate_streaks(&trades);
        assert_eq!(streaks.current_win_streak, 2);
        assert_eq!(streaks.max_win_streak, 3);
    }

    #[test]
    fn test_latest_loss_resets_current_streak() {
        let trades = vec![
            trade("2024-02-01", 10.0).build(),
            trade("2024-02-02", 10.0).build(),
            trade("2024-02-03", -1.0).build(),
        ];
        let streaks = calculate_streaks(&trades);
        assert_eq!(streaks.current_win_streak, 0);
        assert_eq!(streaks.max_win_streak, 2);
        assert!(streaks.max_win_streak >= streaks.current_win_streak);
    }

    #[test]
    fn test_all_losses() {
        let trades: Vec<_> = (1..=5)
            .map(|d| trade(&format!("2024-02-0{}", d), -20.0).build())
            .collect();
        let streaks = calculate_streaks(&trades);
        assert_eq!(streaks.current_win_streak, 0);
        assert_eq!(streaks.max_win_streak, 0);
    }

    #[test]
    fn test_recent_losses_keep_older_max() {
        let mut trades = vec![
            trade("2024-01-10", 10.0).build(),
            trade("2024-01-11", 10.0).build(),
            trade("2024-01-12", 10.0).build(),
            trade("2024-01-13", 10.0).build(),
        ];
        for d in 1..=5 {
            trades.push(trade(&format!("2024-02-0{}", d), -20.0).build());
        }
        let streaks = calculate_streaks(&trades);
        assert_eq!(streaks.current_win_streak, 0);
        assert_eq!(streaks.max_win_streak, 4);
    }

    #[test]
    fn test_plan_streaks() {
        let trades = vec![
            trade("2024-02-01", 10.0).plan(true).build(),
            trade("2024-02-02", -10.0).plan(false).build(),
            trade("2024-02-03", -10.0).plan(true).build(),
            trade("2024-02-04", 10.0).plan(true).build(),
            trade("2024-02-05", -10.0).plan(true).build(),
        ];
        let streaks = calculate_streaks(&trades);
        assert_eq!(streaks.current_plan_streak, 3);
        assert_eq!(streaks.max_plan_streak, 3);
    }

    #[test]
    fn test_run_helpers() {
        assert_eq!(leading_run([true, true, false, true]), 2);
        assert_eq!(leading_run([false, true]), 0);
        assert_eq!(longest_run([true, false, true, true, true, false]), 3);
        assert_eq!(longest_run(Vec::<bool>::new()), 0);
    }
}
