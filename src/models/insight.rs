use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::JournalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    WinRateImprovement,
    PlanViolation,
    TopMistake,
    BestTimeOfDay,
    EmotionalState,
    LosingStreak,
    BreakoutEdge,
    RiskAdjustedEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Success,
}

impl InsightType {
    pub const ALL: [InsightType; 8] = [
        InsightType::WinRateImprovement,
        InsightType::PlanViolation,
        InsightType::TopMistake,
        InsightType::BestTimeOfDay,
        InsightType::EmotionalState,
        InsightType::LosingStreak,
        InsightType::BreakoutEdge,
        InsightType::RiskAdjustedEdge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::WinRateImprovement => "win_rate_improvement",
            InsightType::PlanViolation => "plan_violation",
            InsightType::TopMistake => "top_mistake",
            InsightType::BestTimeOfDay => "best_time_of_day",
            InsightType::EmotionalState => "emotional_state",
            InsightType::LosingStreak => "losing_streak",
            InsightType::BreakoutEdge => "breakout_edge",
            InsightType::RiskAdjustedEdge => "risk_adjusted_edge",
        }
    }
}

impl FromStr for InsightType {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InsightType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| JournalError::validation("insight_type", format!("unknown insight type '{}'", s)))
    }
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Success => "success",
        }
    }
}

impl FromStr for Severity {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "success" => Ok(Severity::Success),
            other => Err(JournalError::validation(
                "severity",
                format!("unknown severity '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub message: String,
    pub severity: Severity,
}

impl Insight {
    pub fn new(insight_type: InsightType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            insight_type,
            message: message.into(),
            severity,
        }
    }
}
