use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::tags::TagSet;
use super::window::DateWindow;
use crate::error::JournalError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    Call,
    Put,
    #[default]
    None,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
            OptionType::None => "none",
        }
    }
}

impl FromStr for OptionType {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "call" | "ce" => Ok(OptionType::Call),
            "put" | "pe" => Ok(OptionType::Put),
            "none" | "" => Ok(OptionType::None),
            other => Err(JournalError::validation(
                "option_type",
                format!("unknown option type '{}'", other),
            )),
        }
    }
}

/// Chart pattern that triggered the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakoutType {
    Vertical,
    Horizontal,
}

impl BreakoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakoutType::Vertical => "vertical",
            BreakoutType::Horizontal => "horizontal",
        }
    }

    /// Parses an optional breakout label; `none` and blank map to `None`.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, JournalError> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl FromStr for BreakoutType {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vertical" => Ok(BreakoutType::Vertical),
            "horizontal" => Ok(BreakoutType::Horizontal),
            other => Err(JournalError::validation(
                "breakout_type",
                format!("unknown breakout type '{}'", other),
            )),
        }
    }
}

impl fmt::Display for BreakoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakoutType::Vertical => write!(f, "Vertical"),
            BreakoutType::Horizontal => write!(f, "Horizontal"),
        }
    }
}

/// How the index opened relative to the previous day's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NiftyRange {
    InsideDay,
    OutsideBullish,
    OutsideBearish,
}

impl NiftyRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            NiftyRange::InsideDay => "inside_day",
            NiftyRange::OutsideBullish => "outside_bullish",
            NiftyRange::OutsideBearish => "outside_bearish",
        }
    }

    pub fn parse_optional(s: &str) -> Result<Option<Self>, JournalError> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl FromStr for NiftyRange {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inside_day" => Ok(NiftyRange::InsideDay),
            "outside_bullish" => Ok(NiftyRange::OutsideBullish),
            "outside_bearish" => Ok(NiftyRange::OutsideBearish),
            other => Err(JournalError::validation(
                "nifty_range",
                format!("unknown range classification '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub user_id: i64,
    pub symbol: String,
    pub option_type: OptionType,
    pub breakout_type: Option<BreakoutType>,
    pub nifty_range: Option<NiftyRange>,

    pub entry_price: f64,
    pub exit_price: f64,
    pub stop_loss: Option<f64>,
    pub quantity: u32,

    pub trade_date: NaiveDate,
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,

    pub followed_plan: bool,
    pub mistakes: TagSet,
    pub entry_emotion: TagSet,
    pub exit_emotion: TagSet,
    pub notes: String,

    // Derived, written only through metrics::calculator
    pub pnl: f64,
    pub return_pct: f64,
    pub risk_amount: Option<f64>,
    pub r_multiple: Option<f64>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Trade {
    /// A trade wins only on strictly positive P&L; breakeven counts as a loss.
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn has_emotion(&self, label: &str) -> bool {
        self.entry_emotion.contains(label) || self.exit_emotion.contains(label)
    }

    pub fn to_input(&self) -> CreateTradeInput {
        CreateTradeInput {
            symbol: self.symbol.clone(),
            option_type: self.option_type,
            breakout_type: self.breakout_type,
            nifty_range: self.nifty_range,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            stop_loss: self.stop_loss,
            quantity: self.quantity,
            trade_date: self.trade_date,
            entry_time: self.entry_time,
            exit_time: self.exit_time,
            followed_plan: self.followed_plan,
            mistakes: self.mistakes.clone(),
            entry_emotion: self.entry_emotion.clone(),
            exit_emotion: self.exit_emotion.clone(),
            notes: self.notes.clone(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTradeInput {
    pub symbol: String,
    #[serde(default)]
    pub option_type: OptionType,
    #[serde(default)]
    pub breakout_type: Option<BreakoutType>,
    #[serde(default)]
    pub nifty_range: Option<NiftyRange>,

    pub entry_price: f64,
    pub exit_price: f64,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    pub quantity: u32,

    pub trade_date: NaiveDate,
    #[serde(default)]
    pub entry_time: Option<NaiveTime>,
    #[serde(default)]
    pub exit_time: Option<NaiveTime>,

    #[serde(default = "default_true")]
    pub followed_plan: bool,
    #[serde(default)]
    pub mistakes: TagSet,
    #[serde(default)]
    pub entry_emotion: TagSet,
    #[serde(default)]
    pub exit_emotion: TagSet,
    #[serde(default)]
    pub notes: String,
}

// Distinguishes an absent key (keep) from an explicit null (clear).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Partial edit of a trade. Nullable columns use `Some(None)` to clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTradeInput {
    pub symbol: Option<String>,
    pub option_type: Option<OptionType>,
    #[serde(default, deserialize_with = "double_option")]
    pub breakout_type: Option<Option<BreakoutType>>,
    #[serde(default, deserialize_with = "double_option")]
    pub nifty_range: Option<Option<NiftyRange>>,
    pub entry_price: Option<f64>,
    pub exit_price: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub stop_loss: Option<Option<f64>>,
    pub quantity: Option<u32>,
    pub trade_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub entry_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "double_option")]
    pub exit_time: Option<Option<NaiveTime>>,
    pub followed_plan: Option<bool>,
    pub mistakes: Option<TagSet>,
    pub entry_emotion: Option<TagSet>,
    pub exit_emotion: Option<TagSet>,
    pub notes: Option<String>,
}

impl UpdateTradeInput {
    pub fn apply_to(self, input: &mut CreateTradeInput) {
        if let Some(symbol) = self.symbol {
            input.symbol = symbol;
        }
        if let Some(option_type) = self.option_type {
            input.option_type = option_type;
        }
        if let Some(breakout_type) = self.breakout_type {
            input.breakout_type = breakout_type;
        }
        if let Some(nifty_range) = self.nifty_range {
            input.nifty_range = nifty_range;
        }
        if let Some(entry_price) = self.entry_price {
            input.entry_price = entry_price;
        }
        if let Some(exit_price) = self.exit_price {
            input.exit_price = exit_price;
        }
        if let Some(stop_loss) = self.stop_loss {
            input.stop_loss = stop_loss;
        }
        if let Some(quantity) = self.quantity {
            input.quantity = quantity;
        }
        if let Some(trade_date) = self.trade_date {
            input.trade_date = trade_date;
        }
        if let Some(entry_time) = self.entry_time {
            input.entry_time = entry_time;
        }
        if let Some(exit_time) = self.exit_time {
            input.exit_time = exit_time;
        }
        if let Some(followed_plan) = self.followed_plan {
            input.followed_plan = followed_plan;
        }
        if let Some(mistakes) = self.mistakes {
            input.mistakes = mistakes;
        }
        if let Some(entry_emotion) = self.entry_emotion {
            input.entry_emotion = entry_emotion;
        }
        if let Some(exit_emotion) = self.exit_emotion {
            input.exit_emotion = exit_emotion;
        }
        if let Some(notes) = self.notes {
            input.notes = notes;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeFilters {
    pub symbol: Option<String>,
    pub option_type: Option<OptionType>,
    pub breakout_type: Option<BreakoutType>,
    pub window: Option<DateWindow>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
