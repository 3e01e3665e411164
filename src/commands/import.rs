use chrono::{NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::trades::{insert_new_trade, rebuild_rollups, refresh_rollups, restore_trade};
use crate::db::{settings, trades};
use crate::error::{JournalError, Result};
use crate::metrics::{compute_trade_metrics, TradeMetrics};
use crate::models::{
    BreakoutType, CreateTradeInput, NiftyRange, OptionType, Settings, TagSet, Trade,
    UpdateSettingsInput,
};
use crate::AppState;

const BACKUP_VERSION: &str = "1.0.0";

const CSV_HEADERS: [&str; 16] = [
    "symbol",
    "option_type",
    "breakout_type",
    "nifty_range",
    "entry_price",
    "exit_price",
    "stop_loss",
    "quantity",
    "trade_date",
    "entry_time",
    "exit_time",
    "followed_plan",
    "mistakes",
    "entry_emotion",
    "exit_emotion",
    "notes",
];

/// One spreadsheet row. Blank cells become `None` or empty strings.
#[derive(Debug, Serialize, Deserialize)]
struct CsvTradeRow {
    symbol: String,
    #[serde(default)]
    option_type: String,
    #[serde(default)]
    breakout_type: String,
    #[serde(default)]
    nifty_range: String,
    entry_price: f64,
    exit_price: f64,
    #[serde(default)]
    stop_loss: Option<f64>,
    quantity: u32,
    trade_date: String,
    #[serde(default)]
    entry_time: String,
    #[serde(default)]
    exit_time: String,
    #[serde(default)]
    followed_plan: String,
    #[serde(default)]
    mistakes: String,
    #[serde(default)]
    entry_emotion: String,
    #[serde(default)]
    exit_emotion: String,
    #[serde(default)]
    notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRow {
    pub line: u64,
    pub trade: CreateTradeInput,
    pub metrics: TradeMetrics,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportPreview {
    pub rows: Vec<PreviewRow>,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResult {
    pub imported: usize,
    pub errors: Vec<String>,
}

/// Reads the option side off contract symbols such as `NIFTY24MAR22000CE`
/// or `BANKNIFTY 48000 PUT`.
struct SymbolClassifier {
    call: Regex,
    put: Regex,
}

impl SymbolClassifier {
    fn new() -> Result<Self> {
        Ok(Self {
            call: Regex::new(r"(?i)(CE|CALL)$")?,
            put: Regex::new(r"(?i)(PE|PUT)$")?,
        })
    }

    fn option_type(&self, symbol: &str) -> OptionType {
        let symbol = symbol.trim();
        if self.call.is_match(symbol) {
            OptionType::Call
        } else if self.put.is_match(symbol) {
            OptionType::Put
        } else {
            OptionType::None
        }
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .ok_or_else(|| JournalError::validation(field, format!("unrecognised date '{}'", value)))
}

fn parse_time(field: &'static str, value: &str) -> Result<Option<NaiveTime>> {
    if value.is_empty() {
        return Ok(None);
    }
    ["%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
        .map(Some)
        .ok_or_else(|| JournalError::validation(field, format!("unrecognised time '{}'", value)))
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "" | "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" => Ok(false),
        other => Err(JournalError::validation(
            "followed_plan",
            format!("expected yes/no, got '{}'", other),
        )),
    }
}

impl CsvTradeRow {
    fn into_input(self, classifier: &SymbolClassifier) -> Result<CreateTradeInput> {
        let option_type = if self.option_type.is_empty() {
            classifier.option_type(&self.symbol)
        } else {
            self.option_type.parse()?
        };

        Ok(CreateTradeInput {
            option_type,
            breakout_type: BreakoutType::parse_optional(&self.breakout_type)?,
            nifty_range: NiftyRange::parse_optional(&self.nifty_range)?,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            stop_loss: self.stop_loss,
            quantity: self.quantity,
            trade_date: parse_date("trade_date", &self.trade_date)?,
            entry_time: parse_time("entry_time", &self.entry_time)?,
            exit_time: parse_time("exit_time", &self.exit_time)?,
            followed_plan: parse_flag(&self.followed_plan)?,
            mistakes: TagSet::parse(&self.mistakes),
            entry_emotion: TagSet::parse(&self.entry_emotion),
            exit_emotion: TagSet::parse(&self.exit_emotion),
            notes: self.notes,
            symbol: self.symbol,
        })
    }

    fn from_trade(trade: &Trade) -> Self {
        let time = |t: Option<NaiveTime>| t.map(|t| t.format("%H:%M:%S").to_string()).unwrap_or_default();
        Self {
            symbol: trade.symbol.clone(),
            option_type: trade.option_type.as_str().to_string(),
            breakout_type: trade.breakout_type.map(|b| b.as_str().to_string()).unwrap_or_default(),
            nifty_range: trade.nifty_range.map(|r| r.as_str().to_string()).unwrap_or_default(),
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            stop_loss: trade.stop_loss,
            quantity: trade.quantity,
            trade_date: trade.trade_date.format("%Y-%m-%d").to_string(),
            entry_time: time(trade.entry_time),
            exit_time: time(trade.exit_time),
            followed_plan: if trade.followed_plan { "yes" } else { "no" }.to_string(),
            mistakes: trade.mistakes.to_storage(),
            entry_emotion: trade.entry_emotion.to_storage(),
            exit_emotion: trade.exit_emotion.to_storage(),
            notes: trade.notes.clone(),
        }
    }
}

/// Parse every data row. Rows that fail to parse or validate are reported by
/// line number and left out.
fn parse_trades_csv(csv_content: &str) -> Result<(Vec<PreviewRow>, Vec<String>)> {
    let classifier = SymbolClassifier::new()?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_content.as_bytes());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                errors.push(e.to_string());
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let parsed = record
            .deserialize::<CsvTradeRow>(Some(&headers))
            .map_err(JournalError::from)
            .and_then(|row| row.into_input(&classifier))
            .and_then(|input| {
                if input.symbol.trim().is_empty() {
                    return Err(JournalError::validation("symbol", "must not be empty"));
                }
                let metrics = compute_trade_metrics(
                    input.entry_price,
                    input.exit_price,
                    input.stop_loss,
                    input.quantity,
                )?;
                Ok((input, metrics))
            });

        match parsed {
            Ok((trade, metrics)) => rows.push(PreviewRow {
                line,
                trade,
                metrics,
            }),
            Err(e) => {
                log::warn!("Skipping CSV line {}: {}", line, e);
                errors.push(format!("Line {}: {}", line, e));
            }
        }
    }

    Ok((rows, errors))
}

/// Parse a trade CSV and show what would be imported, without writing anything.
pub async fn preview_trades_csv(csv_content: &str) -> Result<ImportPreview> {
    let (rows, errors) = parse_trades_csv(csv_content)?;
    Ok(ImportPreview { rows, errors })
}

pub async fn import_trades_csv(
    state: &AppState,
    user_id: i64,
    csv_content: &str,
) -> Result<ImportResult> {
    let (rows, mut errors) = parse_trades_csv(csv_content)?;

    let imported = {
        let conn = state.db.lock()?;
        let tx = conn.unchecked_transaction()?;

        let mut dates = Vec::new();
        for row in rows {
            match insert_new_trade(&tx, user_id, row.trade) {
                Ok(trade) => dates.push(trade.trade_date),
                Err(e) => errors.push(format!("Line {}: {}", row.line, e)),
            }
        }
        let imported = dates.len();
        refresh_rollups(&tx, user_id, dates)?;
        tx.commit()?;
        imported
    };

    log::info!(
        "CSV import for user {}: {} imported, {} errors",
        user_id,
        imported,
        errors.len()
    );
    state.invalidate_user(user_id).await;
    Ok(ImportResult { imported, errors })
}

/// All of the user's trades, oldest first, in the import column layout.
pub async fn export_trades_csv(state: &AppState, user_id: i64) -> Result<String> {
    let all = {
        let conn = state.db.lock()?;
        trades::all_trades(&conn, user_id)?
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;
    for trade in &all {
        writer.serialize(CsvTradeRow::from_trade(trade))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| JournalError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| JournalError::Serialization(e.to_string()))
}

// Data Export/Import

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupData {
    pub settings: Settings,
    pub trades: Vec<Trade>,
    pub export_date: String,
    pub version: String,
}

/// Export settings and the user's trades as pretty JSON.
pub async fn export_all_data(state: &AppState, user_id: i64) -> Result<String> {
    let backup = {
        let conn = state.db.lock()?;
        BackupData {
            settings: settings::get_settings(&conn)?,
            trades: trades::all_trades(&conn, user_id)?,
            export_date: Utc::now().to_rfc3339(),
            version: BACKUP_VERSION.to_string(),
        }
    };
    Ok(serde_json::to_string_pretty(&backup)?)
}

/// Restore a JSON backup into the user's journal. Trades keep their ids;
/// derived fields and all rollups are recomputed. Returns
/// `(settings_updated, trades_imported)`.
pub async fn import_all_data(
    state: &AppState,
    user_id: i64,
    json_data: &str,
) -> Result<(usize, usize)> {
    let backup: BackupData = serde_json::from_str(json_data)?;

    let restored_settings = UpdateSettingsInput {
        currency: Some(backup.settings.currency.clone()),
        utc_offset_minutes: Some(backup.settings.utc_offset_minutes),
        insight_window: Some(backup.settings.insight_window),
        cache_ttl_seconds: Some(backup.settings.cache_ttl_seconds),
    };
    super::settings::validate(&restored_settings)?;

    // Settings and trades land together or not at all.
    let (updated, imported) = {
        let conn = state.db.lock()?;
        let tx = conn.unchecked_transaction()?;
        let updated = settings::update_settings(&tx, &restored_settings)?;
        for trade in &backup.trades {
            restore_trade(&tx, user_id, trade)?;
        }
        rebuild_rollups(&tx, user_id)?;
        tx.commit()?;
        (updated, backup.trades.len())
    };

    super::settings::apply_to_caches(state, &restored_settings, &updated).await;
    log::info!("Restored {} trades from backup for user {}", imported, user_id);
    state.invalidate_user(user_id).await;
    Ok((1, imported))
}
