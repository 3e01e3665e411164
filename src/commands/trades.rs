use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use std::collections::BTreeSet;

use crate::db::{rollups, settings, tags, trades};
use crate::error::{JournalError, Result};
use crate::metrics::{compute_daily_rollup, compute_daily_rollups, compute_trade_metrics};
use crate::models::{CreateTradeInput, Trade, TradeFilters, UpdateTradeInput};
use crate::AppState;

fn new_trade_id() -> String {
    format!("TRADE-{}-{}", Utc::now().timestamp_millis(), uuid::Uuid::new_v4())
}

/// Validate `input` and derive its metrics. Derived fields are only ever set here.
fn build_trade(
    id: String,
    user_id: i64,
    input: CreateTradeInput,
    created_at: i64,
    updated_at: i64,
) -> Result<Trade> {
    let symbol = input.symbol.trim().to_string();
    if symbol.is_empty() {
        return Err(JournalError::validation("symbol", "must not be empty"));
    }

    let metrics = compute_trade_metrics(
        input.entry_price,
        input.exit_price,
        input.stop_loss,
        input.quantity,
    )?;

    Ok(Trade {
        id,
        user_id,
        symbol,
        option_type: input.option_type,
        breakout_type: input.breakout_type,
        nifty_range: input.nifty_range,
        entry_price: input.entry_price,
        exit_price: input.exit_price,
        stop_loss: input.stop_loss,
        quantity: input.quantity,
        trade_date: input.trade_date,
        entry_time: input.entry_time,
        exit_time: input.exit_time,
        followed_plan: input.followed_plan,
        mistakes: input.mistakes,
        entry_emotion: input.entry_emotion,
        exit_emotion: input.exit_emotion,
        notes: input.notes,
        pnl: metrics.pnl,
        return_pct: metrics.return_pct,
        risk_amount: metrics.risk_amount,
        r_multiple: metrics.r_multiple,
        created_at,
        updated_at,
    })
}

fn register_tags(conn: &Connection, trade: &Trade) -> Result<()> {
    tags::register_mistakes(conn, &trade.mistakes)?;
    tags::register_emotions(conn, trade.user_id, [&trade.entry_emotion, &trade.exit_emotion])
}

/// Build, insert and tag a new trade. Rollups are left to the caller.
pub(crate) fn insert_new_trade(
    conn: &Connection,
    user_id: i64,
    input: CreateTradeInput,
) -> Result<Trade> {
    let now = Utc::now().timestamp();
    let trade = build_trade(new_trade_id(), user_id, input, now, now)?;
    trades::insert_trade(conn, &trade)?;
    register_tags(conn, &trade)?;
    Ok(trade)
}

/// Write a trade from a backup under `user_id`, keeping its id and timestamps
/// but deriving its metrics again from the stored inputs.
pub(crate) fn restore_trade(conn: &Connection, user_id: i64, backup: &Trade) -> Result<Trade> {
    let trade = build_trade(
        backup.id.clone(),
        user_id,
        backup.to_input(),
        backup.created_at,
        backup.updated_at,
    )?;
    if !trades::update_trade(conn, &trade)? {
        trades::insert_trade(conn, &trade)?;
    }
    register_tags(conn, &trade)?;
    Ok(trade)
}

/// Recompute the rollup for one date from the stored trades, dropping it when
/// the date has none left.
pub(crate) fn refresh_rollup(conn: &Connection, user_id: i64, date: NaiveDate) -> Result<()> {
    let day = trades::trades_on_date(conn, user_id, date)?;
    match compute_daily_rollup(user_id, date, &day) {
        Some(rollup) => rollups::upsert_rollup(conn, &rollup),
        None => rollups::delete_rollup(conn, user_id, date),
    }
}

pub(crate) fn refresh_rollups(
    conn: &Connection,
    user_id: i64,
    dates: impl IntoIterator<Item = NaiveDate>,
) -> Result<()> {
    let dates: BTreeSet<NaiveDate> = dates.into_iter().collect();
    for date in dates {
        refresh_rollup(conn, user_id, date)?;
    }
    Ok(())
}

fn load_trade(conn: &Connection, user_id: i64, id: &str) -> Result<Trade> {
    trades::get_trade(conn, user_id, id)?
        .ok_or_else(|| JournalError::NotFound(format!("Trade {}", id)))
}

pub async fn get_trades(
    state: &AppState,
    user_id: i64,
    filters: Option<TradeFilters>,
) -> Result<Vec<Trade>> {
    let conn = state.db.lock()?;
    let offset = settings::get_settings(&conn)?.utc_offset();
    trades::list_trades(
        &conn,
        user_id,
        &filters.unwrap_or_default(),
        super::local_today(offset),
    )
}

pub async fn get_trade(state: &AppState, user_id: i64, id: &str) -> Result<Trade> {
    let conn = state.db.lock()?;
    load_trade(&conn, user_id, id)
}

pub async fn create_trade(
    state: &AppState,
    user_id: i64,
    input: CreateTradeInput,
) -> Result<Trade> {
    let trade = {
        let conn = state.db.lock()?;
        let tx = conn.unchecked_transaction()?;
        let trade = insert_new_trade(&tx, user_id, input)?;
        refresh_rollup(&tx, user_id, trade.trade_date)?;
        tx.commit()?;
        trade
    };

    log::info!(
        "Created trade {} ({} {}, pnl {})",
        trade.id,
        trade.symbol,
        trade.trade_date,
        trade.pnl
    );
    state.invalidate_user(user_id).await;
    Ok(trade)
}

/// Apply a partial edit. Derived fields are recomputed from the merged inputs
/// and the rollups of both the old and the new date are rebuilt.
pub async fn update_trade(
    state: &AppState,
    user_id: i64,
    id: &str,
    update: UpdateTradeInput,
) -> Result<Trade> {
    let trade = {
        let conn = state.db.lock()?;
        let existing = load_trade(&conn, user_id, id)?;

        let mut input = existing.to_input();
        update.apply_to(&mut input);
        let trade = build_trade(
            existing.id.clone(),
            user_id,
            input,
            existing.created_at,
            Utc::now().timestamp(),
        )?;

        let tx = conn.unchecked_transaction()?;
        trades::update_trade(&tx, &trade)?;
        register_tags(&tx, &trade)?;
        refresh_rollups(&tx, user_id, [existing.trade_date, trade.trade_date])?;
        tx.commit()?;
        trade
    };

    log::info!("Updated trade {}", trade.id);
    state.invalidate_user(user_id).await;
    Ok(trade)
}

pub async fn delete_trade(state: &AppState, user_id: i64, id: &str) -> Result<()> {
    {
        let conn = state.db.lock()?;
        let existing = load_trade(&conn, user_id, id)?;

        let tx = conn.unchecked_transaction()?;
        trades::delete_trade(&tx, user_id, id)?;
        refresh_rollup(&tx, user_id, existing.trade_date)?;
        tx.commit()?;
    }

    log::info!("Deleted trade {}", id);
    state.invalidate_user(user_id).await;
    Ok(())
}

pub async fn duplicate_trade(state: &AppState, user_id: i64, id: &str) -> Result<Trade> {
    let trade = {
        let conn = state.db.lock()?;
        let original = load_trade(&conn, user_id, id)?;

        let mut input = original.to_input();
        input.notes = if original.notes.is_empty() {
            "(Copy)".to_string()
        } else {
            format!("{} (Copy)", original.notes)
        };

        let tx = conn.unchecked_transaction()?;
        let trade = insert_new_trade(&tx, user_id, input)?;
        refresh_rollup(&tx, user_id, trade.trade_date)?;
        tx.commit()?;
        trade
    };

    log::info!("Duplicated trade {} as {}", id, trade.id);
    state.invalidate_user(user_id).await;
    Ok(trade)
}

/// Removes every trade and rollup of the user. Returns the number of trades deleted.
pub async fn delete_all_trades(state: &AppState, user_id: i64) -> Result<usize> {
    let count = {
        let conn = state.db.lock()?;
        let tx = conn.unchecked_transaction()?;
        let count = trades::delete_all_trades(&tx, user_id)?;
        rollups::delete_rollups_for_user(&tx, user_id)?;
        tx.commit()?;
        count
    };

    log::info!("Deleted all {} trades for user {}", count, user_id);
    state.invalidate_user(user_id).await;
    Ok(count)
}

pub(crate) fn rebuild_rollups(conn: &Connection, user_id: i64) -> Result<usize> {
    let all = trades::all_trades(conn, user_id)?;
    let rebuilt = compute_daily_rollups(user_id, &all);

    rollups::delete_rollups_for_user(conn, user_id)?;
    for rollup in &rebuilt {
        rollups::upsert_rollup(conn, rollup)?;
    }
    Ok(rebuilt.len())
}

/// Rebuild every daily rollup of the user from the stored trades.
pub async fn recompute_all_rollups(state: &AppState, user_id: i64) -> Result<usize> {
    let count = {
        let conn = state.db.lock()?;
        let tx = conn.unchecked_transaction()?;
        let count = rebuild_rollups(&tx, user_id)?;
        tx.commit()?;
        count
    };

    log::info!("Recomputed {} daily rollups for user {}", count, user_id);
    state.invalidate_user(user_id).await;
    Ok(count)
}
