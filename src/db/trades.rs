use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::Result;
use crate::models::{BreakoutType, DateWindow, NiftyRange, OptionType, TagSet, Trade, TradeFilters};

sql_text_enum!(OptionType, BreakoutType, NiftyRange);

impl ToSql for TagSet {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_storage()))
    }
}

impl FromSql for TagSet {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(TagSet::parse(value.as_str()?))
    }
}

const TRADE_COLUMNS: &str = "id, user_id, symbol, option_type, breakout_type, nifty_range,
    entry_price, exit_price, stop_loss, quantity, trade_date, entry_time, exit_time,
    followed_plan, mistakes, entry_emotion, exit_emotion, notes,
    pnl, return_pct, risk_amount, r_multiple, created_at, updated_at";

fn map_row_to_trade(row: &Row) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        symbol: row.get("symbol")?,
        option_type: row.get("option_type")?,
        breakout_type: row.get("breakout_type")?,
        nifty_range: row.get("nifty_range")?,
        entry_price: row.get("entry_price")?,
        exit_price: row.get("exit_price")?,
        stop_loss: row.get("stop_loss")?,
        quantity: row.get("quantity")?,
        trade_date: row.get("trade_date")?,
        entry_time: row.get("entry_time")?,
        exit_time: row.get("exit_time")?,
        followed_plan: row.get("followed_plan")?,
        mistakes: row.get("mistakes")?,
        entry_emotion: row.get("entry_emotion")?,
        exit_emotion: row.get("exit_emotion")?,
        notes: row.get("notes")?,
        pnl: row.get("pnl")?,
        return_pct: row.get("return_pct")?,
        risk_amount: row.get("risk_amount")?,
        r_multiple: row.get("r_multiple")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn query_trades(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Trade>> {
    let mut stmt = conn.prepare(sql)?;
    let trades = stmt
        .query_map(params, map_row_to_trade)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(trades)
}

pub fn insert_trade(conn: &Connection, trade: &Trade) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO trades ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            TRADE_COLUMNS
        ),
        params![
            trade.id,
            trade.user_id,
            trade.symbol,
            trade.option_type,
            trade.breakout_type,
            trade.nifty_range,
            trade.entry_price,
            trade.exit_price,
            trade.stop_loss,
            trade.quantity,
            trade.trade_date,
            trade.entry_time,
            trade.exit_time,
            trade.followed_plan,
            trade.mistakes,
            trade.entry_emotion,
            trade.exit_emotion,
            trade.notes,
            trade.pnl,
            trade.return_pct,
            trade.risk_amount,
            trade.r_multiple,
            trade.created_at,
            trade.updated_at,
        ],
    )?;
    Ok(())
}

/// Overwrites every mutable column of an existing trade. Returns false if no row matched.
pub fn update_trade(conn: &Connection, trade: &Trade) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE trades SET
            symbol = ?, option_type = ?, breakout_type = ?, nifty_range = ?,
            entry_price = ?, exit_price = ?, stop_loss = ?, quantity = ?,
            trade_date = ?, entry_time = ?, exit_time = ?,
            followed_plan = ?, mistakes = ?, entry_emotion = ?, exit_emotion = ?, notes = ?,
            pnl = ?, return_pct = ?, risk_amount = ?, r_multiple = ?, updated_at = ?
         WHERE id = ? AND user_id = ?",
        params![
            trade.symbol,
            trade.option_type,
            trade.breakout_type,
            trade.nifty_range,
            trade.entry_price,
            trade.exit_price,
            trade.stop_loss,
            trade.quantity,
            trade.trade_date,
            trade.entry_time,
            trade.exit_time,
            trade.followed_plan,
            trade.mistakes,
            trade.entry_emotion,
            trade.exit_emotion,
            trade.notes,
            trade.pnl,
            trade.return_pct,
            trade.risk_amount,
            trade.r_multiple,
            trade.updated_at,
            trade.id,
            trade.user_id,
        ],
    )?;
    Ok(changed > 0)
}

pub fn get_trade(conn: &Connection, user_id: i64, id: &str) -> Result<Option<Trade>> {
    let trade = conn
        .query_row(
            &format!("SELECT {} FROM trades WHERE id = ? AND user_id = ?", TRADE_COLUMNS),
            params![id, user_id],
            map_row_to_trade,
        )
        .optional()?;
    Ok(trade)
}

/// Filtered, newest-first listing with optional pagination (`page` is 1-based).
pub fn list_trades(
    conn: &Connection,
    user_id: i64,
    filters: &TradeFilters,
    today: NaiveDate,
) -> Result<Vec<Trade>> {
    let mut query = format!("SELECT {} FROM trades WHERE user_id = ?", TRADE_COLUMNS);
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(user_id)];

    if let Some(symbol) = filters.symbol.as_deref().filter(|s| !s.trim().is_empty()) {
        conditions.push("symbol LIKE ?");
        params.push(Box::new(format!("%{}%", symbol.trim())));
    }
    if let Some(option_type) = filters.option_type {
        conditions.push("option_type = ?");
        params.push(Box::new(option_type));
    }
    if let Some(breakout_type) = filters.breakout_type {
        conditions.push("breakout_type = ?");
        params.push(Box::new(breakout_type));
    }
    if let Some(window) = &filters.window {
        let (start, end) = window.bounds(today);
        if let Some(start) = start {
            conditions.push("trade_date >= ?");
            params.push(Box::new(start));
        }
        if let Some(end) = end {
            conditions.push("trade_date <= ?");
            params.push(Box::new(end));
        }
    }

    if !conditions.is_empty() {
        query.push_str(&format!(" AND {}", conditions.join(" AND ")));
    }

    query.push_str(" ORDER BY trade_date DESC, created_at DESC");

    if let Some(limit) = filters.limit {
        let page = filters.page.unwrap_or(1).max(1);
        let offset = i64::from(page - 1).saturating_mul(i64::from(limit));
        query.push_str(" LIMIT ? OFFSET ?");
        params.push(Box::new(limit));
        params.push(Box::new(offset));
    }

    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    query_trades(conn, &query, &param_refs)
}

/// Oldest-first trades inside the window.
pub fn trades_in_window(
    conn: &Connection,
    user_id: i64,
    window: &DateWindow,
    today: NaiveDate,
) -> Result<Vec<Trade>> {
    let (start, end) = window.bounds(today);
    query_trades(
        conn,
        &format!(
            "SELECT {} FROM trades
             WHERE user_id = ?1
               AND (?2 IS NULL OR trade_date >= ?2)
               AND (?3 IS NULL OR trade_date <= ?3)
             ORDER BY trade_date ASC, created_at ASC",
            TRADE_COLUMNS
        ),
        params![user_id, start, end],
    )
}

pub fn trades_on_date(conn: &Connection, user_id: i64, date: NaiveDate) -> Result<Vec<Trade>> {
    query_trades(
        conn,
        &format!(
            "SELECT {} FROM trades WHERE user_id = ? AND trade_date = ? ORDER BY created_at ASC",
            TRADE_COLUMNS
        ),
        params![user_id, date],
    )
}

/// The `limit` most recent trades, newest first.
pub fn recent_trades(conn: &Connection, user_id: i64, limit: u32) -> Result<Vec<Trade>> {
    query_trades(
        conn,
        &format!(
            "SELECT {} FROM trades WHERE user_id = ?
             ORDER BY trade_date DESC, created_at DESC LIMIT ?",
            TRADE_COLUMNS
        ),
        params![user_id, limit],
    )
}

pub fn all_trades(conn: &Connection, user_id: i64) -> Result<Vec<Trade>> {
    trades_in_window(conn, user_id, &DateWindow::All, NaiveDate::MIN)
}

pub fn delete_trade(conn: &Connection, user_id: i64, id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM trades WHERE id = ? AND user_id = ?",
        params![id, user_id],
    )?;
    Ok(deleted > 0)
}

pub fn delete_all_trades(conn: &Connection, user_id: i64) -> Result<usize> {
    Ok(conn.execute("DELETE FROM trades WHERE user_id = ?", [user_id])?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use rusqlite::Connection;

    use crate::db::Database;

    /// In-memory database with one user; returns the user id.
    pub(crate) fn database_with_user(username: &str) -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let user_id = insert_user(&db.lock().unwrap(), username);
        (db, user_id)
    }

    pub(crate) fn insert_user(conn: &Connection, username: &str) -> i64 {
        conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, 'x', 0)",
            [username],
        )
        .unwrap();
        conn.last_insert_rowid()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{database_with_user, insert_user};
    use super::*;
    use crate::metrics::fixtures::trade;
    use chrono::NaiveTime;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_insert_and_read_back() {
        let (db, user_id) = database_with_user("asha");
        let conn = db.lock().unwrap();

        let mut original = trade("2024-03-04", 12.5)
            .id("TRADE-1")
            .r(1.25)
            .mistakes("Early Exit, fomo")
            .emotions("calm", "")
            .breakout(BreakoutType::Vertical)
            .range(NiftyRange::OutsideBullish)
            .build();
        original.user_id = user_id;
        original.stop_loss = Some(90.0);
        original.entry_time = NaiveTime::from_hms_opt(9, 20, 0);
        insert_trade(&conn, &original).unwrap();

        let stored = get_trade(&conn, user_id, "TRADE-1").unwrap().unwrap();
        assert_eq!(stored.option_type, OptionType::Call);
        assert_eq!(stored.breakout_type, Some(BreakoutType::Vertical));
        assert_eq!(stored.nifty_range, Some(NiftyRange::OutsideBullish));
        assert_eq!(stored.mistakes, TagSet::parse("early exit,fomo"));
        assert!(stored.exit_emotion.is_empty());
        assert_eq!(stored.stop_loss, Some(90.0));
        assert_eq!(stored.entry_time, NaiveTime::from_hms_opt(9, 20, 0));
        assert_eq!(stored.trade_date, day(4));
        assert_eq!(stored.r_multiple, Some(1.25));
        assert!(stored.followed_plan);
    }

    #[test]
    fn test_trades_are_scoped_to_user() {
        let (db, user_id) = database_with_user("asha");
        let conn = db.lock().unwrap();
        let other = insert_user(&conn, "ravi");

        let mut mine = trade("2024-03-04", 5.0).id("MINE").build();
        mine.user_id = user_id;
        insert_trade(&conn, &mine).unwrap();

        assert!(get_trade(&conn, other, "MINE").unwrap().is_none());
        assert!(!delete_trade(&conn, other, "MINE").unwrap());
        assert!(all_trades(&conn, other).unwrap().is_empty());
        assert_eq!(all_trades(&conn, user_id).unwrap().len(), 1);
    }

    #[test]
    fn test_list_filters_and_pagination() {
        let (db, user_id) = database_with_user("asha");
        let conn = db.lock().unwrap();

        for d in 1..=6 {
            let mut t = trade(&format!("2024-03-{:02}", d), d as f64).id(&format!("T{}", d)).build();
            t.user_id = user_id;
            if d % 2 == 0 {
                t.breakout_type = Some(BreakoutType::Horizontal);
                t.symbol = "BANKNIFTY 48000 PE".to_string();
                t.option_type = OptionType::Put;
            }
            insert_trade(&conn, &t).unwrap();
        }

        let today = day(6);
        let all = list_trades(&conn, user_id, &TradeFilters::default(), today).unwrap();
        let ids: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["T6", "T5", "T4", "T3", "T2", "T1"]);

        let puts = TradeFilters {
            option_type: Some(OptionType::Put),
            ..Default::default()
        };
        assert_eq!(list_trades(&conn, user_id, &puts, today).unwrap().len(), 3);

        let bank = TradeFilters {
            symbol: Some("banknifty".to_string()),
            breakout_type: Some(BreakoutType::Horizontal),
            ..Default::default()
        };
        assert_eq!(list_trades(&conn, user_id, &bank, today).unwrap().len(), 3);

        let recent = TradeFilters {
            window: Some(DateWindow::LastDays { days: 2 }),
            ..Default::default()
        };
        assert_eq!(list_trades(&conn, user_id, &recent, today).unwrap().len(), 2);

        let page_two = TradeFilters {
            page: Some(2),
            limit: Some(4),
            ..Default::default()
        };
        let ids: Vec<String> = list_trades(&conn, user_id, &page_two, today)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["T2", "T1"]);

        let far_page = TradeFilters {
            page: Some(u32::MAX),
            limit: Some(u32::MAX),
            ..Default::default()
        };
        assert!(list_trades(&conn, user_id, &far_page, today).unwrap().is_empty());
    }

    #[test]
    fn test_window_and_recent_ordering() {
        let (db, user_id) = database_with_user("asha");
        let conn = db.lock().unwrap();

        for (id, date) in [("A", "2024-03-02"), ("B", "2024-03-01"), ("C", "2024-03-02")] {
            let mut t = trade(date, 1.0).id(id).build();
            t.user_id = user_id;
            insert_trade(&conn, &t).unwrap();
        }

        let oldest_first: Vec<String> = all_trades(&conn, user_id)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(oldest_first, vec!["B", "A", "C"]);

        let newest: Vec<String> = recent_trades(&conn, user_id, 2)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(newest, vec!["C", "A"]);

        assert_eq!(trades_on_date(&conn, user_id, day(2)).unwrap().len(), 2);

        let window = DateWindow::Between {
            start: day(1),
            end: day(1),
        };
        assert_eq!(trades_in_window(&conn, user_id, &window, day(9)).unwrap().len(), 1);
    }

    #[test]
    fn test_update_and_delete() {
        let (db, user_id) = database_with_user("asha");
        let conn = db.lock().unwrap();

        let mut t = trade("2024-03-04", 5.0).id("T").build();
        t.user_id = user_id;
        insert_trade(&conn, &t).unwrap();

        t.notes = "held too long".to_string();
        t.stop_loss = None;
        t.trade_date = day(5);
        assert!(update_trade(&conn, &t).unwrap());

        let stored = get_trade(&conn, user_id, "T").unwrap().unwrap();
        assert_eq!(stored.notes, "held too long");
        assert_eq!(stored.trade_date, day(5));

        assert!(delete_trade(&conn, user_id, "T").unwrap());
        assert!(get_trade(&conn, user_id, "T").unwrap().is_none());
        assert_eq!(delete_all_trades(&conn, user_id).unwrap(), 0);
    }
}
