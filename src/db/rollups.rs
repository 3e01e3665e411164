use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, Row};

use crate::error::Result;
use crate::models::{DailyMetricsRollup, DateWindow};

fn map_row_to_rollup(row: &Row) -> rusqlite::Result<DailyMetricsRollup> {
    Ok(DailyMetricsRollup {
        user_id: row.get("user_id")?,
        date: row.get("date")?,
        total_trades: row.get("total_trades")?,
        winning_trades: row.get("winning_trades")?,
        losing_trades: row.get("losing_trades")?,
        total_pnl: row.get("total_pnl")?,
        win_rate: row.get("win_rate")?,
        avg_r_multiple: row.get("avg_r_multiple")?,
        plan_adherence_rate: row.get("plan_adherence_rate")?,
        mistake_frequency_rate: row.get("mistake_frequency_rate")?,
    })
}

/// Insert or replace the rollup for `(user_id, date)`.
pub fn upsert_rollup(conn: &Connection, rollup: &DailyMetricsRollup) -> Result<()> {
    conn.execute(
        "INSERT INTO daily_metrics (
            user_id, date, total_trades, winning_trades, losing_trades, total_pnl,
            win_rate, avg_r_multiple, plan_adherence_rate, mistake_frequency_rate, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(user_id, date) DO UPDATE SET
            total_trades = excluded.total_trades,
            winning_trades = excluded.winning_trades,
            losing_trades = excluded.losing_trades,
            total_pnl = excluded.total_pnl,
            win_rate = excluded.win_rate,
            avg_r_multiple = excluded.avg_r_multiple,
            plan_adherence_rate = excluded.plan_adherence_rate,
            mistake_frequency_rate = excluded.mistake_frequency_rate,
            updated_at = excluded.updated_at",
        params![
            rollup.user_id,
            rollup.date,
            rollup.total_trades,
            rollup.winning_trades,
            rollup.losing_trades,
            rollup.total_pnl,
            rollup.win_rate,
            rollup.avg_r_multiple,
            rollup.plan_adherence_rate,
            rollup.mistake_frequency_rate,
            Utc::now().timestamp(),
        ],
    )?;
    Ok(())
}

pub fn delete_rollup(conn: &Connection, user_id: i64, date: NaiveDate) -> Result<()> {
    conn.execute(
        "DELETE FROM daily_metrics WHERE user_id = ? AND date = ?",
        params![user_id, date],
    )?;
    Ok(())
}

pub fn delete_rollups_for_user(conn: &Connection, user_id: i64) -> Result<usize> {
    Ok(conn.execute("DELETE FROM daily_metrics WHERE user_id = ?", [user_id])?)
}

/// Rollups inside the window, oldest date first.
pub fn rollups_in_window(
    conn: &Connection,
    user_id: i64,
    window: &DateWindow,
    today: NaiveDate,
) -> Result<Vec<DailyMetricsRollup>> {
    let (start, end) = window.bounds(today);
    let mut stmt = conn.prepare(
        "SELECT user_id, date, total_trades, winning_trades, losing_trades, total_pnl,
                win_rate, avg_r_multiple, plan_adherence_rate, mistake_frequency_rate
         FROM daily_metrics
         WHERE user_id = ?1
           AND (?2 IS NULL OR date >= ?2)
           AND (?3 IS NULL OR date <= ?3)
         ORDER BY date ASC",
    )?;
    let rollups = stmt
        .query_map(params![user_id, start, end], map_row_to_rollup)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rollups)
}
