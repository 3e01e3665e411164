use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::{Insight, InsightType, Severity};

sql_text_enum!(InsightType, Severity);

/// Clear the user's stored insights and store `insights` in their place.
pub fn replace_insights(conn: &Connection, user_id: i64, insights: &[Insight]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM insights WHERE user_id = ?", [user_id])?;

    let now = Utc::now().timestamp();
    {
        let mut stmt = tx.prepare(
            "INSERT INTO insights (user_id, insight_type, message, severity, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )?;
        for insight in insights {
            stmt.execute(params![
                user_id,
                insight.insight_type,
                insight.message,
                insight.severity,
                now
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Stored insights in generation order.
pub fn list_insights(conn: &Connection, user_id: i64) -> Result<Vec<Insight>> {
    let mut stmt = conn.prepare(
        "SELECT insight_type, message, severity FROM insights WHERE user_id = ? ORDER BY id ASC",
    )?;
    let insights = stmt
        .query_map([user_id], |row| {
            Ok(Insight {
                insight_type: row.get(0)?,
                message: row.get(1)?,
                severity: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(insights)
}
