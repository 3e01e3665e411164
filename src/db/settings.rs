use rusqlite::{Connection, ToSql};

use crate::error::Result;
use crate::models::{Settings, UpdateSettingsInput};

pub fn get_settings(conn: &Connection) -> Result<Settings> {
    let settings = conn.query_row(
        "SELECT id, currency, utc_offset_minutes, insight_window, cache_ttl_seconds, created_at, updated_at
         FROM settings WHERE id = 1",
        [],
        |row| {
            Ok(Settings {
                id: row.get(0)?,
                currency: row.get(1)?,
                utc_offset_minutes: row.get(2)?,
                insight_window: row.get(3)?,
                cache_ttl_seconds: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
            })
        },
    )?;
    Ok(settings)
}

/// Writes only the fields present in `input`.
pub fn update_settings(conn: &Connection, input: &UpdateSettingsInput) -> Result<Settings> {
    let mut updates = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(val) = &input.currency {
        updates.push("currency = ?");
        values.push(Box::new(val.clone()));
    }
    if let Some(val) = input.utc_offset_minutes {
        updates.push("utc_offset_minutes = ?");
        values.push(Box::new(val));
    }
    if let Some(val) = input.insight_window {
        updates.push("insight_window = ?");
        values.push(Box::new(val));
    }
    if let Some(val) = input.cache_ttl_seconds {
        updates.push("cache_ttl_seconds = ?");
        values.push(Box::new(val));
    }

    updates.push("updated_at = strftime('%s', 'now')");

    let query = format!("UPDATE settings SET {} WHERE id = 1", updates.join(", "));
    let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
    conn.execute(&query, params.as_slice())?;

    get_settings(conn)
}
