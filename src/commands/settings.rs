use crate::db::settings;
use crate::error::{JournalError, Result};
use crate::metrics::insights::INSIGHT_WINDOW;
use crate::models::{Settings, UpdateSettingsInput};
use crate::AppState;

const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

pub(crate) fn validate(input: &UpdateSettingsInput) -> Result<()> {
    if let Some(currency) = &input.currency {
        if currency.trim().is_empty() {
            return Err(JournalError::validation("currency", "must not be empty"));
        }
    }
    if let Some(offset) = input.utc_offset_minutes {
        if offset.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(JournalError::validation(
                "utc_offset_minutes",
                format!("must be within ±{} minutes", MAX_UTC_OFFSET_MINUTES),
            ));
        }
    }
    if let Some(window) = input.insight_window {
        if window == 0 || window as usize > INSIGHT_WINDOW {
            return Err(JournalError::validation(
                "insight_window",
                format!("must be between 1 and {}", INSIGHT_WINDOW),
            ));
        }
    }
    Ok(())
}

pub async fn get_settings(state: &AppState) -> Result<Settings> {
    let conn = state.db.lock()?;
    settings::get_settings(&conn)
}

pub async fn update_settings(state: &AppState, input: UpdateSettingsInput) -> Result<Settings> {
    validate(&input)?;

    let updated = {
        let conn = state.db.lock()?;
        settings::update_settings(&conn, &input)?
    };

    apply_to_caches(state, &input, &updated).await;

    log::info!("Settings updated");
    Ok(updated)
}

/// Bring the report caches in line with committed settings.
pub(crate) async fn apply_to_caches(
    state: &AppState,
    input: &UpdateSettingsInput,
    updated: &Settings,
) {
    if input.cache_ttl_seconds.is_some() {
        state.set_cache_ttl(updated.cache_ttl_seconds).await;
    }
    // Offset changes move "today" and the time-of-day buckets.
    if input.utc_offset_minutes.is_some() {
        state.summaries.clear().await;
        state.dashboards.clear().await;
    }
}
