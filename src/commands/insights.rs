use crate::db::{insights, settings, trades};
use crate::error::Result;
use crate::metrics::generate_insights as run_heuristics;
use crate::models::Insight;
use crate::AppState;

/// Regenerate the user's insights from their most recent trades and replace
/// the stored set. A user with no trades ends up with no insights.
pub async fn generate_insights(state: &AppState, user_id: i64) -> Result<Vec<Insight>> {
    let conn = state.db.lock()?;
    let settings = settings::get_settings(&conn)?;

    let recent = trades::recent_trades(&conn, user_id, settings.insight_window)?;
    let generated = run_heuristics(&recent, settings.utc_offset());
    insights::replace_insights(&conn, user_id, &generated)?;

    log::info!(
        "Generated {} insights for user {} from {} trades",
        generated.len(),
        user_id,
        recent.len()
    );
    Ok(generated)
}

pub async fn get_insights(state: &AppState, user_id: i64) -> Result<Vec<Insight>> {
    let conn = state.db.lock()?;
    insights::list_insights(&conn, user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{input, state_with_user};
    use crate::commands::{create_trade, delete_all_trades};
    use crate::models::{InsightType, Severity};

    #[tokio::test]
    async fn test_plan_violations_surface_and_persist() {
        let (state, user_id) = state_with_user();
        for day in 1..=3 {
            let mut new = input(&format!("2024-03-0{}", day), 100.0, 105.0);
            new.followed_plan = day == 1;
            create_trade(&state, user_id, new).await.unwrap();
        }

        let generated = generate_insights(&state, user_id).await.unwrap();
        let violation = generated
            .iter()
            .find(|i| i.insight_type == InsightType::PlanViolation)
            .unwrap();
        assert_eq!(violation.severity, Severity::Warning);
        assert!(violation.message.contains("2 of your last 3"));

        assert_eq!(get_insights(&state, user_id).await.unwrap(), generated);
    }

    #[tokio::test]
    async fn test_no_trades_clears_stale_insights() {
        let (state, user_id) = state_with_user();
        for day in 1..=3 {
            let mut new = input(&format!("2024-03-0{}", day), 100.0, 95.0);
            new.followed_plan = false;
            create_trade(&state, user_id, new).await.unwrap();
        }
        assert!(!generate_insights(&state, user_id).await.unwrap().is_empty());

        delete_all_trades(&state, user_id).await.unwrap();
        assert!(generate_insights(&state, user_id).await.unwrap().is_empty());
        assert!(get_insights(&state, user_id).await.unwrap().is_empty());
    }
}
