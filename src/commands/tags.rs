use crate::db::tags;
use crate::error::Result;
use crate::models::{EmotionTag, MistakeTag};
use crate::AppState;

pub async fn list_mistake_tags(state: &AppState) -> Result<Vec<MistakeTag>> {
    let conn = state.db.lock()?;
    tags::list_mistake_tags(&conn)
}

pub async fn list_emotion_tags(state: &AppState, user_id: i64) -> Result<Vec<EmotionTag>> {
    let conn = state.db.lock()?;
    tags::list_emotion_tags(&conn, user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::create_trade;
    use crate::commands::test_support::{input, state_with_user};
    use crate::models::TagSet;

    #[tokio::test]
    async fn test_trade_labels_become_tags() {
        let (state, user_id) = state_with_user();
        let mut new = input("2024-03-04", 100.0, 104.0);
        new.mistakes = TagSet::parse("Skipped Checklist");
        new.entry_emotion = TagSet::parse("anxious");
        new.exit_emotion = TagSet::parse("calm, anxious");
        create_trade(&state, user_id, new).await.unwrap();

        let mistakes = list_mistake_tags(&state).await.unwrap();
        assert!(
            mistakes
                .iter()
                .any(|t| t.name == "skipped checklist" && t.category == "custom")
        );

        let emotions = list_emotion_tags(&state, user_id).await.unwrap();
        assert_eq!(emotions[0].name, "anxious");
        assert_eq!(emotions[0].usage_count, 2);
        assert_eq!(emotions[1].name, "calm");
    }
}
