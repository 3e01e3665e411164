use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::{emotion_category, EmotionTag, MistakeTag, TagSet};

/// Adds any labels not already in the shared mistake catalogue as `custom`.
pub fn register_mistakes(conn: &Connection, mistakes: &TagSet) -> Result<()> {
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO mistake_tags (name, category) VALUES (?, 'custom')")?;
    for name in mistakes.iter() {
        stmt.execute([name])?;
    }
    Ok(())
}

/// Bumps the per-user usage count of every emotion label in `emotions`.
pub fn register_emotions<'a>(
    conn: &Connection,
    user_id: i64,
    emotions: impl IntoIterator<Item = &'a TagSet>,
) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO emotion_tags (user_id, name, category, usage_count) VALUES (?, ?, ?, 1)
         ON CONFLICT(user_id, name) DO UPDATE SET usage_count = usage_count + 1",
    )?;
    for set in emotions {
        for name in set.iter() {
            stmt.execute(params![user_id, name, emotion_category(name)])?;
        }
    }
    Ok(())
}

pub fn list_mistake_tags(conn: &Connection) -> Result<Vec<MistakeTag>> {
    let mut stmt = conn.prepare("SELECT id, name, category FROM mistake_tags ORDER BY category, name")?;
    let tags = stmt
        .query_map([], |row| {
            Ok(MistakeTag {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tags)
}

/// Most used first.
pub fn list_emotion_tags(conn: &Connection, user_id: i64) -> Result<Vec<EmotionTag>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, category, usage_count FROM emotion_tags
         WHERE user_id = ? ORDER BY usage_count DESC, name ASC",
    )?;
    let tags = stmt
        .query_map([user_id], |row| {
            Ok(EmotionTag {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                category: row.get(3)?,
                usage_count: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::trades::test_support::{database_with_user, insert_user};

    #[test]
    fn test_register_mistakes_keeps_catalogue_unique() {
        let (db, _) = database_with_user("asha");
        let conn = db.lock().unwrap();
        let seeded = list_mistake_tags(&conn).unwrap().len();

        register_mistakes(&conn, &TagSet::parse("fomo, sized up after loss")).unwrap();
        register_mistakes(&conn, &TagSet::parse("sized up after loss")).unwrap();

        let tags = list_mistake_tags(&conn).unwrap();
        assert_eq!(tags.len(), seeded + 1);
        let custom = tags.iter().find(|t| t.name == "sized up after loss").unwrap();
        assert_eq!(custom.category, "custom");
        let fomo = tags.iter().find(|t| t.name == "fomo").unwrap();
        assert_eq!(fomo.category, "psychology");
    }

    #[test]
    fn test_emotion_usage_counts_per_user() {
        let (db, user_id) = database_with_user("asha");
        let conn = db.lock().unwrap();
        let other = insert_user(&conn, "ravi");

        let entry = TagSet::parse("calm");
        let exit = TagSet::parse("greedy, calm");
        register_emotions(&conn, user_id, [&entry, &exit]).unwrap();
        register_emotions(&conn, other, [&entry]).unwrap();

        let tags = list_emotion_tags(&conn, user_id).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "calm");
        assert_eq!(tags[0].usage_count, 2);
        assert_eq!(tags[0].category, "positive");
        assert_eq!(tags[1].category, "negative");

        assert_eq!(list_emotion_tags(&conn, other).unwrap()[0].usage_count, 1);
    }
}
