use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::User;

pub fn insert_user(conn: &Connection, username: &str, password_hash: &str, created_at: i64) -> Result<User> {
    conn.execute(
        "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)",
        params![username, password_hash, created_at],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        created_at,
    })
}

/// The user and their stored password hash.
pub fn find_user_by_username(conn: &Connection, username: &str) -> Result<Option<(User, String)>> {
    let found = conn
        .query_row(
            "SELECT id, username, created_at, password_hash FROM users WHERE username = ?",
            [username],
            |row| {
                Ok((
                    User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        created_at: row.get(2)?,
                    },
                    row.get(3)?,
                ))
            },
        )
        .optional()?;
    Ok(found)
}

pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, created_at FROM users WHERE id = ?",
            [user_id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

pub fn insert_session(
    conn: &Connection,
    token_hash: &str,
    user_id: i64,
    created_at: i64,
    expires_at: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        params![token_hash, user_id, created_at, expires_at],
    )?;
    Ok(())
}

/// User id owning an unexpired session.
pub fn find_session_user(conn: &Connection, token_hash: &str, now: i64) -> Result<Option<i64>> {
    let user_id = conn
        .query_row(
            "SELECT user_id FROM sessions WHERE token_hash = ? AND expires_at > ?",
            params![token_hash, now],
            |row| row.get(0),
        )
        .optional()?;
    Ok(user_id)
}

pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<bool> {
    Ok(conn.execute("DELETE FROM sessions WHERE token_hash = ?", [token_hash])? > 0)
}

pub fn purge_expired_sessions(conn: &Connection, now: i64) -> Result<usize> {
    Ok(conn.execute("DELETE FROM sessions WHERE expires_at <= ?", [now])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_user_lookup() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock().unwrap();

        let user = insert_user(&conn, "asha", "hash", 100).unwrap();
        let (found, hash) = find_user_by_username(&conn, "asha").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(hash, "hash");
        assert!(find_user_by_username(&conn, "ravi").unwrap().is_none());
        assert_eq!(get_user(&conn, user.id).unwrap().unwrap().username, "asha");

        assert!(insert_user(&conn, "asha", "other", 101).is_err());
    }

    #[test]
    fn test_session_expiry() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock().unwrap();
        let user = insert_user(&conn, "asha", "hash", 0).unwrap();

        insert_session(&conn, "live", user.id, 0, 1_000).unwrap();
        insert_session(&conn, "stale", user.id, 0, 10).unwrap();

        assert_eq!(find_session_user(&conn, "live", 500).unwrap(), Some(user.id));
        assert_eq!(find_session_user(&conn, "stale", 500).unwrap(), None);

        assert_eq!(purge_expired_sessions(&conn, 500).unwrap(), 1);
        assert!(delete_session(&conn, "live").unwrap());
        assert_eq!(find_session_user(&conn, "live", 500).unwrap(), None);
    }
}
