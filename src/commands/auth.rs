use chrono::Utc;

use crate::auth::{generate_token, hash_password, hash_token, verify_password, SESSION_LIFETIME_SECS};
use crate::db::users;
use crate::error::{JournalError, Result};
use crate::models::{Session, User};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 8;

pub async fn register(state: &AppState, username: &str, password: &str) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(JournalError::validation("username", "must not be empty"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(JournalError::validation(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }

    let password_hash = hash_password(password)?;
    let conn = state.db.lock()?;
    if users::find_user_by_username(&conn, username)?.is_some() {
        return Err(JournalError::validation("username", "is already taken"));
    }
    let user = users::insert_user(&conn, username, &password_hash, Utc::now().timestamp())?;

    log::info!("Registered user {} ({})", user.username, user.id);
    Ok(user)
}

/// Verify credentials and open a session. The returned token is not stored.
pub async fn login(state: &AppState, username: &str, password: &str) -> Result<Session> {
    let conn = state.db.lock()?;
    let (user, stored_hash) = users::find_user_by_username(&conn, username.trim())?
        .ok_or_else(|| JournalError::Authentication("invalid username or password".to_string()))?;

    if !verify_password(password, &stored_hash) {
        log::warn!("Failed login for {}", user.username);
        return Err(JournalError::Authentication(
            "invalid username or password".to_string(),
        ));
    }

    let now = Utc::now().timestamp();
    let purged = users::purge_expired_sessions(&conn, now)?;
    if purged > 0 {
        log::debug!("Purged {} expired sessions", purged);
    }

    let token = generate_token();
    let expires_at = now + SESSION_LIFETIME_SECS;
    users::insert_session(&conn, &hash_token(&token), user.id, now, expires_at)?;

    log::info!("User {} logged in", user.username);
    Ok(Session {
        user_id: user.id,
        token,
        expires_at,
    })
}

/// Resolve a bearer token to its user.
pub async fn authenticate(state: &AppState, token: &str) -> Result<User> {
    let conn = state.db.lock()?;
    let user_id = users::find_session_user(&conn, &hash_token(token), Utc::now().timestamp())?
        .ok_or_else(|| JournalError::Authentication("session expired or unknown".to_string()))?;
    users::get_user(&conn, user_id)?
        .ok_or_else(|| JournalError::Authentication("session expired or unknown".to_string()))
}

pub async fn logout(state: &AppState, token: &str) -> Result<()> {
    let conn = state.db.lock()?;
    users::delete_session(&conn, &hash_token(token))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::init_logging;

    #[tokio::test]
    async fn test_register_login_authenticate_logout() {
        init_logging();
        let state = AppState::in_memory().unwrap();

        let user = register(&state, "trader", "correct horse").await.unwrap();
        let session = login(&state, "trader", "correct horse").await.unwrap();
        assert_eq!(session.user_id, user.id);
        assert!(session.expires_at > Utc::now().timestamp());

        let authed = authenticate(&state, &session.token).await.unwrap();
        assert_eq!(authed.username, "trader");

        logout(&state, &session.token).await.unwrap();
        assert!(matches!(
            authenticate(&state, &session.token).await,
            Err(JournalError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_bad_credentials() {
        init_logging();
        let state = AppState::in_memory().unwrap();
        register(&state, "trader", "correct horse").await.unwrap();

        assert!(register(&state, "trader", "another pass").await.is_err());
        assert!(register(&state, "short", "abc").await.is_err());
        assert!(matches!(
            login(&state, "trader", "wrong horse").await,
            Err(JournalError::Authentication(_))
        ));
        assert!(login(&state, "nobody", "correct horse").await.is_err());
        assert!(authenticate(&state, "made-up-token").await.is_err());
    }
}
