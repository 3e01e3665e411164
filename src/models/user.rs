use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: i64,
}

/// Issued on login. `token` is only ever handed to the client; storage keeps its hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
    pub token: String,
    pub expires_at: i64,
}
