#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Bcrypt hash. The plaintext is never persisted.
    pub password_hash: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub user_id: String,
    pub text: String,
    pub created_at: String,
}

/// A message joined with its author, as the pages render it.
#[derive(Debug, Clone)]
pub struct MessageWithAuthor {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub text: String,
    pub created_at: String,
}
