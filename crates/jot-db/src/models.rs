/// Database row types — these map directly to SQLite rows.
/// Distinct from jot-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

pub struct NoteRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub favorite: bool,
    pub image: Option<String>,
    pub created_at: String,
}

/// Fields of a note that a partial update may touch. `None` leaves the stored
/// value alone.
#[derive(Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub favorite: Option<bool>,
    pub image: Option<String>,
}
