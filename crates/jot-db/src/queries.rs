use crate::Database;
use crate::models::{NotePatch, NoteRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password_hash) VALUES (?1, ?2, ?3, ?4)",
                (id, username, email, password_hash),
            )?;
            Ok(())
        })
    }

    /// Exact-match lookup — emails are compared byte-for-byte, no
    /// normalization.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Notes --
    //
    // Every query below filters on owner_id. Ownership is part of the
    // predicate, not a check bolted on afterwards, so a note belonging to
    // someone else is indistinguishable from one that does not exist.

    pub fn insert_note(&self, note: &NoteRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notes (id, owner_id, title, content, favorite, image, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    note.id,
                    note.owner_id,
                    note.title,
                    note.content,
                    note.favorite,
                    note.image,
                    note.created_at
                ],
            )?;
            Ok(())
        })
    }

    /// All notes for one owner, oldest first. Rowid breaks creation-time ties
    /// so same-instant inserts keep insertion order.
    pub fn list_notes(&self, owner_id: &str) -> Result<Vec<NoteRow>> {
        self.with_conn(|conn| query_notes_for_owner(conn, owner_id))
    }

    pub fn get_note(&self, owner_id: &str, note_id: &str) -> Result<Option<NoteRow>> {
        self.with_conn(|conn| query_note_scoped(conn, owner_id, note_id))
    }

    /// Apply a partial update to an owner's note. Returns the updated row, or
    /// `None` when no note with that id is owned by `owner_id`.
    pub fn update_note(
        &self,
        owner_id: &str,
        note_id: &str,
        patch: &NotePatch,
    ) -> Result<Option<NoteRow>> {
        self.with_conn(|conn| {
            let Some(mut note) = query_note_scoped(conn, owner_id, note_id)? else {
                return Ok(None);
            };

            if let Some(title) = &patch.title {
                note.title = title.clone();
            }
            if let Some(content) = &patch.content {
                note.content = content.clone();
            }
            if let Some(favorite) = patch.favorite {
                note.favorite = favorite;
            }
            if let Some(image) = &patch.image {
                note.image = Some(image.clone());
            }

            conn.execute(
                "UPDATE notes SET title = ?1, content = ?2, favorite = ?3, image = ?4
                 WHERE id = ?5 AND owner_id = ?6",
                rusqlite::params![
                    note.title,
                    note.content,
                    note.favorite,
                    note.image,
                    note_id,
                    owner_id
                ],
            )?;

            Ok(Some(note))
        })
    }

    /// Owner-scoped delete. `false` means nothing matched — absent and
    /// not-owned are the same outcome by design.
    pub fn delete_note(&self, owner_id: &str, note_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM notes WHERE id = ?1 AND owner_id = ?2",
                (note_id, owner_id),
            )?;
            Ok(affected > 0)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password_hash, created_at FROM users WHERE email = ?1",
    )?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password_hash, created_at FROM users WHERE id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_notes_for_owner(conn: &Connection, owner_id: &str) -> Result<Vec<NoteRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, title, content, favorite, image, created_at
         FROM notes
         WHERE owner_id = ?1
         ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt
        .query_map([owner_id], note_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_note_scoped(conn: &Connection, owner_id: &str, note_id: &str) -> Result<Option<NoteRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, title, content, favorite, image, created_at
         FROM notes
         WHERE id = ?1 AND owner_id = ?2",
    )?;

    let row = stmt
        .query_row([note_id, owner_id], note_from_row)
        .optional()?;

    Ok(row)
}

fn note_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<NoteRow, rusqlite::Error> {
    Ok(NoteRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        favorite: row.get(4)?,
        image: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
