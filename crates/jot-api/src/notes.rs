use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::SecondsFormat;
use tracing::warn;
use uuid::Uuid;

use jot_db::models::{NotePatch, NoteRow};
use jot_types::api::{CreateNoteRequest, DeleteResponse, NoteResponse, UpdateNoteRequest};

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Title fallback: the first 20 characters of the content, or "Untitled"
/// when there is nothing to take.
fn derive_title(content: &str) -> String {
    let title: String = content.chars().take(20).collect();
    if title.is_empty() {
        "Untitled".to_string()
    } else {
        title
    }
}

/// GET /api/notes — all of the caller's notes, oldest first. A user with no
/// notes gets an empty array, not an error.
pub async fn list_notes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let owner_id = user.id.to_string();

    let rows = tokio::task::spawn_blocking(move || db.db.list_notes(&owner_id))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    let notes: Vec<NoteResponse> = rows.into_iter().map(note_response).collect();
    Ok(Json(notes))
}

/// POST /api/notes
pub async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = match req.title {
        Some(t) if !t.is_empty() => t,
        _ => derive_title(&req.content),
    };

    let row = NoteRow {
        id: Uuid::new_v4().to_string(),
        owner_id: user.id.to_string(),
        title,
        content: req.content,
        favorite: false,
        image: req.image,
        created_at: chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    };

    let db = state.clone();
    let stored = tokio::task::spawn_blocking(move || -> anyhow::Result<NoteRow> {
        db.db.insert_note(&row)?;
        Ok(row)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    Ok((StatusCode::CREATED, Json(note_response(stored))))
}

/// PUT /api/notes/{id} — partial update; only supplied fields change. A note
/// owned by someone else 404s exactly like a nonexistent one.
pub async fn update_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = NotePatch {
        title: req.title,
        content: req.content,
        favorite: req.favorite,
        image: req.image,
    };

    let db = state.clone();
    let owner_id = user.id.to_string();
    let id = note_id.to_string();

    let updated = tokio::task::spawn_blocking(move || db.db.update_note(&owner_id, &id, &patch))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??
        .ok_or(ApiError::NotFound)?;

    Ok(Json(note_response(updated)))
}

/// DELETE /api/notes/{id} — same owner-scoped lookup semantics as update.
pub async fn delete_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let owner_id = user.id.to_string();
    let id = note_id.to_string();

    let deleted = tokio::task::spawn_blocking(move || db.db.delete_note(&owner_id, &id))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    if !deleted {
        return Err(ApiError::NotFound);
    }

    Ok(Json(DeleteResponse {
        message: "Note deleted".to_string(),
    }))
}

fn note_response(row: NoteRow) -> NoteResponse {
    NoteResponse {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt note id '{}': {}", row.id, e);
            Uuid::default()
        }),
        owner_id: row.owner_id.parse().unwrap_or_else(|e| {
            warn!("Corrupt owner_id '{}' on note '{}': {}", row.owner_id, row.id, e);
            Uuid::default()
        }),
        title: row.title,
        content: row.content,
        favorite: row.favorite,
        image: row.image,
        created_at: row
            .created_at
            .parse::<chrono::DateTime<chrono::Utc>>()
            .unwrap_or_else(|e| {
                warn!("Corrupt created_at '{}' on note '{}': {}", row.created_at, row.id, e);
                chrono::DateTime::default()
            }),
    }
}
