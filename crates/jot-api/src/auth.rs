use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use jot_types::api::{LoginRequest, LoginResponse, SignupRequest, SignupResponse};

use crate::AppState;
use crate::error::ApiError;

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.trim().is_empty() {
        return Err(ApiError::Validation("Username is required"));
    }
    if req.email.trim().is_empty() {
        return Err(ApiError::Validation("Email is required"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation("Password must be at least 8 characters"));
    }

    // Emails are unique, compared exactly as provided
    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::DuplicateEmail);
    }

    // Hash password with Argon2id; only the PHC string is ever stored
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hash failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();

    state
        .db
        .create_user(&user_id.to_string(), &req.username, &req.email, &password_hash)?;

    let token = state.tokens.issue(user_id)?;

    Ok((StatusCode::CREATED, Json(SignupResponse { user_id, token })))
}

/// Unknown email and wrong password both come back as the same
/// `InvalidCredentials`; the response never says which check failed.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or(ApiError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unparseable: {}", e)))?;

    // Constant-time verification via argon2
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id '{}': {}", user.id, e)))?;

    let token = state.tokens.issue(user_id)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}
