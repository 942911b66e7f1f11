use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::token::TokenError;

/// The authenticated caller, resolved by `require_auth` and handed to
/// handlers as a request extension. Ownership scoping downstream always
/// starts from this id.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Extract and validate the bearer token from the Authorization header.
/// Every note route passes through here; on failure the handler is never
/// reached. Expired and malformed tokens are told apart in the logs only —
/// the response is the same 401 either way.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(TokenError::Missing);

    let user_id = token
        .and_then(|t| state.tokens.verify(t))
        .map_err(|e| {
            debug!("rejected request token: {}", e);
            ApiError::Unauthorized
        })?;

    req.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(req).await)
}
