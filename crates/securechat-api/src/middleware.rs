use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use securechat_types::api::Claims;

use crate::auth::AppState;
use crate::error::AppError;

/// Extract and validate the JWT from the Authorization header and hand the
/// claims to the handler as an extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let not_logged_in = || AppError::Unauthorized("Not logged in".into());

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(not_logged_in)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| not_logged_in())?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}
