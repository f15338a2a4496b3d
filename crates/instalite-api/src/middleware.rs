use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::verify_token;
use crate::error::{ApiError, Legacy};
use crate::state::AppState;

const PRIVATE_CACHE: &str = "no-store, no-cache, must-revalidate, private";
const PUBLIC_CACHE: &str = "public, max-age=60";

/// Extract and validate the JWT from the Authorization header. The
/// verified [`Claims`](instalite_types::api::Claims) go into the request
/// extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Legacy> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Legacy(ApiError::Unauthorized("Authentication required".into())))?;

    let claims = verify_token(&state.jwt_secret, token).map_err(|e| {
        debug!("Rejected token: {}", e);
        Legacy(ApiError::Unauthorized("Invalid token".into()))
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Authenticated responses must not be cached; anonymous reads may be
/// cached briefly.
pub async fn cache_control(req: Request, next: Next) -> Response {
    let authenticated = req.headers().contains_key(header::AUTHORIZATION);
    let mut response = next.run(req).await;

    let value = if authenticated { PRIVATE_CACHE } else { PUBLIC_CACHE };
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(value));
    response
}
