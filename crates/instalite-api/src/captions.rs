use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use tracing::{error, info};

use instalite_types::api::{CaptionSuggestions, Claims};

use crate::error::ApiError;
use crate::state::AppState;
use crate::upload::{IMAGE_LIMITS, read_form};

/// POST /api/posts/generate-caption: multipart `image`.
///
/// Runs behind the caption rate limiter. Service errors are passed to the
/// client verbatim.
pub async fn generate_caption(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CaptionSuggestions>, ApiError> {
    let form = read_form(multipart, "image", IMAGE_LIMITS).await?;
    let file = form
        .file
        .ok_or_else(|| ApiError::bad_request("No image file provided"))?;

    info!(
        "Generating captions for user {} ({} bytes, {})",
        claims.sub,
        file.bytes.len(),
        file.content_type
    );

    let captions = state
        .captions
        .generate_from_bytes(&file.bytes, &file.content_type)
        .await
        .map_err(|e| {
            error!("Caption generation failed: {}", e);
            ApiError::Internal(e.to_string())
        })?;

    Ok(Json(CaptionSuggestions {
        success: true,
        captions,
        message: "Captions generated successfully".into(),
    }))
}
