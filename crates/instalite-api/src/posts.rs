use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::{error, info, warn};

use instalite_types::api::{
    Claims, CreateCommentRequest, CreateCommentResponse, CreatePostResponse, LikeResponse, UpdateCaptionRequest,
};
use instalite_types::models::{Comment, FeedPost};

use crate::error::{ApiError, Legacy, internal};
use crate::state::AppState;
use crate::upload::{IMAGE_LIMITS, read_form};
use crate::views;

const NOT_OWNED: &str = "Post not found or unauthorized";

/// Post ids in paths; anything that is not an integer cannot name a post.
pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

fn owned_post_id(raw: &str) -> Result<i64, ApiError> {
    parse_id(raw).ok_or_else(|| ApiError::not_found(NOT_OWNED))
}

fn known_post_id(raw: &str) -> Result<i64, ApiError> {
    parse_id(raw).ok_or_else(|| ApiError::not_found("Post not found"))
}

/// GET /api/posts
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<FeedPost>>, Legacy> {
    let rows = state
        .with_db(|db| db.list_feed())
        .await
        .map_err(internal("Server error"))?;

    Ok(Json(rows.into_iter().map(views::feed_post).collect()))
}

/// POST /api/posts: multipart `image` (optional) and `caption`.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, Legacy> {
    let mut form = read_form(multipart, "image", IMAGE_LIMITS).await.map_err(ApiError::from)?;
    let caption = form.fields.remove("caption").unwrap_or_default();

    let image_url = match &form.file {
        Some(file) => state
            .storage
            .save("", file.file_name.as_deref(), &file.content_type, &file.bytes)
            .await
            .map_err(internal("Failed to create post"))?,
        None => String::new(),
    };

    let user_id = claims.sub;
    let (url, text) = (image_url.clone(), caption.clone());
    let post_id = match state.with_db(move |db| db.create_post(user_id, &url, &text)).await {
        Ok(id) => id,
        Err(e) => {
            error!("DB create_post error: {}", e);
            if let Err(e) = state.storage.delete_by_url(&image_url).await {
                warn!("Failed to remove orphaned upload {}: {}", image_url, e);
            }
            return Err(ApiError::Internal("Failed to create post".into()).into());
        }
    };

    info!("User {} created post {}", user_id, post_id);

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            id: post_id,
            image_url,
            caption,
        }),
    ))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, Legacy> {
    let post_id = owned_post_id(&raw_id)?;
    let user_id = claims.sub;

    let post = state
        .with_db(move |db| db.get_owned_post(post_id, user_id))
        .await
        .map_err(internal("Server error"))?
        .ok_or_else(|| ApiError::not_found(NOT_OWNED))?;

    state
        .with_db(move |db| db.delete_post(post_id))
        .await
        .map_err(internal("Failed to delete post"))?;

    if let Err(e) = state.storage.delete_by_url(&post.image_url).await {
        warn!("Failed to remove image for post {}: {}", post_id, e);
    }

    info!("User {} deleted post {}", user_id, post_id);
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

/// PUT /api/posts/{id}/caption
///
/// The body is parsed leniently: anything that does not carry a string
/// `caption` is answered with "Caption is required" before ownership is
/// checked.
pub async fn update_caption(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let caption = serde_json::from_slice::<UpdateCaptionRequest>(&body)
        .ok()
        .and_then(|req| req.caption)
        .ok_or_else(|| ApiError::bad_request("Caption is required"))?;

    let post_id = owned_post_id(&raw_id)?;
    let user_id = claims.sub;

    state
        .with_db(move |db| db.get_owned_post(post_id, user_id))
        .await
        .map_err(internal("Server error"))?
        .ok_or_else(|| ApiError::not_found(NOT_OWNED))?;

    let text = caption.clone();
    state
        .with_db(move |db| db.update_caption(post_id, &text))
        .await
        .map_err(internal("Failed to update caption"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Caption updated successfully",
        "caption": caption,
    })))
}

/// DELETE /api/posts/{id}/caption
pub async fn delete_caption(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = owned_post_id(&raw_id)?;
    let user_id = claims.sub;

    state
        .with_db(move |db| db.get_owned_post(post_id, user_id))
        .await
        .map_err(internal("Server error"))?
        .ok_or_else(|| ApiError::not_found(NOT_OWNED))?;

    state
        .with_db(move |db| db.update_caption(post_id, ""))
        .await
        .map_err(internal("Failed to delete caption"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Caption deleted successfully",
    })))
}

/// POST /api/posts/{id}/like
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(raw_id): Path<String>,
) -> Result<Json<LikeResponse>, Legacy> {
    let post_id = known_post_id(&raw_id)?;
    let user_id = claims.sub;

    let toggled = state
        .with_db(move |db| {
            if !db.post_exists(post_id)? {
                return Ok(None);
            }
            db.toggle_like(user_id, post_id).map(Some)
        })
        .await
        .map_err(internal("Server error"))?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(LikeResponse {
        liked: toggled.liked,
        likes_count: toggled.likes_count,
    }))
}

/// GET /api/posts/{id}/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<Comment>>, Legacy> {
    let post_id = known_post_id(&raw_id)?;

    let rows = state
        .with_db(move |db| db.comments_for_post(post_id))
        .await
        .map_err(internal("Server error"))?;

    Ok(Json(rows.into_iter().map(views::comment).collect()))
}

/// POST /api/posts/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(raw_id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, Legacy> {
    let content = req
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Comment content is required"))?;
    let post_id = known_post_id(&raw_id)?;
    let user_id = claims.sub;

    let text = content.clone();
    let comment_id = state
        .with_db(move |db| {
            if !db.post_exists(post_id)? {
                return Ok(None);
            }
            db.add_comment(user_id, post_id, &text).map(Some)
        })
        .await
        .map_err(internal("Failed to add comment"))?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateCommentResponse {
            id: comment_id,
            content,
        }),
    ))
}
