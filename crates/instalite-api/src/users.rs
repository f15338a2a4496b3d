use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
};
use tracing::{error, info, warn};

use instalite_types::api::{AvatarData, BioData, Claims, Envelope, ProfileResponse, UpdateBioRequest};
use instalite_types::models::Account;
use instalite_types::time::timestamp_or_epoch;

use crate::error::{ApiError, Legacy, internal};
use crate::posts::parse_id;
use crate::state::AppState;
use crate::storage::PUBLIC_PREFIX;
use crate::upload::{AVATAR_LIMITS, read_form};
use crate::views;

pub const MAX_BIO_CHARS: usize = 500;

fn user_not_found() -> ApiError {
    ApiError::not_found("User not found")
}

/// GET /api/users/{id}: public profile with posts and follow counts.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ProfileResponse>, Legacy> {
    let user_id = parse_id(&raw_id).ok_or_else(user_not_found)?;

    let profile = state
        .with_db(move |db| {
            let Some(user) = db.get_user_by_id(user_id)? else {
                return Ok(None);
            };
            let posts = db.posts_by_user(user_id)?;
            let followers = db.follower_count(user_id)?;
            let following = db.following_count(user_id)?;
            Ok(Some((user, posts, followers, following)))
        })
        .await
        .map_err(internal("Server error"))?;

    let (user, posts, followers_count, following_count) = profile.ok_or_else(user_not_found)?;

    Ok(Json(ProfileResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        avatar: user.avatar,
        bio: user.bio,
        created_at: timestamp_or_epoch(&user.created_at),
        followers_count,
        following_count,
        posts: posts.into_iter().map(views::post).collect(),
    }))
}

/// GET /api/users/me
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Account>, Legacy> {
    let user_id = claims.sub;
    let user = state
        .with_db(move |db| db.get_user_by_id(user_id))
        .await
        .map_err(internal("Server error"))?
        .ok_or_else(user_not_found)?;

    Ok(Json(views::account(user)))
}

/// POST /api/users/me/avatar: multipart `avatar`.
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Envelope<AvatarData>>, ApiError> {
    let form = read_form(multipart, "avatar", AVATAR_LIMITS).await?;
    let file = form
        .file
        .ok_or_else(|| ApiError::bad_request("No avatar file provided"))?;

    let user_id = claims.sub;
    let previous = state
        .with_db(move |db| db.get_user_by_id(user_id))
        .await
        .map_err(internal("Failed to update avatar"))?
        .ok_or_else(user_not_found)?
        .avatar;

    let avatar = state
        .storage
        .save("avatar-", file.file_name.as_deref(), &file.content_type, &file.bytes)
        .await
        .map_err(internal("Failed to update avatar"))?;

    let url = avatar.clone();
    let updated = state.with_db(move |db| db.update_avatar(user_id, &url)).await;
    if !matches!(updated, Ok(true)) {
        if let Err(e) = &updated {
            error!("DB update_avatar error: {}", e);
        }
        if let Err(e) = state.storage.delete_by_url(&avatar).await {
            warn!("Failed to remove unused avatar {}: {}", avatar, e);
        }
        return Err(ApiError::Internal("Failed to update avatar".into()));
    }

    if previous.starts_with(PUBLIC_PREFIX) && previous != avatar {
        if let Err(e) = state.storage.delete_by_url(&previous).await {
            warn!("Failed to remove previous avatar {}: {}", previous, e);
        }
    }

    info!("User {} updated avatar to {}", user_id, avatar);
    Ok(Json(Envelope::with_message(
        "Avatar updated successfully",
        AvatarData { avatar },
    )))
}

/// PUT /api/users/me/bio
pub async fn update_bio(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> Result<Json<Envelope<BioData>>, ApiError> {
    let bio = serde_json::from_slice::<UpdateBioRequest>(&body)
        .ok()
        .and_then(|req| req.bio)
        .ok_or_else(|| ApiError::bad_request("Bio is required"))?;

    if bio.chars().count() > MAX_BIO_CHARS {
        return Err(ApiError::bad_request("Bio must be 500 characters or fewer"));
    }

    let user_id = claims.sub;
    let text = bio.clone();
    let updated = state
        .with_db(move |db| db.update_bio(user_id, &text))
        .await
        .map_err(internal("Failed to update bio"))?;
    if !updated {
        return Err(user_not_found());
    }

    Ok(Json(Envelope::with_message("Bio updated successfully", BioData { bio })))
}
