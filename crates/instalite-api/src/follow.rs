use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use instalite_db::models::FollowOutcome;
use instalite_types::api::{
    Claims, Envelope, FollowCreated, FollowRemoved, FollowStatus, FollowersPage, FollowingPage,
};
use instalite_types::time::timestamp_or_epoch;

use crate::error::{ApiError, internal};
use crate::pagination::{PageQuery, Pagination, parse_leading_int};
use crate::state::AppState;
use crate::views;

/// Follow routes read the leading integer of the id ("7abc" is 7), the same
/// way page numbers are read. No leading digits is a 400.
fn user_id(raw: &str) -> Result<i64, ApiError> {
    parse_leading_int(raw).ok_or_else(|| ApiError::bad_request("Invalid user ID format"))
}

/// POST /api/users/{id}/follow
pub async fn follow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let target_id = user_id(&raw_id)?;
    let follower_id = claims.sub;

    if follower_id == target_id {
        return Err(ApiError::bad_request("Cannot follow yourself"));
    }

    let (exists, already_following) = state
        .with_db(move |db| {
            let exists = db.user_exists(target_id)?;
            let since = db.follow_since(follower_id, target_id)?;
            Ok((exists, since.is_some()))
        })
        .await
        .map_err(internal("Database error"))?;
    if !exists {
        return Err(ApiError::not_found("User not found"));
    }
    if already_following {
        return Err(ApiError::bad_request("Already following this user"));
    }

    let outcome = state
        .with_db(move |db| db.follow_user(follower_id, target_id))
        .await
        .map_err(internal("Failed to follow user"))?;

    let row = match outcome {
        FollowOutcome::Created(row) => row,
        FollowOutcome::AlreadyFollowing => {
            return Err(ApiError::bad_request("Already following this user"));
        }
    };

    let following_count = state
        .with_db(move |db| db.follower_count(target_id))
        .await
        .map_err(internal("Database error"))?;

    info!("User {} followed {}", follower_id, target_id);

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(
            "User followed successfully",
            FollowCreated {
                follow_id: row.id,
                follower_id: row.follower_id,
                following_id: row.following_id,
                following_count,
                created_at: timestamp_or_epoch(&row.created_at),
            },
        )),
    ))
}

/// DELETE /api/users/{id}/follow
pub async fn unfollow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(raw_id): Path<String>,
) -> Result<Json<Envelope<FollowRemoved>>, ApiError> {
    let target_id = user_id(&raw_id)?;
    let follower_id = claims.sub;

    let removed = state
        .with_db(move |db| db.unfollow_user(follower_id, target_id))
        .await
        .map_err(internal("Failed to unfollow user"))?;
    if !removed {
        return Err(ApiError::bad_request("Not following this user"));
    }

    let following_count = state
        .with_db(move |db| db.follower_count(target_id))
        .await
        .map_err(internal("Database error"))?;

    info!("User {} unfollowed {}", follower_id, target_id);

    Ok(Json(Envelope::with_message(
        "User unfollowed successfully",
        FollowRemoved {
            following_id: target_id,
            following_count,
        },
    )))
}

/// GET /api/users/{id}/followers?page&limit
pub async fn list_followers(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Envelope<FollowersPage>>, ApiError> {
    let target_id = user_id(&raw_id)?;
    let page = Pagination::from_query(&query);

    let listed = state
        .with_db(move |db| {
            if !db.user_exists(target_id)? {
                return Ok(None);
            }
            let total = db.follower_count(target_id)?;
            let rows = db.list_followers(target_id, page.limit, page.offset())?;
            Ok(Some((total, rows)))
        })
        .await
        .map_err(internal("Database error"))?;

    let (total, rows) = listed.ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(Envelope::ok(FollowersPage {
        page: page.page,
        limit: page.limit,
        total,
        total_pages: page.total_pages(total),
        followers: rows.into_iter().map(views::follower).collect(),
    })))
}

/// GET /api/users/{id}/following?page&limit
pub async fn list_following(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Envelope<FollowingPage>>, ApiError> {
    let target_id = user_id(&raw_id)?;
    let page = Pagination::from_query(&query);

    let listed = state
        .with_db(move |db| {
            if !db.user_exists(target_id)? {
                return Ok(None);
            }
            let total = db.following_count(target_id)?;
            let rows = db.list_following(target_id, page.limit, page.offset())?;
            Ok(Some((total, rows)))
        })
        .await
        .map_err(internal("Database error"))?;

    let (total, rows) = listed.ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(Envelope::ok(FollowingPage {
        page: page.page,
        limit: page.limit,
        total,
        total_pages: page.total_pages(total),
        following: rows.into_iter().map(views::following).collect(),
    })))
}

/// GET /api/users/{id}/following-status/{target_id}
pub async fn following_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((raw_id, raw_target)): Path<(String, String)>,
) -> Result<Json<Envelope<FollowStatus>>, ApiError> {
    let current_id = user_id(&raw_id)?;
    let target_id = user_id(&raw_target)?;

    if current_id != claims.sub {
        return Err(ApiError::Forbidden(
            "You can only check your own follow status".into(),
        ));
    }
    if current_id == target_id {
        return Err(ApiError::bad_request("Cannot check follow status with yourself"));
    }

    let since = state
        .with_db(move |db| db.follow_since(current_id, target_id))
        .await
        .map_err(internal("Database error"))?;

    Ok(Json(Envelope::ok(FollowStatus {
        is_following: since.is_some(),
        followed_at: since.as_deref().map(timestamp_or_epoch),
        target_user_id: target_id,
        current_user_id: current_id,
    })))
}
