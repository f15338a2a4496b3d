use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};

use instalite_types::api::HealthResponse;

use crate::middleware::{cache_control, require_auth};
use crate::rate_limit::limit_caption_requests;
use crate::state::AppState;
use crate::{auth, captions, follow, posts, users};

/// Whole-request cap on `/api`; per-file limits are enforced by the
/// upload handlers.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// The `/api` router. Static `/uploads` serving is left to the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/posts", get(posts::list_posts))
        .route("/posts/{id}/comments", get(posts::list_comments))
        .route("/users/{id}", get(users::get_profile))
        .route("/users/{id}/followers", get(follow::list_followers))
        .route("/users/{id}/following", get(follow::list_following));

    let protected_routes = Router::new()
        .route("/posts", post(posts::create_post))
        .route("/posts/{id}", delete(posts::delete_post))
        .route(
            "/posts/{id}/caption",
            put(posts::update_caption).delete(posts::delete_caption),
        )
        .route("/posts/{id}/like", post(posts::toggle_like))
        .route("/posts/{id}/comments", post(posts::add_comment))
        .route("/users/me", get(users::get_me))
        .route("/users/me/avatar", post(users::upload_avatar))
        .route("/users/me/bio", put(users::update_bio))
        .route("/users/{id}/follow", post(follow::follow).delete(follow::unfollow))
        .route(
            "/users/{id}/following-status/{target_id}",
            get(follow::following_status),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // The rate limiter wraps auth.
    let caption_routes = Router::new()
        .route("/posts/generate-caption", post(captions::generate_caption))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            limit_caption_requests,
        ));

    Router::new()
        .nest(
            "/api",
            public_routes.merge(protected_routes).merge(caption_routes),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(cache_control))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Instagram Lite API is running",
    })
}
