use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{error, info};

use instalite_db::is_constraint_violation;
use instalite_types::api::{AuthResponse, AuthUser, Claims, LoginRequest, RegisterRequest};

use crate::error::{ApiError, Legacy, internal};
use crate::state::AppState;

const TOKEN_LIFETIME_DAYS: i64 = 30;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, Legacy> {
    let (Some(username), Some(email), Some(password)) = (
        non_blank(req.username),
        non_blank(req.email),
        non_blank(req.password),
    ) else {
        return Err(ApiError::bad_request("Username, email and password are required").into());
    };

    let password_hash = hash_password(&password).map_err(internal("Server error"))?;

    let (name, mail) = (username.clone(), email.clone());
    let user_id = match state
        .with_db(move |db| db.create_user(&name, &mail, &password_hash))
        .await
    {
        Ok(id) => id,
        Err(e) if is_constraint_violation(&e) => {
            return Err(ApiError::bad_request("Username or email already exists").into());
        }
        Err(e) => {
            error!("DB create_user error: {}", e);
            return Err(ApiError::Internal("Server error".into()).into());
        }
    };

    let token = create_token(&state.jwt_secret, user_id, &username).map_err(internal("Server error"))?;
    info!("Registered user {} ({})", username, user_id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: AuthUser {
                id: user_id,
                username,
                email,
                avatar: None,
            },
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, Legacy> {
    let invalid = || Legacy(ApiError::Unauthorized("Invalid credentials".into()));

    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(invalid());
    };

    let user = state
        .with_db(move |db| db.get_user_by_email(&email))
        .await
        .map_err(internal("Server error"))?
        .ok_or_else(invalid)?;

    if !verify_password(&password, &user.password) {
        return Err(invalid());
    }

    let token = create_token(&state.jwt_secret, user.id, &user.username).map_err(internal("Server error"))?;

    Ok(Json(AuthResponse {
        token,
        user: AuthUser {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: Some(user.avatar),
        },
    }))
}

/// Hash with Argon2id and a random salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

/// False for a wrong password and for a stored hash that does not parse.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        error!("Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn create_token(secret: &str, user_id: i64, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
