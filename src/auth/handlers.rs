use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use tokio::task::spawn_blocking;
use tracing::{info, instrument, warn};

use crate::auth::dto::{
    is_valid_email, AuthStatusResponse, LoginRequest, MessageResponse, RegisterRequest,
};
use crate::auth::error::AuthError;
use crate::auth::session::{clear_session_cookie, session_cookie, SessionKeys, SESSION_COOKIE};
use crate::state::AppState;
use crate::store::StoreError;

/// Login rejections share one message so the error channel never reveals
/// whether the email exists.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/auth-status", get(auth_status))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    let (email, password) = match (non_empty(payload.email), non_empty(payload.password)) {
        (Some(email), Some(password)) => (email, password),
        _ => {
            warn!("register missing fields");
            return Err(AuthError::Validation("Email and password required"));
        }
    };

    if !is_valid_email(&email) {
        warn!(email = %email, "register invalid email format");
        return Err(AuthError::Validation("Invalid email format"));
    }

    if password.len() < 5 {
        warn!(email = %email, "register password too short");
        return Err(AuthError::Validation(
            "Password must be at least 5 characters long",
        ));
    }

    // Argon2 is CPU-bound; keep it off the async workers.
    let scheme = state.password.clone();
    let hash = spawn_blocking(move || scheme.hash(&password))
        .await
        .map_err(|e| AuthError::internal("Registration failed", e.into()))?
        .map_err(|e| AuthError::internal("Registration failed", e))?;

    let user = state.users.create(&email, &hash).await.map_err(|e| match e {
        StoreError::DuplicateEmail => {
            warn!(email = %email, "email already registered");
            AuthError::Conflict("Email already registered")
        }
        StoreError::Other(source) => AuthError::internal("Registration failed", source),
    })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registration successful".into(),
        }),
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), AuthError> {
    let (email, password) = match (non_empty(payload.email), non_empty(payload.password)) {
        (Some(email), Some(password)) => (email, password),
        _ => {
            warn!("login missing fields");
            return Err(AuthError::Validation(INVALID_CREDENTIALS));
        }
    };

    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| AuthError::internal("Login failed", e.into()))?;

    let Some(user) = user else {
        warn!(email = %email, "login unknown email");
        return Err(AuthError::Validation(INVALID_CREDENTIALS));
    };

    let scheme = state.password.clone();
    let stored_hash = user.password_hash.clone();
    let ok = spawn_blocking(move || scheme.verify(&password, &stored_hash))
        .await
        .map_err(|e| AuthError::internal("Login failed", e.into()))?
        .map_err(|e| AuthError::internal("Login failed", e))?;

    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AuthError::Validation(INVALID_CREDENTIALS));
    }

    let keys = SessionKeys::from_ref(&state);
    let token = keys
        .sign(user.id)
        .map_err(|e| AuthError::internal("Login failed", e))?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        jar.add(session_cookie(token, keys.ttl())),
        Json(MessageResponse {
            message: "Login successful".into(),
        }),
    ))
}

/// Stateless: nothing to look up or validate, just expire the cookie.
#[instrument(skip_all)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    info!("user logged out");
    (
        jar.add(clear_session_cookie()),
        Json(MessageResponse {
            message: "Logged out".into(),
        }),
    )
}

#[instrument(skip_all)]
pub async fn auth_status(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Json<AuthStatusResponse> {
    let keys = SessionKeys::from_ref(&state);
    let logged_in = jar
        .get(SESSION_COOKIE)
        .map(|cookie| keys.verify(cookie.value()).is_ok())
        .unwrap_or(false);
    Json(AuthStatusResponse { logged_in })
}
