use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    routing::{post, put},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    accounts::dto::{CreateAccountRequest, UpdateAccountRequest, UserAuthenticated},
    auth::{AuthService, AuthToken},
    error::{AppError, AppResult},
    extract::{AppJson, AppPath},
    state::AppState,
    users::{NewUser, User, UsernameTaken},
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account", post(create_account))
        .route("/account/:id", put(update_account).delete(delete_account))
}

/// Non-blank value of an optional field.
fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.trim().is_empty())
}

fn store_error(e: anyhow::Error) -> AppError {
    if e.downcast_ref::<UsernameTaken>().is_some() {
        AppError::Conflict("This user already exists".into())
    } else {
        AppError::Internal(e)
    }
}

fn invalid_token() -> AppError {
    AppError::Unauthorized("Invalid AuthToken".into())
}

/// Second half of a create: bind a token to the freshly assigned id.
async fn store_initial_token(
    state: &AppState,
    auth: &AuthService,
    user: &mut User,
    seq: i64,
) -> AppResult<()> {
    user.auth_token = auth.generate_auth_token(user.id, seq, &user.username)?;
    if !state.users.update(user).await.map_err(store_error)? {
        return Err(AppError::Internal(anyhow::anyhow!(
            "account {} disappeared before its token was stored",
            user.id
        )));
    }
    Ok(())
}

#[instrument(skip(state, auth, payload))]
pub async fn create_account(
    State(state): State<AppState>,
    State(auth): State<AuthService>,
    AppJson(payload): AppJson<CreateAccountRequest>,
) -> AppResult<(StatusCode, [(HeaderName, String); 1], Json<UserAuthenticated>)> {
    if !state.config.enable_user_creation {
        warn!("account creation attempted while disabled");
        return Err(AppError::CreationDisabled);
    }

    let (Some(username), Some(email), Some(password)) = (
        required(&payload.username),
        required(&payload.email),
        required(&payload.password),
    ) else {
        return Err(AppError::InvalidInput(
            "Please provide all Username, Email and Password".into(),
        ));
    };
    let username = username.trim();
    let email = email.trim();

    if state
        .users
        .find_by_username(username)
        .await
        .map_err(AppError::Internal)?
        .is_some()
    {
        warn!(%username, "username already registered");
        return Err(AppError::Conflict("This user already exists".into()));
    }

    if !auth.validate_username(username) {
        return Err(AppError::InvalidInput("The username is invalid".into()));
    }
    if !auth.validate_email(email) {
        return Err(AppError::InvalidInput("The email is invalid".into()));
    }
    if !auth.validate_password(password) {
        return Err(AppError::InvalidInput("The password is invalid".into()));
    }

    let seq = state.users.count().await.map_err(AppError::Internal)? + 1;
    let password_hash = auth.hash_password(seq, password)?;

    let mut user = state
        .users
        .add(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            auth_token: String::new(),
        })
        .await
        .map_err(store_error)?;

    // The token is bound to the id, which only exists after the insert.
    // A create that cannot finish must not leave a row behind holding the username.
    if let Err(e) = store_initial_token(&state, &auth, &mut user, seq).await {
        if let Err(cleanup) = state.users.remove(user.id).await {
            error!(error = ?cleanup, user_id = user.id, "failed to remove half-created account");
        }
        return Err(e);
    }

    info!(user_id = user.id, username = %user.username, "account created");
    let location = format!("/api/account/{}", user.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(user.into()),
    ))
}

#[instrument(skip(state, auth, token, payload))]
pub async fn update_account(
    State(state): State<AppState>,
    State(auth): State<AuthService>,
    AppPath(id): AppPath<i64>,
    AuthToken(token): AuthToken,
    AppJson(payload): AppJson<UpdateAccountRequest>,
) -> AppResult<Json<UserAuthenticated>> {
    let (Some(username), Some(email), Some(current_password)) = (
        required(&payload.username),
        required(&payload.email),
        required(&payload.current_password),
    ) else {
        return Err(AppError::InvalidInput(
            "Please provide all Username, Email and Current Password".into(),
        ));
    };
    let username = username.trim();
    let email = email.trim();

    if !auth.verify_auth_token_and_id(id, &token) {
        return Err(invalid_token());
    }

    if !auth.validate_username(username) {
        return Err(AppError::InvalidInput(
            "The username is invalid or does not meet the minimum requirements".into(),
        ));
    }
    if !auth.validate_email(email) {
        return Err(AppError::InvalidInput(
            "The email contains invalid characters or does not meet the minimum requirements"
                .into(),
        ));
    }
    if !auth.validate_password(current_password) {
        return Err(AppError::InvalidInput(
            "The current password contains invalid characters or does not meet the minimum requirements"
                .into(),
        ));
    }

    let mut user = state
        .users
        .find(id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if user.auth_token != token {
        warn!(user_id = id, "stale auth token presented");
        return Err(invalid_token());
    }

    if !auth.verify_password(current_password, &user.password_hash) {
        warn!(user_id = id, "current password mismatch");
        return Err(AppError::Unauthorized("Current Password is incorrect".into()));
    }

    let renamed = user.username != username;
    if renamed {
        let taken = state
            .users
            .find_by_username(username)
            .await
            .map_err(AppError::Internal)?
            .is_some_and(|other| other.id != id);
        if taken {
            return Err(AppError::Conflict("This username has already been taken".into()));
        }
    }

    let new_password = required(&payload.new_password);
    if new_password.is_some_and(|p| !auth.validate_password(p)) {
        return Err(AppError::InvalidInput(
            "The new password contains invalid characters or does not meet the minimum requirements"
                .into(),
        ));
    }

    user.username = username.to_string();
    user.email = email.to_string();

    let rotate = renamed || new_password.is_some();
    if rotate {
        let seq = state.users.count().await.map_err(AppError::Internal)? + 1;
        if let Some(new_password) = new_password {
            user.password_hash = auth.hash_password(seq, new_password)?;
        }
        user.auth_token = auth.generate_auth_token(user.id, seq, &user.username)?;
    }

    if !state.users.update(&user).await.map_err(store_error)? {
        return Err(AppError::NotFound("User not found".into()));
    }

    info!(user_id = id, rotated = rotate, "account updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state, auth, token))]
pub async fn delete_account(
    State(state): State<AppState>,
    State(auth): State<AuthService>,
    AppPath(id): AppPath<i64>,
    AuthToken(token): AuthToken,
) -> AppResult<StatusCode> {
    if !auth.verify_auth_token_and_id(id, &token) {
        return Err(invalid_token());
    }

    let user = state
        .users
        .find(id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if user.auth_token != token {
        warn!(user_id = id, "stale auth token presented");
        return Err(invalid_token());
    }

    if !state.users.remove(id).await.map_err(AppError::Internal)? {
        return Err(AppError::NotFound("User not found".into()));
    }

    info!(user_id = id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}
