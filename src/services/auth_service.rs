use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::auth::{AuthResponse, Claims, LoginRequest, RegisterRequest},
    entity::users::{self, ActiveModel as UserActive, Column as UserCol, Entity as Users, Role},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::UserProfile,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let RegisterRequest {
        name,
        email,
        password,
    } = payload;
    let email = email.trim().to_string();

    let exist = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::InvalidInput(format!(
            "Email already registered: {email}"
        )));
    }

    let password_hash = hash_password(&password)?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        email: Set(email.clone()),
        password_hash: Set(password_hash),
        role: Set(Role::User),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| registration_error(err, &email))?;

    tracing::info!(user_id = %user.id, "user registered");

    let token = issue_token(&state.config, &user)?;
    Ok(ApiResponse::success(
        "User created",
        auth_response(&user, Some(token), Some("Registered successfully")),
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let LoginRequest { email, password } = payload;
    let user = Users::find()
        .filter(UserCol::Email.eq(email.trim()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => {
            tracing::warn!("login attempt for unknown email");
            return Err(invalid_credentials());
        }
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        tracing::warn!(user_id = %user.id, "login attempt with wrong password");
        return Err(invalid_credentials());
    }

    let token = issue_token(&state.config, &user)?;
    Ok(ApiResponse::success(
        "Logged in",
        auth_response(&user, Some(token), Some("Login successfully")),
        Some(Meta::empty()),
    ))
}

pub async fn current_user(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<UserProfile>> {
    let model = find_principal(&state.orm, user).await?;
    Ok(ApiResponse::success("OK", profile_from_entity(model), None))
}

/// Loads the user row behind a principal. The row, not the token, is the
/// authority for the role.
pub async fn find_principal<C>(conn: &C, user: &AuthUser) -> AppResult<users::Model>
where
    C: ConnectionTrait,
{
    Users::find_by_id(user.user_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("User", "email", &user.email))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn issue_token(config: &AppConfig, user: &users::Model) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.jwt_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// A concurrent registration can slip past the lookup; the unique email
/// index catches it.
fn registration_error(err: DbErr, email: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::InvalidInput(format!("Email already registered: {email}"))
        }
        _ => AppError::OrmError(err),
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".into())
}

fn auth_response(user: &users::Model, token: Option<String>, message: Option<&str>) -> AuthResponse {
    AuthResponse {
        message: message.map(str::to_string),
        token,
        token_type: "Bearer".to_string(),
        user_id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
    }
}

fn profile_from_entity(model: users::Model) -> UserProfile {
    UserProfile {
        id: model.id,
        name: model.name,
        email: model.email,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_orm_conn, run_migrations};

    fn user_row(email: &str) -> UserActive {
        UserActive {
            id: Set(Uuid::new_v4()),
            name: Set("Dup".into()),
            email: Set(email.into()),
            password_hash: Set("dummy".into()),
            role: Set(Role::User),
            created_at: Set(Utc::now().into()),
        }
    }

    #[tokio::test]
    async fn duplicate_email_insert_maps_to_invalid_input() {
        let conn = create_orm_conn("sqlite::memory:").await.unwrap();
        run_migrations(&conn).await.unwrap();

        user_row("dup@example.com").insert(&conn).await.unwrap();
        let err = user_row("dup@example.com").insert(&conn).await.unwrap_err();

        match registration_error(err, "dup@example.com") {
            AppError::InvalidInput(message) => {
                assert_eq!(message, "Email already registered: dup@example.com")
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn other_database_errors_stay_internal() {
        let err = registration_error(DbErr::Custom("boom".into()), "a@example.com");
        assert!(matches!(err, AppError::OrmError(_)), "got {err:?}");
    }
}
