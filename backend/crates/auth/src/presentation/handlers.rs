//! HTTP Handlers

use axum::extract::{Extension, Form, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token::TokenCodec;
use crate::application::{
    AccessGuard, ChangePasswordInput, ChangePasswordUseCase, CreateUserInput, CreateUserUseCase,
    ManageUserUseCase, RefreshTokenInput, RefreshTokenUseCase, SignInInput, SignInUseCase,
    UserChanges,
};
use crate::domain::entity::user::PersonName;
use crate::domain::repository::AuthStore;
use crate::domain::value_object::user_id::UserId;
use crate::error::AuthResult;
use crate::presentation::dto::{
    ChangePasswordRequest, CreateUserRequest, LoginForm, PatchUserRequest, RefreshTokenRequest,
    SignInRequest, SignInResponse, TokenPairResponse, UpdateUserRequest, UserDetailResponse,
    UserResponse,
};
use crate::presentation::middleware::CurrentUser;

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: AuthStore,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub codec: Arc<TokenCodec>,
}

impl<R> AuthAppState<R>
where
    R: AuthStore,
{
    /// Fails if the configured secret cannot key the token codec
    pub fn new(repo: R, config: AuthConfig) -> AuthResult<Self> {
        config.validate()?;
        let codec = TokenCodec::new(&config.secret_key)?;

        Ok(Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
            codec: Arc::new(codec),
        })
    }

    pub fn access_guard(&self) -> AccessGuard<R, R> {
        AccessGuard::new(self.repo.clone(), self.repo.clone(), self.codec.clone())
    }

    fn sign_in_use_case(&self) -> SignInUseCase<R, R> {
        SignInUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.codec.clone(),
            self.config.clone(),
        )
    }
}

// ============================================================================
// Login / Sign In
// ============================================================================

/// POST /api/v1/auth/login (form)
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    Form(form): Form<LoginForm>,
) -> AuthResult<Json<SignInResponse>>
where
    R: AuthStore,
{
    let output = state
        .sign_in_use_case()
        .execute(SignInInput {
            user_name: form.username,
            password: form.password,
        })
        .await?;

    Ok(Json(output.into()))
}

/// POST /api/v1/auth/sign-in (JSON)
pub async fn sign_in<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<SignInRequest>,
) -> AuthResult<Json<SignInResponse>>
where
    R: AuthStore,
{
    let output = state
        .sign_in_use_case()
        .execute(SignInInput {
            user_name: req.username,
            password: req.password,
        })
        .await?;

    Ok(Json(output.into()))
}

/// GET /api/v1/auth/me
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// POST /api/v1/auth/long-life-token
pub async fn long_life_token<R>(
    State(state): State<AuthAppState<R>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AuthResult<Json<SignInResponse>>
where
    R: AuthStore,
{
    let output = state.sign_in_use_case().issue_long_life(&user.user_id).await?;
    Ok(Json(output.into()))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/v1/auth/refresh_token
pub async fn refresh_token<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<RefreshTokenRequest>,
) -> AuthResult<Json<TokenPairResponse>>
where
    R: AuthStore,
{
    let use_case = RefreshTokenUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.codec.clone(),
        state.config.clone(),
    );

    let tokens = use_case
        .execute(RefreshTokenInput {
            grant_type: req.grant_type,
            refresh_token: req.refresh_token,
        })
        .await?;

    Ok(Json(tokens.into()))
}

// ============================================================================
// Users
// ============================================================================

/// POST /api/v1/users
pub async fn create_user<R>(
    State(state): State<AuthAppState<R>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Json(req): Json<CreateUserRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
{
    let use_case = CreateUserUseCase::new(state.repo.clone(), state.config.clone());

    let user = use_case
        .execute(CreateUserInput {
            user_name: req.username,
            password: req.password,
            email: req.email,
            name: PersonName {
                title_name: req.title_name,
                first_name: req.first_name,
                last_name: req.last_name,
            },
        })
        .await?;

    tracing::debug!(created_by = %admin.user_id, user_id = %user.user_id, "Create user request served");

    Ok((StatusCode::CREATED, Json(UserDetailResponse::from(&user))))
}

/// GET /api/v1/users/{user_id}
pub async fn get_user<R>(
    State(state): State<AuthAppState<R>>,
    Path(user_id): Path<UserId>,
) -> AuthResult<Json<UserDetailResponse>>
where
    R: AuthStore,
{
    let user = ManageUserUseCase::new(state.repo.clone()).get(&user_id).await?;
    Ok(Json(UserDetailResponse::from(&user)))
}

/// PATCH /api/v1/users/{user_id}
pub async fn patch_user<R>(
    State(state): State<AuthAppState<R>>,
    Path(user_id): Path<UserId>,
    Json(req): Json<PatchUserRequest>,
) -> AuthResult<Json<UserDetailResponse>>
where
    R: AuthStore,
{
    let changes = UserChanges {
        title_name: req.title_name,
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
    };

    let user = ManageUserUseCase::new(state.repo.clone())
        .update(&user_id, changes)
        .await?;
    Ok(Json(UserDetailResponse::from(&user)))
}

/// PUT /api/v1/users/{user_id}
pub async fn put_user<R>(
    State(state): State<AuthAppState<R>>,
    Path(user_id): Path<UserId>,
    Json(req): Json<UpdateUserRequest>,
) -> AuthResult<Json<UserDetailResponse>>
where
    R: AuthStore,
{
    let changes = UserChanges::replace_all(
        PersonName {
            title_name: req.title_name,
            first_name: req.first_name,
            last_name: req.last_name,
        },
        req.email,
    );

    let user = ManageUserUseCase::new(state.repo.clone())
        .update(&user_id, changes)
        .await?;
    Ok(Json(UserDetailResponse::from(&user)))
}

/// DELETE /api/v1/users/{user_id}/disactive
pub async fn deactivate_user<R>(
    State(state): State<AuthAppState<R>>,
    Path(user_id): Path<UserId>,
) -> AuthResult<Json<UserDetailResponse>>
where
    R: AuthStore,
{
    let user = ManageUserUseCase::new(state.repo.clone())
        .deactivate(&user_id)
        .await?;
    Ok(Json(UserDetailResponse::from(&user)))
}

/// POST /api/v1/users/me/password
pub async fn change_password<R>(
    State(state): State<AuthAppState<R>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthStore,
{
    ChangePasswordUseCase::new(state.repo.clone(), state.config.clone())
        .execute(
            user,
            ChangePasswordInput {
                current_password: req.current_password,
                new_password: req.new_password,
            },
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
