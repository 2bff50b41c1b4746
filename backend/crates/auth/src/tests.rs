//! Flow tests for the auth crate, run against the in-memory repository

#[cfg(test)]
mod support {
    use platform::password::{HashAlgorithm, HashedPassword};

    use crate::application::config::AuthConfig;
    use crate::domain::entity::user::{PersonName, User};
    use crate::domain::value_object::{user_name::UserName, user_status::UserStatus};
    use crate::infra::memory::MemoryAuthRepository;
    use crate::presentation::handlers::AuthAppState;

    pub type State = AuthAppState<MemoryAuthRepository>;

    pub fn state() -> (MemoryAuthRepository, State) {
        let repo = MemoryAuthRepository::new();
        let state = AuthAppState::new(repo.clone(), AuthConfig::development()).unwrap();
        (repo, state)
    }

    pub async fn seed_user(
        repo: &MemoryAuthRepository,
        name: &str,
        password: &str,
        status: UserStatus,
    ) -> User {
        let hash = platform::password::hash(password, HashAlgorithm::Bcrypt { cost: 4 }).unwrap();
        let mut user = User::new(
            UserName::new(name).unwrap(),
            HashedPassword::from_hash_string(hash).unwrap(),
            PersonName {
                title_name: "Ms".into(),
                first_name: "Alice".into(),
                last_name: "Liddell".into(),
            },
        );
        user.user_status = status;
        repo.insert_user(user.clone()).await;
        user
    }
}

#[cfg(test)]
mod sign_in_tests {
    use super::support::*;
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use platform::password::{HashAlgorithm, HashedPassword};

    use crate::MemoryAuthRepository;
    use crate::application::{ManageUserUseCase, SignInInput, SignInUseCase};
    use crate::domain::entity::user::User;
    use crate::domain::repository::{SessionRepository, UserRepository};
    use crate::domain::value_object::{
        user_id::UserId, user_name::UserName, user_status::UserStatus,
    };
    use crate::error::{AuthError, AuthResult};

    fn sign_in(state: &State) -> SignInUseCase<MemoryAuthRepository, MemoryAuthRepository> {
        SignInUseCase::new(
            state.repo.clone(),
            state.repo.clone(),
            state.codec.clone(),
            state.config.clone(),
        )
    }

    fn input(user_name: &str, password: &str) -> SignInInput {
        SignInInput {
            user_name: user_name.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_active_user_signs_in() {
        let (repo, state) = state();
        seed_user(&repo, "alice", "secret1", UserStatus::Active).await;

        let output = sign_in(&state).execute(input("alice", "secret1")).await.unwrap();

        assert!(!output.tokens.access_token.is_empty());
        assert!(!output.tokens.refresh_token.is_empty());
        assert_eq!(output.access_token_expires_in, 600);
        assert!(output.user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let (repo, state) = state();
        seed_user(&repo, "alice", "secret1", UserStatus::Active).await;

        let wrong = sign_in(&state).execute(input("alice", "wrong")).await.unwrap_err();
        let unknown = sign_in(&state).execute(input("nobody", "secret1")).await.unwrap_err();

        assert!(matches!(wrong, AuthError::IncorrectCredentials));
        assert!(matches!(unknown, AuthError::IncorrectCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_inactive_user_is_rejected() {
        let (repo, state) = state();
        seed_user(&repo, "carol", "secret1", UserStatus::Disactive).await;

        let err = sign_in(&state).execute(input("carol", "secret1")).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountInactive));
    }

    #[tokio::test]
    async fn test_stored_expiry_matches_token_claims() {
        let (repo, state) = state();
        let user = seed_user(&repo, "alice", "secret1", UserStatus::Active).await;

        let output = sign_in(&state).execute(input("alice", "secret1")).await.unwrap();
        let claims = state.codec.decode_claims(&output.tokens.access_token).unwrap();
        let session = repo.find_session(&user.user_id).await.unwrap().unwrap();

        assert_eq!(claims.exp, session.tokens.access_token_expires.timestamp());
        assert_eq!(claims.id, user.user_id);
        assert_eq!(session.tokens, output.tokens);
    }

    #[tokio::test]
    async fn test_second_sign_in_supersedes_first() {
        let (repo, state) = state();
        seed_user(&repo, "alice", "secret1", UserStatus::Active).await;

        let first = sign_in(&state).execute(input("alice", "secret1")).await.unwrap();
        let second = sign_in(&state).execute(input("alice", "secret1")).await.unwrap();

        // Still a well-formed token, but no longer the session's
        assert!(state.codec.decode(&first.tokens.access_token).is_some());
        let guard = state.access_guard();
        assert!(matches!(
            guard.resolve(&first.tokens.access_token).await,
            Err(AuthError::CouldNotValidateCredentials)
        ));
        assert!(guard.resolve(&second.tokens.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_long_life_pair_uses_multiplied_lifetimes() {
        let (repo, state) = state();
        let user = seed_user(&repo, "alice", "secret1", UserStatus::Active).await;

        let output = sign_in(&state).issue_long_life(&user.user_id).await.unwrap();
        let claims = state.codec.decode_claims(&output.tokens.access_token).unwrap();

        assert_eq!(output.access_token_expires_in, 600 * 720);
        let remaining = claims.exp - chrono::Utc::now().timestamp();
        assert!(remaining > 600 * 719 && remaining <= 600 * 720);
    }

    #[tokio::test]
    async fn test_outdated_hash_is_upgraded_on_sign_in() {
        let (repo, state) = state();
        let user = seed_user(&repo, "alice", "secret1", UserStatus::Active).await;

        let mut config = (*state.config).clone();
        config.password_hash = HashAlgorithm::Bcrypt { cost: 5 };
        let use_case = SignInUseCase::new(
            state.repo.clone(),
            state.repo.clone(),
            state.codec.clone(),
            Arc::new(config),
        );
        use_case.execute(input("alice", "secret1")).await.unwrap();

        let stored = repo.find_by_id(&user.user_id).await.unwrap().unwrap();
        assert!(stored.password_hash.as_str().starts_with("$2b$05$"));
        assert!(sign_in(&state).execute(input("alice", "secret1")).await.is_ok());
    }

    /// Deactivates the account right after the credential lookup, as an
    /// admin acting while the password is being verified would
    struct DeactivatedMidLogin(MemoryAuthRepository);

    impl UserRepository for DeactivatedMidLogin {
        async fn create(&self, user: &User) -> AuthResult<()> {
            self.0.create(user).await
        }

        async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
            self.0.find_by_id(user_id).await
        }

        async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
            let found = self.0.find_by_user_name(user_name).await?;
            if let Some(user) = &found {
                ManageUserUseCase::new(Arc::new(self.0.clone()))
                    .deactivate(&user.user_id)
                    .await?;
            }
            Ok(found)
        }

        async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
            self.0.exists_by_user_name(user_name).await
        }

        async fn update_profile(&self, user: &User) -> AuthResult<()> {
            self.0.update_profile(user).await
        }

        async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
            self.0.record_login(user_id, at).await
        }

        async fn set_password_hash(
            &self,
            user_id: &UserId,
            password_hash: &HashedPassword,
            at: DateTime<Utc>,
        ) -> AuthResult<()> {
            self.0.set_password_hash(user_id, password_hash, at).await
        }

        async fn set_status(
            &self,
            user_id: &UserId,
            status: UserStatus,
            at: DateTime<Utc>,
        ) -> AuthResult<()> {
            self.0.set_status(user_id, status, at).await
        }
    }

    #[tokio::test]
    async fn test_sign_in_keeps_concurrent_deactivation() {
        let (repo, state) = state();
        let user = seed_user(&repo, "alice", "secret1", UserStatus::Active).await;

        // A higher cost also sends the login through the rehash write
        let mut config = (*state.config).clone();
        config.password_hash = HashAlgorithm::Bcrypt { cost: 5 };
        let use_case = SignInUseCase::new(
            Arc::new(DeactivatedMidLogin(repo.clone())),
            state.repo.clone(),
            state.codec.clone(),
            Arc::new(config),
        );
        let output = use_case.execute(input("alice", "secret1")).await.unwrap();

        let stored = repo.find_by_id(&user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.user_status, UserStatus::Disactive);
        assert!(stored.last_login_at.is_some());
        assert!(stored.password_hash.as_str().starts_with("$2b$05$"));

        let err = state
            .access_guard()
            .resolve_active(&output.tokens.access_token)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Inactive user");
    }
}

#[cfg(test)]
mod refresh_tests {
    use super::support::*;
    use crate::application::token::TokenClaims;
    use crate::application::{RefreshTokenInput, RefreshTokenUseCase, SignInInput, SignInUseCase};
    use crate::domain::entity::session::TokenPair;
    use crate::domain::repository::SessionRepository;
    use crate::domain::value_object::user_status::UserStatus;
    use crate::error::AuthError;
    use chrono::{DateTime, Utc};

    fn refresh(state: &State) -> RefreshTokenUseCase<crate::MemoryAuthRepository, crate::MemoryAuthRepository> {
        RefreshTokenUseCase::new(
            state.repo.clone(),
            state.repo.clone(),
            state.codec.clone(),
            state.config.clone(),
        )
    }

    async fn signed_in(state: &State) -> TokenPair {
        SignInUseCase::new(
            state.repo.clone(),
            state.repo.clone(),
            state.codec.clone(),
            state.config.clone(),
        )
        .execute(SignInInput {
            user_name: "alice".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap()
        .tokens
    }

    #[tokio::test]
    async fn test_wrong_grant_type_is_rejected_before_decoding() {
        let (_, state) = state();

        // A garbage token would otherwise fail as CouldNotValidateCredentials
        let err = refresh(&state)
            .execute(RefreshTokenInput {
                grant_type: "wrong_type".into(),
                refresh_token: "garbage".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn test_undecodable_refresh_token() {
        let (_, state) = state();
        let err = refresh(&state)
            .execute(RefreshTokenInput {
                grant_type: "refresh_token".into(),
                refresh_token: "garbage".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::CouldNotValidateCredentials));
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_is_single_use() {
        let (repo, state) = state();
        seed_user(&repo, "alice", "secret1", UserStatus::Active).await;
        let tokens = signed_in(&state).await;

        let rotated = refresh(&state)
            .execute(RefreshTokenInput {
                grant_type: "refresh_token".into(),
                refresh_token: tokens.refresh_token.clone(),
            })
            .await
            .unwrap();
        assert_ne!(rotated.refresh_token, tokens.refresh_token);

        let replay = refresh(&state)
            .execute(RefreshTokenInput {
                grant_type: "refresh_token".into(),
                refresh_token: tokens.refresh_token,
            })
            .await
            .unwrap_err();
        assert!(matches!(replay, AuthError::InvalidOrExpiredToken));

        // The new access token is the live one
        assert!(state.access_guard().resolve(&rotated.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_refresh_token_is_rejected_even_when_stored() {
        let (repo, state) = state();
        let user = seed_user(&repo, "alice", "secret1", UserStatus::Active).await;

        let exp = Utc::now().timestamp() - 10;
        let refresh_token = state
            .codec
            .encode(&TokenClaims::for_user(&user, exp))
            .unwrap();
        let expires = DateTime::from_timestamp(exp, 0).unwrap();
        repo.upsert_session(
            &user.user_id,
            &TokenPair {
                access_token: "unused".into(),
                access_token_expires: expires,
                refresh_token: refresh_token.clone(),
                refresh_token_expires: expires,
            },
        )
        .await
        .unwrap();

        let err = refresh(&state)
            .execute(RefreshTokenInput {
                grant_type: "refresh_token".into(),
                refresh_token,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredToken));
    }
}

#[cfg(test)]
mod guard_tests {
    use super::support::*;
    use chrono::{DateTime, Utc};

    use crate::application::token::TokenClaims;
    use crate::application::{PermissionGuard, SignInInput, SignInUseCase};
    use crate::domain::entity::{organization_role::OrganizationRole, session::TokenPair};
    use crate::domain::repository::{SessionRepository, UserRepository};
    use crate::domain::value_object::user_status::UserStatus;
    use crate::error::AuthError;

    async fn access_token(state: &State, name: &str) -> String {
        SignInUseCase::new(
            state.repo.clone(),
            state.repo.clone(),
            state.codec.clone(),
            state.config.clone(),
        )
        .execute(SignInInput {
            user_name: name.into(),
            password: "secret1".into(),
        })
        .await
        .unwrap()
        .tokens
        .access_token
    }

    #[tokio::test]
    async fn test_garbage_bearer_is_rejected_and_soft_variant_is_none() {
        let (_, state) = state();
        let guard = state.access_guard();

        assert!(matches!(
            guard.resolve("not-a-token").await,
            Err(AuthError::CouldNotValidateCredentials)
        ));
        assert!(guard.resolve_optional(Some("not-a-token")).await.is_none());
        assert!(guard.resolve_optional(None).await.is_none());
    }

    #[tokio::test]
    async fn test_deactivated_after_login_fails_active_check() {
        let (repo, state) = state();
        let mut user = seed_user(&repo, "alice", "secret1", UserStatus::Active).await;
        let token = access_token(&state, "alice").await;

        user = repo.find_by_id(&user.user_id).await.unwrap().unwrap();
        user.deactivate();
        repo.set_status(&user.user_id, user.user_status, user.updated_at)
            .await
            .unwrap();

        let guard = state.access_guard();
        assert!(guard.resolve(&token).await.is_ok());
        let err = guard.resolve_active(&token).await.unwrap_err();
        assert_eq!(err.to_string(), "Inactive user");
    }

    #[tokio::test]
    async fn test_expired_access_token_is_rejected_even_when_stored() {
        let (repo, state) = state();
        let user = seed_user(&repo, "alice", "secret1", UserStatus::Active).await;

        let exp = Utc::now().timestamp() - 10;
        let token = state.codec.encode(&TokenClaims::for_user(&user, exp)).unwrap();
        let expires = DateTime::from_timestamp(exp, 0).unwrap();
        repo.upsert_session(
            &user.user_id,
            &TokenPair {
                access_token: token.clone(),
                access_token_expires: expires,
                refresh_token: "unused".into(),
                refresh_token_expires: expires + chrono::TimeDelta::days(30),
            },
        )
        .await
        .unwrap();

        let guard = state.access_guard();
        assert!(matches!(
            guard.resolve(&token).await,
            Err(AuthError::CouldNotValidateCredentials)
        ));
        assert!(guard.resolve_optional(Some(&token)).await.is_none());
    }

    #[tokio::test]
    async fn test_permission_guard_reads_roles_at_check_time() {
        let (repo, state) = state();
        let mut user = seed_user(&repo, "alice", "secret1", UserStatus::Active).await;
        let guard = PermissionGuard::new(["user:create"]);

        let err = guard.check(&state.repo, &user).await.unwrap_err();
        assert_eq!(err.to_string(), "User is not role permission");

        let reader = OrganizationRole::new("reader", ["user:read"]);
        user.organization_role_ids.push(reader.role_id);
        repo.insert_role(reader).await;
        assert!(guard.check(&state.repo, &user).await.is_err());

        let admin = OrganizationRole::new("admin", ["user:create", "user:delete"]);
        user.organization_role_ids.push(admin.role_id);
        repo.insert_role(admin).await;
        assert!(guard.check(&state.repo, &user).await.is_ok());
    }
}

#[cfg(test)]
mod user_admin_tests {
    use super::support::*;
    use crate::application::{
        ChangePasswordInput, ChangePasswordUseCase, CreateUserInput, CreateUserUseCase,
        ManageUserUseCase, UserChanges,
    };
    use crate::domain::entity::user::PersonName;
    use crate::domain::value_object::{user_id::UserId, user_status::UserStatus};
    use crate::error::AuthError;

    fn create_input(name: &str, password: &str) -> CreateUserInput {
        CreateUserInput {
            user_name: name.into(),
            password: password.into(),
            email: Some("Dave@Example.com".into()),
            name: PersonName::default(),
        }
    }

    #[tokio::test]
    async fn test_create_user_defaults_and_uniqueness() {
        let (_, state) = state();
        let use_case = CreateUserUseCase::new(state.repo.clone(), state.config.clone());

        let user = use_case
            .execute(create_input("dave", "tangerine-kettle-7"))
            .await
            .unwrap();
        assert!(user.is_active());
        assert_eq!(user.roles, vec!["user".to_string()]);
        assert_eq!(user.email.as_ref().map(|e| e.as_str()), Some("dave@example.com"));

        let dup = use_case
            .execute(create_input("dave", "another-kettle-8"))
            .await
            .unwrap_err();
        assert!(matches!(dup, AuthError::UserNameTaken));
    }

    #[tokio::test]
    async fn test_create_user_applies_password_policy() {
        let (_, state) = state();
        let use_case = CreateUserUseCase::new(state.repo.clone(), state.config.clone());

        let err = use_case.execute(create_input("erin", "short")).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordValidation(_)));
    }

    #[tokio::test]
    async fn test_patch_keeps_absent_fields_and_put_replaces() {
        let (repo, state) = state();
        let user = seed_user(&repo, "alice", "secret1", UserStatus::Active).await;
        let manage = ManageUserUseCase::new(state.repo.clone());

        let patched = manage
            .update(
                &user.user_id,
                UserChanges {
                    first_name: Some("Alicia".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.first_name, "Alicia");
        assert_eq!(patched.last_name, "Liddell");

        let replaced = manage
            .update(
                &user.user_id,
                UserChanges::replace_all(
                    PersonName {
                        first_name: "Al".into(),
                        ..Default::default()
                    },
                    None,
                ),
            )
            .await
            .unwrap();
        assert_eq!(replaced.first_name, "Al");
        assert_eq!(replaced.last_name, "");
        assert!(replaced.email.is_none());
    }

    #[tokio::test]
    async fn test_deactivate_and_missing_user() {
        let (repo, state) = state();
        let user = seed_user(&repo, "alice", "secret1", UserStatus::Active).await;
        let manage = ManageUserUseCase::new(state.repo.clone());

        let deactivated = manage.deactivate(&user.user_id).await.unwrap();
        assert_eq!(deactivated.user_status, UserStatus::Disactive);
        assert_eq!(manage.get(&user.user_id).await.unwrap().user_status, UserStatus::Disactive);

        assert!(matches!(
            manage.get(&UserId::new()).await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let (repo, state) = state();
        let user = seed_user(&repo, "alice", "secret1", UserStatus::Active).await;
        let use_case = ChangePasswordUseCase::new(state.repo.clone(), state.config.clone());

        let err = use_case
            .execute(
                user.clone(),
                ChangePasswordInput {
                    current_password: "wrong".into(),
                    new_password: "tangerine-kettle-7".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::IncorrectCurrentPassword));

        use_case
            .execute(
                user,
                ChangePasswordInput {
                    current_password: "secret1".into(),
                    new_password: "tangerine-kettle-7".into(),
                },
            )
            .await
            .unwrap();
    }
}

#[cfg(test)]
mod router_tests {
    use super::support::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::{Router, middleware, routing::get};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::application::RoleGuard;
    use crate::domain::entity::organization_role::OrganizationRole;
    use crate::domain::value_object::user_status::UserStatus;
    use crate::presentation::{OptionalUser, auth_router, authenticate, ensure_roles, users_router};
    use crate::MemoryAuthRepository;

    fn app(state: State) -> Router {
        Router::new()
            .nest("/api/v1/auth", auth_router(state.clone()))
            .nest("/api/v1/users", users_router(state))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn login(app: &Router, name: &str) -> String {
        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/v1/auth/sign-in",
                None,
                json!({"username": name, "password": "secret1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn grant_admin(repo: &MemoryAuthRepository, name: &str) {
        let admin = OrganizationRole::new("admin", ["user:create", "user:delete"]);
        let role_id = admin.role_id;
        repo.insert_role(admin).await;

        let mut user = seed_user(repo, name, "secret1", UserStatus::Active).await;
        user.organization_role_ids.push(role_id);
        repo.insert_user(user).await;
    }

    #[tokio::test]
    async fn test_form_login_returns_token_response() {
        let (repo, state) = state();
        seed_user(&repo, "alice", "secret1", UserStatus::Active).await;
        let app = app(state);

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(
                "grant_type=password&username=alice&password=secret1&scope=me+items",
            ))
            .unwrap();
        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        assert_eq!(body["access_token_expires_in"], 600);
        assert_eq!(body["user_info"]["username"], "alice");
        assert_eq!(body["user_info"]["status"], "active");
        assert!(body["user_info"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_failed_login_is_problem_json() {
        let (_, state) = state();
        let app = app(state);

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/sign-in",
                None,
                json!({"username": "ghost", "password": "secret1"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 401);
        assert_eq!(body["detail"], "Incorrect username or password");
    }

    #[tokio::test]
    async fn test_me_requires_bearer() {
        let (repo, state) = state();
        seed_user(&repo, "alice", "secret1", UserStatus::Active).await;
        let app = app(state);
        let token = login(&app, "alice").await;

        let (status, body) = send(&app, get_request("/api/v1/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");

        let (status, _) = send(&app, get_request("/api/v1/auth/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, get_request("/api/v1/auth/me", Some("garbage"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_endpoint() {
        let (repo, state) = state();
        seed_user(&repo, "alice", "secret1", UserStatus::Active).await;
        let app = app(state);

        let (_, signed) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/sign-in",
                None,
                json!({"username": "alice", "password": "secret1"}),
            ),
        )
        .await;
        let refresh_token = signed["refresh_token"].as_str().unwrap();

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/refresh_token",
                None,
                json!({"grant_type": "wrong_type", "refresh_token": refresh_token}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid token or expired token.");

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/refresh_token",
                None,
                json!({"grant_type": "refresh_token", "refresh_token": refresh_token}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["access_token"].is_string());
        assert!(body["refresh_token_expires"].is_string());
    }

    #[tokio::test]
    async fn test_create_user_requires_permission() {
        let (repo, state) = state();
        seed_user(&repo, "alice", "secret1", UserStatus::Active).await;
        grant_admin(&repo, "root").await;
        let app = app(state);

        let new_user = json!({
            "username": "dave",
            "password": "tangerine-kettle-7",
            "title_name": "Mr",
            "first_name": "Dave",
            "last_name": "Bowman"
        });

        let plain = login(&app, "alice").await;
        let (status, body) = send(
            &app,
            json_request("POST", "/api/v1/users", Some(&plain), new_user.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "User is not role permission");

        let admin = login(&app, "root").await;
        let (status, body) = send(
            &app,
            json_request("POST", "/api/v1/users", Some(&admin), new_user.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "dave");
        assert_eq!(body["roles"], json!(["user"]));

        let (status, _) = send(
            &app,
            json_request("POST", "/api/v1/users", Some(&admin), new_user),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_log_in() {
        let (repo, state) = state();
        let alice = seed_user(&repo, "alice", "secret1", UserStatus::Active).await;
        grant_admin(&repo, "root").await;
        let app = app(state);
        let admin = login(&app, "root").await;

        let uri = format!("/api/v1/users/{}/disactive", alice.user_id);
        let (status, body) = send(
            &app,
            json_request("DELETE", &uri, Some(&admin), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "disactive");

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/sign-in",
                None,
                json!({"username": "alice", "password": "secret1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Account is not active");
    }

    #[tokio::test]
    async fn test_patch_user_over_http() {
        let (repo, state) = state();
        let alice = seed_user(&repo, "alice", "secret1", UserStatus::Active).await;
        let app = app(state);
        let token = login(&app, "alice").await;

        let uri = format!("/api/v1/users/{}", alice.user_id);
        let (status, body) = send(
            &app,
            json_request("PATCH", &uri, Some(&token), json!({"last_name": "Pleasance"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["first_name"], "Alice");
        assert_eq!(body["last_name"], "Pleasance");
    }

    #[tokio::test]
    async fn test_role_layer_and_optional_user() {
        let (repo, state) = state();
        seed_user(&repo, "alice", "secret1", UserStatus::Active).await;
        let token = login(&app(state.clone()), "alice").await;

        async fn whoami(OptionalUser(user): OptionalUser) -> String {
            user.map(|u| u.user_name.to_string()).unwrap_or_default()
        }

        let staff_only = Router::new()
            .route("/staff", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(
                Arc::new(RoleGuard::new(["staff"])),
                ensure_roles,
            ))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                authenticate::<MemoryAuthRepository>,
            ));
        let app = Router::new()
            .route("/whoami", get(whoami))
            .merge(staff_only)
            .with_state(state);

        let (status, body) = send(&app, get_request("/staff", Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "User is not role staff");

        let response = app
            .clone()
            .oneshot(get_request("/whoami", Some(&token)))
            .await
            .unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"alice");

        let response = app.oneshot(get_request("/whoami", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }
}
