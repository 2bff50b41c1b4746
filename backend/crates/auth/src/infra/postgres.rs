//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    organization_role::OrganizationRole,
    session::{Session, TokenPair},
    user::User,
};
use crate::domain::repository::{OrganizationRoleRepository, SessionRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, role_id::RoleId, user_id::UserId, user_name::UserName, user_status::UserStatus,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

const USER_COLUMNS: &str = r#"
    user_id,
    user_name,
    password_hash,
    user_status,
    roles,
    organization_role_ids,
    email,
    title_name,
    first_name,
    last_name,
    last_login_at,
    created_at,
    updated_at
"#;

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                user_name,
                password_hash,
                user_status,
                roles,
                organization_role_ids,
                email,
                title_name,
                first_name,
                last_name,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.user_name.as_str())
        .bind(user.password_hash.as_str())
        .bind(user.user_status.code())
        .bind(&user.roles)
        .bind(role_uuids(&user.organization_role_ids))
        .bind(user.email.as_ref().map(|e| e.as_str()))
        .bind(&user.title_name)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(AuthError::UserNameTaken),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_name = $1"
        ))
        .bind(user_name.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE user_name = $1)")
                .bind(user_name.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn update_profile(&self, user: &User) -> AuthResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                title_name = $3,
                first_name = $4,
                last_name = $5,
                updated_at = $6
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_ref().map(|e| e.as_str()))
        .bind(&user.title_name)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        found(updated)
    }

    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
        let updated = sqlx::query(
            "UPDATE users SET last_login_at = $2, updated_at = $2 WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        found(updated)
    }

    async fn set_password_hash(
        &self,
        user_id: &UserId,
        password_hash: &HashedPassword,
        at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let updated = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = $3 WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .bind(password_hash.as_str())
        .bind(at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        found(updated)
    }

    async fn set_status(
        &self,
        user_id: &UserId,
        status: UserStatus,
        at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let updated = sqlx::query(
            "UPDATE users SET user_status = $2, updated_at = $3 WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .bind(status.code())
        .bind(at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        found(updated)
    }
}

fn found(rows_affected: u64) -> AuthResult<()> {
    if rows_affected == 0 {
        return Err(AuthError::UserNotFound);
    }
    Ok(())
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgAuthRepository {
    async fn find_session(&self, user_id: &UserId) -> AuthResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                user_id,
                access_token,
                access_token_expires,
                refresh_token,
                refresh_token_expires,
                updated_at
            FROM token_sessions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    async fn create_session(&self, user_id: &UserId, tokens: &TokenPair) -> AuthResult<Session> {
        let session = Session::new(*user_id, tokens.clone());

        let result = sqlx::query(
            r#"
            INSERT INTO token_sessions (
                user_id,
                access_token,
                access_token_expires,
                refresh_token,
                refresh_token_expires,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(session.user_id.as_uuid())
        .bind(&session.tokens.access_token)
        .bind(session.tokens.access_token_expires)
        .bind(&session.tokens.refresh_token)
        .bind(session.tokens.refresh_token_expires)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(session),
            Err(e) if is_unique_violation(&e) => Err(AuthError::DuplicateSession),
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert_session(&self, user_id: &UserId, tokens: &TokenPair) -> AuthResult<Session> {
        let session = Session::new(*user_id, tokens.clone());

        // Single statement; concurrent logins resolve to last writer
        sqlx::query(
            r#"
            INSERT INTO token_sessions (
                user_id,
                access_token,
                access_token_expires,
                refresh_token,
                refresh_token_expires,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                access_token_expires = EXCLUDED.access_token_expires,
                refresh_token = EXCLUDED.refresh_token,
                refresh_token_expires = EXCLUDED.refresh_token_expires,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(session.user_id.as_uuid())
        .bind(&session.tokens.access_token)
        .bind(session.tokens.access_token_expires)
        .bind(&session.tokens.refresh_token)
        .bind(session.tokens.refresh_token_expires)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(session)
    }
}

// ============================================================================
// Organization Role Repository Implementation
// ============================================================================

impl OrganizationRoleRepository for PgAuthRepository {
    async fn find_roles_by_ids(&self, role_ids: &[RoleId]) -> AuthResult<Vec<OrganizationRole>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, OrganizationRoleRow>(
            r#"
            SELECT role_id, name, permissions
            FROM organization_roles
            WHERE role_id = ANY($1)
            "#,
        )
        .bind(role_uuids(role_ids))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrganizationRoleRow::into_role).collect())
    }
}

fn role_uuids(ids: &[RoleId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.into_uuid()).collect()
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    user_name: String,
    password_hash: String,
    user_status: String,
    roles: Vec<String>,
    organization_role_ids: Vec<Uuid>,
    email: Option<String>,
    title_name: String,
    first_name: String,
    last_name: String,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let password_hash = HashedPassword::from_hash_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {e}")))?;

        let user_status = UserStatus::from_code(&self.user_status).ok_or_else(|| {
            AuthError::Internal(format!("Invalid user_status: {}", self.user_status))
        })?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            user_name: UserName::from_db(self.user_name),
            password_hash,
            user_status,
            roles: self.roles,
            organization_role_ids: self
                .organization_role_ids
                .into_iter()
                .map(RoleId::from_uuid)
                .collect(),
            email: self.email.map(Email::from_db),
            title_name: self.title_name,
            first_name: self.first_name,
            last_name: self.last_name,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    user_id: Uuid,
    access_token: String,
    access_token_expires: DateTime<Utc>,
    refresh_token: String,
    refresh_token_expires: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            user_id: UserId::from_uuid(self.user_id),
            tokens: TokenPair {
                access_token: self.access_token,
                access_token_expires: self.access_token_expires,
                refresh_token: self.refresh_token,
                refresh_token_expires: self.refresh_token_expires,
            },
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrganizationRoleRow {
    role_id: Uuid,
    name: String,
    permissions: Vec<String>,
}

impl OrganizationRoleRow {
    fn into_role(self) -> OrganizationRole {
        OrganizationRole {
            role_id: RoleId::from_uuid(self.role_id),
            name: self.name,
            permissions: self.permissions,
        }
    }
}
