use async_trait::async_trait;
use auth::Role;
use sqlx::postgres::PgRow;
use sqlx::PgConnection;
use sqlx::PgPool;
use sqlx::Row;
use user_facts::project;
use user_facts::shadow::FieldVersions;
use user_facts::ApplyOutcome;
use user_facts::ShadowUser;
use user_facts::UserFact;
use user_facts::UserId;

use crate::domain::shadow::errors::ShadowStoreError;
use crate::domain::shadow::ports::ShadowUserRepository;

const SELECT_BY_ID_FOR_UPDATE: &str = r#"
    SELECT id, email, full_name, password_hash, role, is_active, is_verified,
           last_applied_occurred_at, full_name_at, email_at, password_at, standing_at
    FROM shadow_users
    WHERE id = $1
    FOR UPDATE
"#;

const SELECT_BY_ID: &str = r#"
    SELECT id, email, full_name, password_hash, role, is_active, is_verified,
           last_applied_occurred_at, full_name_at, email_at, password_at, standing_at
    FROM shadow_users
    WHERE id = $1
"#;

const SELECT_BY_EMAIL: &str = r#"
    SELECT id, email, full_name, password_hash, role, is_active, is_verified,
           last_applied_occurred_at, full_name_at, email_at, password_at, standing_at
    FROM shadow_users
    WHERE email = $1
"#;

const INSERT: &str = r#"
    INSERT INTO shadow_users (
        id, email, full_name, password_hash, role, is_active, is_verified,
        last_applied_occurred_at, full_name_at, email_at, password_at, standing_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
    ON CONFLICT (id) DO NOTHING
"#;

const UPDATE: &str = r#"
    UPDATE shadow_users
    SET email = $2,
        full_name = $3,
        password_hash = $4,
        role = $5,
        is_active = $6,
        is_verified = $7,
        last_applied_occurred_at = $8,
        full_name_at = $9,
        email_at = $10,
        password_at = $11,
        standing_at = $12
    WHERE id = $1
"#;

/// PostgreSQL implementation of ShadowUserRepository.
///
/// Each fact is applied in its own transaction holding the user's row lock
/// (`SELECT ... FOR UPDATE`), so the read-decide-write on a row cannot
/// interleave with another writer of the same user.
pub struct PostgresShadowUserRepository {
    pool: PgPool,
}

impl PostgresShadowUserRepository {
    /// Create a new PostgreSQL shadow user repository.
    ///
    /// # Arguments
    /// * `pool` - PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write(
        conn: &mut PgConnection,
        user: &ShadowUser,
        existed: bool,
    ) -> Result<(), ShadowStoreError> {
        let statement = if existed { UPDATE } else { INSERT };

        let result = sqlx::query(statement)
            .bind(user.id.as_uuid())
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.is_active)
            .bind(user.is_verified)
            .bind(user.last_applied_occurred_at)
            .bind(user.versions.full_name_at)
            .bind(user.versions.email_at)
            .bind(user.versions.password_at)
            .bind(user.versions.standing_at)
            .execute(conn)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            // Another transaction created the row first.
            return Err(ShadowStoreError::Conflict(format!(
                "Shadow record for user {} was created concurrently",
                user.id
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl ShadowUserRepository for PostgresShadowUserRepository {
    async fn upsert_if_newer(&self, fact: &UserFact) -> Result<ApplyOutcome, ShadowStoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let row = sqlx::query(SELECT_BY_ID_FOR_UPDATE)
            .bind(fact.user_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error)?;

        let current = row.as_ref().map(row_to_user).transpose()?;
        let existed = current.is_some();

        let (user, outcome) = project(current, fact)?;

        if outcome == ApplyOutcome::Applied {
            Self::write(&mut tx, &user, existed).await?;
        }

        tx.commit().await.map_err(store_error)?;

        tracing::debug!(user_id = %fact.user_id, outcome = ?outcome, "Shadow user upserted");
        Ok(outcome)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<ShadowUser>, ShadowStoreError> {
        let row = sqlx::query(SELECT_BY_EMAIL)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<ShadowUser>, ShadowStoreError> {
        let row = sqlx::query(SELECT_BY_ID)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.as_ref().map(row_to_user).transpose()
    }
}

fn row_to_user(row: &PgRow) -> Result<ShadowUser, ShadowStoreError> {
    let role: String = row.try_get("role").map_err(corrupt)?;
    let role = role
        .parse::<Role>()
        .map_err(|e| ShadowStoreError::Corrupt(e.to_string()))?;

    Ok(ShadowUser {
        id: UserId(row.try_get("id").map_err(corrupt)?),
        email: row.try_get("email").map_err(corrupt)?,
        full_name: row.try_get("full_name").map_err(corrupt)?,
        password_hash: row.try_get("password_hash").map_err(corrupt)?,
        role,
        is_active: row.try_get("is_active").map_err(corrupt)?,
        is_verified: row.try_get("is_verified").map_err(corrupt)?,
        last_applied_occurred_at: row.try_get("last_applied_occurred_at").map_err(corrupt)?,
        versions: FieldVersions {
            full_name_at: row.try_get("full_name_at").map_err(corrupt)?,
            email_at: row.try_get("email_at").map_err(corrupt)?,
            password_at: row.try_get("password_at").map_err(corrupt)?,
            standing_at: row.try_get("standing_at").map_err(corrupt)?,
        },
    })
}

fn corrupt(e: sqlx::Error) -> ShadowStoreError {
    ShadowStoreError::Corrupt(e.to_string())
}

/// Unique violations, serialization failures and deadlocks resolve on retry.
fn store_error(e: sqlx::Error) -> ShadowStoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return ShadowStoreError::Conflict(db_err.message().to_string());
        }
        if matches!(db_err.code().as_deref(), Some("40001") | Some("40P01")) {
            return ShadowStoreError::Conflict(db_err.message().to_string());
        }
    }
    ShadowStoreError::Unavailable(e.to_string())
}
