use async_trait::async_trait;
use auth::Role;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FullName;
use crate::domain::user::models::User;
use crate::domain::user::models::UserChange;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const COLUMNS: &str =
    "id, email, full_name, password_hash, role, is_active, is_verified, created_at, updated_at";

/// PostgreSQL implementation of UserRepository.
///
/// Timestamps come from the database clock. A change always moves
/// `updated_at` forward by at least one microsecond, so two changes of the
/// same user never share a commit timestamp. Each change is a single
/// `UPDATE ... RETURNING`, so the returned row is the committed state.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, email, full_name, password_hash, role, is_active, is_verified,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user.id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.full_name.as_str())
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.is_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, user.email.as_str()))?;

        row_to_user(&row)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn apply(&self, id: &UserId, change: UserChange) -> Result<User, UserError> {
        let statement = format!(
            r#"
            UPDATE users
            SET {},
                updated_at = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond')
            WHERE id = $1
            RETURNING {COLUMNS}
            "#,
            assignments(&change)
        );

        let query = sqlx::query(&statement).bind(id.as_uuid());
        let query = match &change {
            UserChange::FullName(full_name) => query.bind(full_name.as_str()),
            UserChange::Email(email) => query.bind(email.as_str()),
            UserChange::PasswordHash(password_hash) => query.bind(password_hash.as_str()),
            UserChange::Status(command) => query
                .bind(command.role.map(|role| role.as_str()))
                .bind(command.is_active)
                .bind(command.is_verified),
        };

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match &change {
                UserChange::Email(email) => write_error(e, email.as_str()),
                _ => UserError::DatabaseError(e.to_string()),
            })?;

        match row {
            Some(row) => row_to_user(&row),
            None => Err(UserError::NotFound(id.to_string())),
        }
    }
}

/// Columns written by a change; `$1` is always the user id.
fn assignments(change: &UserChange) -> &'static str {
    match change {
        UserChange::FullName(_) => "full_name = $2",
        UserChange::Email(_) => "email = $2",
        UserChange::PasswordHash(_) => "password_hash = $2",
        UserChange::Status(_) => {
            "role = COALESCE($2, role), \
             is_active = COALESCE($3, is_active), \
             is_verified = COALESCE($4, is_verified)"
        }
    }
}

fn write_error(e: sqlx::Error, email: &str) -> UserError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
            return UserError::EmailAlreadyExists(email.to_string());
        }
    }
    UserError::DatabaseError(e.to_string())
}

fn row_to_user(row: &PgRow) -> Result<User, UserError> {
    let role: String = row.try_get("role").map_err(read_error)?;
    let role = role
        .parse::<Role>()
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

    Ok(User {
        id: UserId(row.try_get("id").map_err(read_error)?),
        email: EmailAddress::new(row.try_get("email").map_err(read_error)?)?,
        full_name: FullName::new(row.try_get("full_name").map_err(read_error)?)?,
        password_hash: row.try_get("password_hash").map_err(read_error)?,
        role,
        is_active: row.try_get("is_active").map_err(read_error)?,
        is_verified: row.try_get("is_verified").map_err(read_error)?,
        created_at: row.try_get("created_at").map_err(read_error)?,
        updated_at: row.try_get("updated_at").map_err(read_error)?,
    })
}

fn read_error(e: sqlx::Error) -> UserError {
    UserError::DatabaseError(e.to_string())
}
