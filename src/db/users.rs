use crate::error::{AppError, is_unique_violation};
use crate::models::User;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{SqliteExecutor, SqlitePool};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: Option<&'a str>,
    pub is_admin: bool,
    pub is_teacher: bool,
    pub studio_name: Option<&'a str>,
}

impl<'a> NewUser<'a> {
    pub fn without_password(email: &'a str, name: &'a str) -> Self {
        Self {
            email,
            name,
            password_hash: None,
            is_admin: false,
            is_teacher: false,
            studio_name: None,
        }
    }
}

pub async fn find_by_id<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<Option<User>, AppError> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(exec)
        .await
        .map_err(AppError::from)
}

pub async fn find_by_email<'e>(
    exec: impl SqliteExecutor<'e>,
    email: &str,
) -> Result<Option<User>, AppError> {
    sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(normalize_email(email))
        .fetch_optional(exec)
        .await
        .map_err(AppError::from)
}

pub async fn create<'e>(exec: impl SqliteExecutor<'e>, new: NewUser<'_>) -> Result<User, AppError> {
    sqlx::query_as(
        "INSERT INTO users
         (email, name, password_hash, is_admin, is_teacher, studio_name, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(normalize_email(new.email))
    .bind(new.name.trim())
    .bind(new.password_hash)
    .bind(new.is_admin)
    .bind(new.is_teacher)
    .bind(new.studio_name)
    .bind(Utc::now())
    .fetch_one(exec)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::conflict("An account with this email already exists")
        } else {
            AppError::from(e)
        }
    })
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<User>, AppError> {
    sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC, id DESC")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolesPatch {
    pub is_admin: Option<bool>,
    pub is_teacher: Option<bool>,
    #[serde(default, with = "double_option")]
    pub studio_name: Option<Option<String>>,
}

mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(de).map(Some)
    }
}

pub async fn update_roles(
    pool: &SqlitePool,
    id: i64,
    patch: RolesPatch,
) -> Result<Option<User>, AppError> {
    let Some(current) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    let studio_name = match patch.studio_name {
        Some(v) => v.filter(|s| !s.trim().is_empty()),
        None => current.studio_name,
    };
    sqlx::query_as(
        "UPDATE users SET is_admin = ?, is_teacher = ?, studio_name = ? WHERE id = ? RETURNING *",
    )
    .bind(patch.is_admin.unwrap_or(current.is_admin))
    .bind(patch.is_teacher.unwrap_or(current.is_teacher))
    .bind(studio_name)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_password<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
    password_hash: &str,
    make_admin: bool,
) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET password_hash = ?, is_admin = (is_admin OR ?) WHERE id = ?")
        .bind(password_hash)
        .bind(make_admin)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(())
}

/// Gives a password to an account that was created without one (a bulk
/// registrar or student). Returns `None` when the account already has a
/// password.
pub async fn claim<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
    name: &str,
    password_hash: &str,
) -> Result<Option<User>, AppError> {
    sqlx::query_as(
        "UPDATE users SET name = ?, password_hash = ?
         WHERE id = ? AND password_hash IS NULL RETURNING *",
    )
    .bind(name.trim())
    .bind(password_hash)
    .bind(id)
    .fetch_optional(exec)
    .await
    .map_err(AppError::from)
}

/// Finds or creates the teacher/studio account behind a bulk registration
/// and records what kind of registrar it is.
pub async fn upsert_registrar(
    conn: &mut sqlx::SqliteConnection,
    email: &str,
    name: &str,
    is_teacher: bool,
    studio_name: Option<&str>,
) -> Result<User, AppError> {
    let user = match find_by_email(&mut *conn, email).await? {
        Some(user) => user,
        None => create(&mut *conn, NewUser::without_password(email, name)).await?,
    };

    sqlx::query_as(
        "UPDATE users SET is_teacher = (is_teacher OR ?), studio_name = COALESCE(?, studio_name)
         WHERE id = ? RETURNING *",
    )
    .bind(is_teacher)
    .bind(studio_name)
    .bind(user.id)
    .fetch_one(&mut *conn)
    .await
    .map_err(AppError::from)
}

pub async fn create_session(
    pool: &SqlitePool,
    token: &str,
    user_id: i64,
    expires_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_by_session(
    pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<User>, AppError> {
    let row: Option<(i64, DateTime<Utc>)> =
        sqlx::query_as("SELECT user_id, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(pool)
            .await?;
    match row {
        Some((user_id, expires_at)) if expires_at > now => find_by_id(pool, user_id).await,
        Some(_) => {
            delete_session(pool, token).await?;
            Ok(None)
        }
        None => Ok(None),
    }
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}
