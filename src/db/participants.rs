use crate::error::AppError;
use crate::models::{Participant, ParticipantRow};
use crate::pricing::{AddOns, Package};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

const ROW_SELECT: &str = "SELECT p.*, u.email AS user_email, u.name AS user_name
     FROM participants p JOIN users u ON u.id = p.user_id";

pub async fn find_by_id<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<Option<Participant>, AppError> {
    sqlx::query_as("SELECT * FROM participants WHERE id = ?")
        .bind(id)
        .fetch_optional(exec)
        .await
        .map_err(AppError::from)
}

pub async fn find_by_user<'e>(
    exec: impl SqliteExecutor<'e>,
    user_id: i64,
) -> Result<Option<Participant>, AppError> {
    sqlx::query_as("SELECT * FROM participants WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(exec)
        .await
        .map_err(AppError::from)
}

pub async fn find_row(pool: &SqlitePool, id: i64) -> Result<Option<ParticipantRow>, AppError> {
    sqlx::query_as(&format!("{ROW_SELECT} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

pub async fn list(
    pool: &SqlitePool,
    include_deleted: bool,
) -> Result<Vec<ParticipantRow>, AppError> {
    let sql = if include_deleted {
        format!("{ROW_SELECT} ORDER BY p.created_at DESC, p.id DESC")
    } else {
        format!("{ROW_SELECT} WHERE p.deleted_at IS NULL ORDER BY p.created_at DESC, p.id DESC")
    };
    sqlx::query_as(&sql)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn list_registered_by(
    pool: &SqlitePool,
    registrar_id: i64,
) -> Result<Vec<ParticipantRow>, AppError> {
    sqlx::query_as(&format!(
        "{ROW_SELECT} WHERE p.registered_by = ? ORDER BY p.created_at DESC, p.id DESC"
    ))
    .bind(registrar_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::from)
}

/// Registrant details as they will be stored. `add_ons` are the effective
/// flags (inherent add-ons already folded in) and `total_price` is the
/// computed price.
#[derive(Debug, Clone)]
pub struct RegistrationRecord {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub package: Package,
    pub add_ons: AddOns,
    pub total_price: u32,
    pub registered_by: Option<i64>,
}

/// Creates the participant for `record.user_id`, or revives and overwrites
/// a soft-deleted one. An active participant is a conflict.
pub async fn register(
    conn: &mut SqliteConnection,
    record: &RegistrationRecord,
) -> Result<Participant, AppError> {
    match find_by_user(&mut *conn, record.user_id).await? {
        Some(existing) if existing.is_active() => {
            Err(AppError::conflict("This person is already registered"))
        }
        Some(existing) => {
            tracing::info!(
                participant_id = existing.id,
                user_id = record.user_id,
                "reviving soft-deleted registration"
            );
            sqlx::query_as(
                "UPDATE participants
                 SET registrant_first_name = ?, registrant_last_name = ?, phone = ?,
                 package_type = ?, guinness_record_attempt = ?, greek_night = ?, total_price = ?,
                 registered_by = ?, checked_in = 0, deleted_at = NULL, deleted_by = NULL
                 WHERE id = ? RETURNING *",
            )
            .bind(&record.first_name)
            .bind(&record.last_name)
            .bind(&record.phone)
            .bind(record.package)
            .bind(record.add_ons.guinness)
            .bind(record.add_ons.greek_night)
            .bind(i64::from(record.total_price))
            .bind(record.registered_by)
            .bind(existing.id)
            .fetch_one(&mut *conn)
            .await
            .map_err(AppError::from)
        }
        None => sqlx::query_as(
            "INSERT INTO participants (user_id, registrant_first_name, registrant_last_name, phone,
             package_type, guinness_record_attempt, greek_night, total_price, registered_by,
             created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(record.user_id)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.phone)
        .bind(record.package)
        .bind(record.add_ons.guinness)
        .bind(record.add_ons.greek_night)
        .bind(i64::from(record.total_price))
        .bind(record.registered_by)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
        .map_err(AppError::from),
    }
}

#[derive(Debug, Clone)]
pub struct ParticipantChanges {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub package: Package,
    pub add_ons: AddOns,
    pub total_price: u32,
    pub checked_in: bool,
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    changes: &ParticipantChanges,
) -> Result<Option<Participant>, AppError> {
    sqlx::query_as(
        "UPDATE participants SET registrant_first_name = ?, registrant_last_name = ?, phone = ?,
         package_type = ?, guinness_record_attempt = ?, greek_night = ?, total_price = ?,
         checked_in = ? WHERE id = ? RETURNING *",
    )
    .bind(&changes.first_name)
    .bind(&changes.last_name)
    .bind(&changes.phone)
    .bind(changes.package)
    .bind(changes.add_ons.guinness)
    .bind(changes.add_ons.greek_night)
    .bind(i64::from(changes.total_price))
    .bind(changes.checked_in)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

pub async fn soft_delete(
    pool: &SqlitePool,
    id: i64,
    deleted_by: i64,
    now: DateTime<Utc>,
) -> Result<Option<Participant>, AppError> {
    let deleted: Option<Participant> = sqlx::query_as(
        "UPDATE participants SET deleted_at = ?, deleted_by = ?
         WHERE id = ? AND deleted_at IS NULL RETURNING *",
    )
    .bind(now)
    .bind(deleted_by)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    // Already deleted: keep the original deletion.
    match deleted {
        Some(participant) => Ok(Some(participant)),
        None => find_by_id(pool, id).await,
    }
}

pub async fn restore(pool: &SqlitePool, id: i64) -> Result<Option<Participant>, AppError> {
    sqlx::query_as(
        "UPDATE participants SET deleted_at = NULL, deleted_by = NULL WHERE id = ? RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

/// Permanently removes participants soft-deleted at or before `cutoff` and
/// returns their ids.
pub async fn purge_deleted_before(
    pool: &SqlitePool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<i64>, AppError> {
    let mut tx = pool.begin().await?;
    let deleted: Vec<(i64, DateTime<Utc>)> = sqlx::query_as(
        "SELECT id, deleted_at FROM participants WHERE deleted_at IS NOT NULL",
    )
    .fetch_all(&mut *tx)
    .await?;

    let ids: Vec<i64> = deleted
        .into_iter()
        .filter(|(_, deleted_at)| *deleted_at <= cutoff)
        .map(|(id, _)| id)
        .collect();

    for id in &ids {
        sqlx::query("DELETE FROM participants WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, users};
    use chrono::Duration;

    async fn participant_for(pool: &SqlitePool, email: &str) -> Participant {
        let user = users::create(pool, users::NewUser::without_password(email, "Test User"))
            .await
            .unwrap();
        let mut conn = pool.acquire().await.unwrap();
        register(
            &mut conn,
            &RegistrationRecord {
                user_id: user.id,
                first_name: "Test".into(),
                last_name: "User".into(),
                phone: None,
                package: Package::StarterPass,
                add_ons: AddOns::NONE,
                total_price: 70,
                registered_by: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn purge_only_removes_rows_past_the_grace_period() {
        let pool = db::connect_in_memory().await.unwrap();
        let now = Utc::now();
        let old = participant_for(&pool, "old@example.com").await;
        let recent = participant_for(&pool, "recent@example.com").await;
        let active = participant_for(&pool, "active@example.com").await;

        soft_delete(&pool, old.id, old.user_id, now - Duration::days(8)).await.unwrap();
        soft_delete(&pool, recent.id, recent.user_id, now - Duration::days(6)).await.unwrap();

        let purged = purge_deleted_before(&pool, now - Duration::days(7)).await.unwrap();
        assert_eq!(purged, vec![old.id]);
        assert!(find_by_id(&pool, old.id).await.unwrap().is_none());
        assert!(find_by_id(&pool, recent.id).await.unwrap().is_some());
        assert!(find_by_id(&pool, active.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn second_delete_keeps_the_original_timestamp() {
        let pool = db::connect_in_memory().await.unwrap();
        let now = Utc::now();
        let participant = participant_for(&pool, "twice@example.com").await;

        let first = soft_delete(&pool, participant.id, participant.user_id, now - Duration::days(8))
            .await
            .unwrap()
            .unwrap();
        let second = soft_delete(&pool, participant.id, 999, now).await.unwrap().unwrap();
        assert_eq!(second.deleted_at, first.deleted_at);
        assert_eq!(second.deleted_by, Some(participant.user_id));

        let purged = purge_deleted_before(&pool, now - Duration::days(7)).await.unwrap();
        assert_eq!(purged, vec![participant.id]);
    }

    #[tokio::test]
    async fn registering_again_revives_the_same_row() {
        let pool = db::connect_in_memory().await.unwrap();
        let original = participant_for(&pool, "again@example.com").await;
        soft_delete(&pool, original.id, original.user_id, Utc::now()).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let revived = register(
            &mut conn,
            &RegistrationRecord {
                user_id: original.user_id,
                first_name: "New".into(),
                last_name: "Name".into(),
                phone: Some("123".into()),
                package: Package::FullPass,
                add_ons: AddOns::new(true, true),
                total_price: 260,
                registered_by: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(revived.id, original.id);
        assert!(revived.is_active());
        assert_eq!(revived.package_type, Package::FullPass);
        assert_eq!(revived.registrant_first_name, "New");
    }

    #[tokio::test]
    async fn active_registration_is_a_conflict() {
        let pool = db::connect_in_memory().await.unwrap();
        let original = participant_for(&pool, "dup@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let err = register(
            &mut conn,
            &RegistrationRecord {
                user_id: original.user_id,
                first_name: "Dup".into(),
                last_name: "User".into(),
                phone: None,
                package: Package::StarterPass,
                add_ons: AddOns::NONE,
                total_price: 70,
                registered_by: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
