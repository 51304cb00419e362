//! Marketing content shown on the public site: teachers, dance studios,
//! attractions and the workshop schedule.

use crate::error::AppError;
use crate::models::{Attraction, DanceStudio, ScheduleItem, Teacher};
use serde::Deserialize;
use sqlx::SqlitePool;

fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        Err(AppError::validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

async fn delete_from(pool: &SqlitePool, table: &str, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherInput {
    pub name: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub teaching_style: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub image_offset_y: i64,
    #[serde(default)]
    pub display_order: i64,
}

impl TeacherInput {
    pub fn validate(self) -> Result<Self, AppError> {
        require(&self.name, "Teacher name")?;
        Ok(self)
    }
}

pub async fn list_teachers(pool: &SqlitePool) -> Result<Vec<Teacher>, AppError> {
    sqlx::query_as("SELECT * FROM teachers ORDER BY display_order, id")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn create_teacher(pool: &SqlitePool, input: TeacherInput) -> Result<Teacher, AppError> {
    sqlx::query_as(
        "INSERT INTO teachers
         (name, photo, teaching_style, country, country_code, image_offset_y, display_order)
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.photo)
    .bind(input.teaching_style)
    .bind(input.country)
    .bind(input.country_code)
    .bind(input.image_offset_y)
    .bind(input.display_order)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

pub async fn update_teacher(
    pool: &SqlitePool,
    id: i64,
    input: TeacherInput,
) -> Result<Option<Teacher>, AppError> {
    sqlx::query_as(
        "UPDATE teachers SET name = ?, photo = ?, teaching_style = ?, country = ?, country_code = ?,
         image_offset_y = ?, display_order = ? WHERE id = ? RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.photo)
    .bind(input.teaching_style)
    .bind(input.country)
    .bind(input.country_code)
    .bind(input.image_offset_y)
    .bind(input.display_order)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

pub async fn delete_teacher(pool: &SqlitePool, id: i64) -> Result<bool, AppError> {
    delete_from(pool, "teachers", id).await
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioInput {
    pub name: String,
    pub logo: Option<String>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub display_order: i64,
}

impl StudioInput {
    pub fn validate(self) -> Result<Self, AppError> {
        require(&self.name, "Studio name")?;
        Ok(self)
    }
}

pub async fn list_studios(pool: &SqlitePool) -> Result<Vec<DanceStudio>, AppError> {
    sqlx::query_as("SELECT * FROM dance_studios ORDER BY display_order, id")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn create_studio(pool: &SqlitePool, input: StudioInput) -> Result<DanceStudio, AppError> {
    sqlx::query_as(
        "INSERT INTO dance_studios (name, logo, country, country_code, display_order)
         VALUES (?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.logo.filter(|l| !l.trim().is_empty()))
    .bind(input.country)
    .bind(input.country_code)
    .bind(input.display_order)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

pub async fn update_studio(
    pool: &SqlitePool,
    id: i64,
    input: StudioInput,
) -> Result<Option<DanceStudio>, AppError> {
    sqlx::query_as(
        "UPDATE dance_studios
         SET name = ?, logo = ?, country = ?, country_code = ?, display_order = ?
         WHERE id = ? RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.logo.filter(|l| !l.trim().is_empty()))
    .bind(input.country)
    .bind(input.country_code)
    .bind(input.display_order)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

pub async fn delete_studio(pool: &SqlitePool, id: i64) -> Result<bool, AppError> {
    delete_from(pool, "dance_studios", id).await
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttractionInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub badge: String,
    #[serde(default)]
    pub display_order: i64,
}

impl AttractionInput {
    pub fn validate(self) -> Result<Self, AppError> {
        require(&self.title, "Attraction title")?;
        Ok(self)
    }
}

pub async fn list_attractions(pool: &SqlitePool) -> Result<Vec<Attraction>, AppError> {
    sqlx::query_as("SELECT * FROM attractions ORDER BY display_order, id")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn create_attraction(
    pool: &SqlitePool,
    input: AttractionInput,
) -> Result<Attraction, AppError> {
    sqlx::query_as(
        "INSERT INTO attractions (title, description, image, badge, display_order)
         VALUES (?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(input.title.trim())
    .bind(input.description)
    .bind(input.image)
    .bind(input.badge)
    .bind(input.display_order)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

pub async fn update_attraction(
    pool: &SqlitePool,
    id: i64,
    input: AttractionInput,
) -> Result<Option<Attraction>, AppError> {
    sqlx::query_as(
        "UPDATE attractions SET title = ?, description = ?, image = ?, badge = ?, display_order = ?
         WHERE id = ? RETURNING *",
    )
    .bind(input.title.trim())
    .bind(input.description)
    .bind(input.image)
    .bind(input.badge)
    .bind(input.display_order)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

pub async fn delete_attraction(pool: &SqlitePool, id: i64) -> Result<bool, AppError> {
    delete_from(pool, "attractions", id).await
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    pub day: String,
    pub date_label: String,
    pub start_time: String,
    pub end_time: String,
    pub lecturer: String,
    pub dance_style: String,
    pub level: String,
    pub hall: Option<String>,
    pub color: Option<String>,
}

impl ScheduleInput {
    pub fn validate(self) -> Result<Self, AppError> {
        require(&self.day, "Day")?;
        require(&self.start_time, "Start time")?;
        require(&self.end_time, "End time")?;
        require(&self.lecturer, "Lecturer")?;
        require(&self.dance_style, "Dance style")?;
        require(&self.level, "Level")?;
        Ok(self)
    }
}

pub async fn list_schedule(pool: &SqlitePool) -> Result<Vec<ScheduleItem>, AppError> {
    sqlx::query_as(
        "SELECT * FROM schedule_items ORDER BY
         CASE lower(trim(day))
             WHEN 'monday' THEN 1 WHEN 'tuesday' THEN 2 WHEN 'wednesday' THEN 3
             WHEN 'thursday' THEN 4 WHEN 'friday' THEN 5 WHEN 'saturday' THEN 6
             WHEN 'sunday' THEN 7 ELSE 8
         END, day, start_time, id",
    )
    .fetch_all(pool)
    .await
    .map_err(AppError::from)
}

pub async fn create_schedule_item(
    pool: &SqlitePool,
    input: ScheduleInput,
) -> Result<ScheduleItem, AppError> {
    sqlx::query_as(
        "INSERT INTO schedule_items
         (day, date_label, start_time, end_time, lecturer, dance_style, level, hall, color)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(input.day)
    .bind(input.date_label)
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(input.lecturer)
    .bind(input.dance_style)
    .bind(input.level)
    .bind(input.hall)
    .bind(input.color)
    .fetch_one(pool)
    .await
    .map_err(AppError::from)
}

pub async fn update_schedule_item(
    pool: &SqlitePool,
    id: i64,
    input: ScheduleInput,
) -> Result<Option<ScheduleItem>, AppError> {
    sqlx::query_as(
        "UPDATE schedule_items
         SET day = ?, date_label = ?, start_time = ?, end_time = ?, lecturer = ?,
         dance_style = ?, level = ?, hall = ?, color = ? WHERE id = ? RETURNING *",
    )
    .bind(input.day)
    .bind(input.date_label)
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(input.lecturer)
    .bind(input.dance_style)
    .bind(input.level)
    .bind(input.hall)
    .bind(input.color)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

pub async fn delete_schedule_item(pool: &SqlitePool, id: i64) -> Result<bool, AppError> {
    delete_from(pool, "schedule_items", id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn slot(day: &str, start_time: &str) -> ScheduleInput {
        ScheduleInput {
            day: day.to_string(),
            date_label: String::new(),
            start_time: start_time.to_string(),
            end_time: "23:00".to_string(),
            lecturer: "Maria".to_string(),
            dance_style: "Zeibekiko".to_string(),
            level: "Open".to_string(),
            hall: None,
            color: None,
        }
    }

    #[tokio::test]
    async fn schedule_follows_the_week_not_the_alphabet() {
        let pool = db::connect_in_memory().await.unwrap();
        for (day, start) in [
            ("Sunday", "10:00"),
            ("Friday", "18:00"),
            ("Thursday", "20:00"),
            ("Friday", "09:30"),
        ] {
            create_schedule_item(&pool, slot(day, start)).await.unwrap();
        }

        let order: Vec<(String, String)> = list_schedule(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|item| (item.day, item.start_time))
            .collect();
        assert_eq!(
            order,
            [
                ("Thursday", "20:00"),
                ("Friday", "09:30"),
                ("Friday", "18:00"),
                ("Sunday", "10:00"),
            ]
            .map(|(d, t)| (d.to_string(), t.to_string()))
        );
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        assert!(slot("Friday", " ").validate().is_err());
        assert!(slot("", "10:00").validate().is_err());
        assert!(slot("Friday", "10:00").validate().is_ok());
    }
}
