use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::Person;

const PERSON_COLUMNS: &str = r#"
    p.id,
    p.name,
    p.last_login,
    (SELECT COUNT(*) FROM topics t WHERE t.person_id = p.id AND t.discussed IS NOT TRUE) AS topic_count,
    (SELECT COUNT(*) FROM topics t WHERE t.person_id = p.id AND t.discussed IS TRUE) AS discussed_count
"#;

pub async fn list_people(db: &PgPool) -> Result<Vec<Person>, sqlx::Error> {
    sqlx::query_as::<_, Person>(&format!(
        "SELECT {PERSON_COLUMNS} FROM people p ORDER BY p.name"
    ))
    .fetch_all(db)
    .await
}

pub async fn get_person(db: &PgPool, person_id: i32) -> Result<Option<Person>, sqlx::Error> {
    sqlx::query_as::<_, Person>(&format!(
        "SELECT {PERSON_COLUMNS} FROM people p WHERE p.id = $1"
    ))
    .bind(person_id)
    .fetch_optional(db)
    .await
}

pub async fn find_person_by_name(db: &PgPool, name: &str) -> Result<Option<Person>, sqlx::Error> {
    sqlx::query_as::<_, Person>(&format!(
        "SELECT {PERSON_COLUMNS} FROM people p WHERE LOWER(p.name) = LOWER($1)"
    ))
    .bind(name.trim())
    .fetch_optional(db)
    .await
}

/// Inserts a person unless the name is already taken. Returns the new id.
pub async fn insert_person(db: &PgPool, name: &str) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO people (name) VALUES ($1)
         ON CONFLICT (name) DO NOTHING
         RETURNING id",
    )
    .bind(name.trim())
    .fetch_optional(db)
    .await
}

/// Stamps the person's last login with the current time and returns it.
pub async fn update_last_login(
    db: &PgPool,
    person_id: i32,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar::<_, DateTime<Utc>>(
        "UPDATE people SET last_login = NOW() WHERE id = $1 RETURNING last_login",
    )
    .bind(person_id)
    .fetch_optional(db)
    .await
}
