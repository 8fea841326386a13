use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::is_missing_reference;
use crate::models::Topic;

/// Columns shared by every topic listing; callers append
/// `voted_by_current_user` and the `FROM` clause.
const TOPIC_FIELDS: &str = r#"
    t.id,
    t.person_id,
    p.name AS person_name,
    t.title,
    t.description,
    t.created_at,
    COALESCE(t.discussed, FALSE) AS discussed,
    (SELECT COUNT(*) FROM topic_votes tv WHERE tv.topic_id = t.id) AS vote_count
"#;

/// Active topics, newest first, with the viewer's vote flag.
pub async fn list_topics(db: &PgPool, for_user: Option<i32>) -> Result<Vec<Topic>, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!(
        "SELECT {TOPIC_FIELDS},
            EXISTS(
                SELECT 1 FROM topic_votes tv WHERE tv.topic_id = t.id AND tv.voter_id = $1
            ) AS voted_by_current_user
         FROM topics t
         JOIN people p ON p.id = t.person_id
         WHERE t.discussed IS NOT TRUE
         ORDER BY t.created_at DESC, t.id DESC"
    ))
    .bind(for_user)
    .fetch_all(db)
    .await
}

pub async fn list_discussed_topics(db: &PgPool) -> Result<Vec<Topic>, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!(
        "SELECT {TOPIC_FIELDS}, FALSE AS voted_by_current_user
         FROM topics t
         JOIN people p ON p.id = t.person_id
         WHERE t.discussed IS TRUE
         ORDER BY t.created_at DESC, t.id DESC"
    ))
    .fetch_all(db)
    .await
}

/// Every topic owned by `person_id`, discussed or not.
pub async fn list_topics_by_person(db: &PgPool, person_id: i32) -> Result<Vec<Topic>, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!(
        "SELECT {TOPIC_FIELDS}, FALSE AS voted_by_current_user
         FROM topics t
         JOIN people p ON p.id = t.person_id
         WHERE t.person_id = $1
         ORDER BY t.created_at DESC, t.id DESC"
    ))
    .bind(person_id)
    .fetch_all(db)
    .await
}

/// Active topics created after `since` by anyone but `exclude_person`.
///
/// A person who never logged in has nothing "new", so `None` yields an empty
/// list without touching the store.
pub async fn topics_since(
    db: &PgPool,
    since: Option<DateTime<Utc>>,
    exclude_person: i32,
) -> Result<Vec<Topic>, sqlx::Error> {
    let Some(since) = since else {
        return Ok(Vec::new());
    };

    sqlx::query_as::<_, Topic>(&format!(
        "SELECT {TOPIC_FIELDS},
            EXISTS(
                SELECT 1 FROM topic_votes tv WHERE tv.topic_id = t.id AND tv.voter_id = $2
            ) AS voted_by_current_user
         FROM topics t
         JOIN people p ON p.id = t.person_id
         WHERE t.discussed IS NOT TRUE
           AND t.created_at > $1
           AND t.person_id <> $2
         ORDER BY t.created_at DESC, t.id DESC"
    ))
    .bind(since)
    .bind(exclude_person)
    .fetch_all(db)
    .await
}

/// Returns the new topic, or `None` when `person_id` does not exist.
pub async fn create_topic(
    db: &PgPool,
    person_id: i32,
    title: &str,
    description: Option<&str>,
) -> Result<Option<Topic>, sqlx::Error> {
    let result = sqlx::query_as::<_, Topic>(
        "WITH t AS (
            INSERT INTO topics (person_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING *
         )
         SELECT
            t.id,
            t.person_id,
            p.name AS person_name,
            t.title,
            t.description,
            t.created_at,
            COALESCE(t.discussed, FALSE) AS discussed,
            0::BIGINT AS vote_count,
            FALSE AS voted_by_current_user
         FROM t
         JOIN people p ON p.id = t.person_id",
    )
    .bind(person_id)
    .bind(title)
    .bind(description)
    .fetch_optional(db)
    .await;

    match result {
        Err(err) if is_missing_reference(&err) => Ok(None),
        other => other,
    }
}

/// Only the owner may edit; returns whether a row changed.
pub async fn update_topic(
    db: &PgPool,
    topic_id: i32,
    person_id: i32,
    title: &str,
    description: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE topics SET title = $3, description = $4
         WHERE id = $1 AND person_id = $2",
    )
    .bind(topic_id)
    .bind(person_id)
    .bind(title)
    .bind(description)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Only the owner may delete; votes go with the topic.
pub async fn delete_topic(db: &PgPool, topic_id: i32, person_id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM topics WHERE id = $1 AND person_id = $2")
        .bind(topic_id)
        .bind(person_id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn mark_discussed(db: &PgPool, topic_id: i32, discussed: bool) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE topics SET discussed = $2 WHERE id = $1")
        .bind(topic_id)
        .bind(discussed)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Adds the vote if absent, removes it otherwise, in one statement.
///
/// Returns `true` when the voter now has a vote on the topic. A concurrent
/// duplicate insert is absorbed by `ON CONFLICT` and still reports `true`.
/// Unknown topic or voter reports `false` and changes nothing.
pub async fn toggle_topic_vote(db: &PgPool, topic_id: i32, voter_id: i32) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "WITH removed AS (
            DELETE FROM topic_votes
            WHERE topic_id = $1 AND voter_id = $2
            RETURNING id
         ),
         target AS (
            SELECT 1 FROM topics t, people p WHERE t.id = $1 AND p.id = $2
         ),
         added AS (
            INSERT INTO topic_votes (topic_id, voter_id)
            SELECT $1, $2 FROM target
            WHERE NOT EXISTS (SELECT 1 FROM removed)
            ON CONFLICT (topic_id, voter_id) DO NOTHING
            RETURNING id
         )
         SELECT EXISTS (SELECT 1 FROM target) AND NOT EXISTS (SELECT 1 FROM removed)",
    )
    .bind(topic_id)
    .bind(voter_id)
    .fetch_one(db)
    .await
}
