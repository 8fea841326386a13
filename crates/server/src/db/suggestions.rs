use sqlx::PgPool;

use super::is_missing_reference;
use crate::models::Suggestion;

pub async fn list_suggestions(
    db: &PgPool,
    for_user: Option<i32>,
) -> Result<Vec<Suggestion>, sqlx::Error> {
    sqlx::query_as::<_, Suggestion>(
        "SELECT
            s.id,
            s.suggested_by,
            p.name AS suggested_by_name,
            s.title,
            s.description,
            s.created_at,
            s.claimed_by,
            cp.name AS claimed_by_name,
            (SELECT COUNT(*) FROM suggestion_votes sv WHERE sv.suggestion_id = s.id) AS vote_count,
            EXISTS(
                SELECT 1 FROM suggestion_votes sv
                WHERE sv.suggestion_id = s.id AND sv.voter_id = $1
            ) AS voted_by_current_user
         FROM suggestions s
         JOIN people p ON p.id = s.suggested_by
         LEFT JOIN people cp ON cp.id = s.claimed_by
         ORDER BY s.created_at DESC, s.id DESC",
    )
    .bind(for_user)
    .fetch_all(db)
    .await
}

/// Returns the new suggestion, or `None` when `suggested_by` does not exist.
pub async fn create_suggestion(
    db: &PgPool,
    suggested_by: i32,
    title: &str,
    description: Option<&str>,
) -> Result<Option<Suggestion>, sqlx::Error> {
    let result = sqlx::query_as::<_, Suggestion>(
        "WITH s AS (
            INSERT INTO suggestions (suggested_by, title, description)
            VALUES ($1, $2, $3)
            RETURNING *
         )
         SELECT
            s.id,
            s.suggested_by,
            p.name AS suggested_by_name,
            s.title,
            s.description,
            s.created_at,
            s.claimed_by,
            NULL::VARCHAR AS claimed_by_name,
            0::BIGINT AS vote_count,
            FALSE AS voted_by_current_user
         FROM s
         JOIN people p ON p.id = s.suggested_by",
    )
    .bind(suggested_by)
    .bind(title)
    .bind(description)
    .fetch_optional(db)
    .await;

    match result {
        Err(err) if is_missing_reference(&err) => Ok(None),
        other => other,
    }
}

/// Same single-statement toggle as topic votes.
pub async fn toggle_suggestion_vote(
    db: &PgPool,
    suggestion_id: i32,
    voter_id: i32,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "WITH removed AS (
            DELETE FROM suggestion_votes
            WHERE suggestion_id = $1 AND voter_id = $2
            RETURNING id
         ),
         target AS (
            SELECT 1 FROM suggestions s, people p WHERE s.id = $1 AND p.id = $2
         ),
         added AS (
            INSERT INTO suggestion_votes (suggestion_id, voter_id)
            SELECT $1, $2 FROM target
            WHERE NOT EXISTS (SELECT 1 FROM removed)
            ON CONFLICT (suggestion_id, voter_id) DO NOTHING
            RETURNING id
         )
         SELECT EXISTS (SELECT 1 FROM target) AND NOT EXISTS (SELECT 1 FROM removed)",
    )
    .bind(suggestion_id)
    .bind(voter_id)
    .fetch_one(db)
    .await
}

/// Claims the suggestion for `claimer_id`, or releases it if they already
/// hold it. Anyone may take over someone else's claim.
///
/// Returns `true` when `claimer_id` holds the claim afterwards. Unknown
/// suggestion or claimer reports `false`.
pub async fn claim_suggestion(
    db: &PgPool,
    suggestion_id: i32,
    claimer_id: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query_scalar::<_, Option<i32>>(
        "UPDATE suggestions
         SET claimed_by = CASE WHEN claimed_by = $2 THEN NULL ELSE $2 END
         WHERE id = $1
         RETURNING claimed_by",
    )
    .bind(suggestion_id)
    .bind(claimer_id)
    .fetch_optional(db)
    .await;

    match result {
        Ok(row) => Ok(row.flatten() == Some(claimer_id)),
        Err(err) if is_missing_reference(&err) => Ok(false),
        Err(err) => Err(err),
    }
}
