//! Postgres store.
//!
//! Every function is one statement (or a fixed, short sequence) against the
//! pool. Rows that do not exist or are not owned by the caller are reported as
//! `false` / `None`; only connectivity and driver failures surface as errors.

pub mod people;
pub mod suggestions;
pub mod topics;

use sqlx::{PgPool, postgres::PgPoolOptions};

pub use people::*;
pub use suggestions::*;
pub use topics::*;

/// Roster seeded by `GET /setup`.
pub const DEFAULT_PEOPLE: &[&str] = &[
    "Piotr", "Hubert", "Adrian", "Luca", "Vincenzo", "Antoni", "Jan", "Tomasz", "Maciek", "Matt",
    "Konrad", "Michal", "Basti", "Manu", "Sergey", "Peter", "Bartek", "Adi",
];

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS people (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL UNIQUE,
        last_login TIMESTAMPTZ
    )",
    "ALTER TABLE people ADD COLUMN IF NOT EXISTS last_login TIMESTAMPTZ",
    "CREATE TABLE IF NOT EXISTS topics (
        id SERIAL PRIMARY KEY,
        person_id INTEGER NOT NULL REFERENCES people(id),
        title VARCHAR(255) NOT NULL,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        discussed BOOLEAN DEFAULT FALSE
    )",
    "ALTER TABLE topics ADD COLUMN IF NOT EXISTS discussed BOOLEAN DEFAULT FALSE",
    "CREATE TABLE IF NOT EXISTS topic_votes (
        id SERIAL PRIMARY KEY,
        topic_id INTEGER NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
        voter_id INTEGER NOT NULL REFERENCES people(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (topic_id, voter_id)
    )",
    "CREATE TABLE IF NOT EXISTS suggestions (
        id SERIAL PRIMARY KEY,
        suggested_by INTEGER NOT NULL REFERENCES people(id),
        title VARCHAR(255) NOT NULL,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        claimed_by INTEGER REFERENCES people(id)
    )",
    "CREATE TABLE IF NOT EXISTS suggestion_votes (
        id SERIAL PRIMARY KEY,
        suggestion_id INTEGER NOT NULL REFERENCES suggestions(id) ON DELETE CASCADE,
        voter_id INTEGER NOT NULL REFERENCES people(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (suggestion_id, voter_id)
    )",
];

pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Creates the tables if needed and seeds `roster`. Safe to run repeatedly.
///
/// Returns how many people were newly inserted.
pub async fn setup_database(db: &PgPool, roster: &[&str]) -> Result<u64, sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(db).await?;
    }

    let mut seeded = 0;
    for name in roster {
        if insert_person(db, name).await?.is_some() {
            seeded += 1;
        }
    }

    tracing::info!("Database ready, seeded {} new people", seeded);
    Ok(seeded)
}

/// Returns true when the store rejected a write because a referenced row
/// (person, topic, suggestion) does not exist.
pub(crate) fn is_missing_reference(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_foreign_key_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_is_not_a_missing_reference() {
        assert!(!is_missing_reference(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn pool_errors_are_not_missing_references() {
        assert!(!is_missing_reference(&sqlx::Error::PoolTimedOut));
    }
}
