//! Store behaviour against a real Postgres.
//!
//! Set `TEST_DATABASE_URL` to run these; without it every test returns early.

use std::sync::atomic::{AtomicU32, Ordering};

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use knowledge_share::{config::Roles, db, models::Person, router, state::AppState};
use sqlx::PgPool;
use tokio::sync::OnceCell;
use tower::ServiceExt;

static SCHEMA: OnceCell<()> = OnceCell::const_new();
static COUNTER: AtomicU32 = AtomicU32::new(0);

async fn pool() -> Option<PgPool> {
    pool_with(2).await
}

async fn pool_with(max_connections: u32) -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let db = db::connect(&url, max_connections).await.unwrap();
    SCHEMA
        .get_or_init(|| async {
            db::setup_database(&db, &[]).await.unwrap();
        })
        .await;
    Some(db)
}

/// Creates a person with a name no other test run uses.
async fn person(db: &PgPool, prefix: &str) -> Person {
    let name = format!(
        "{prefix}-{}-{}",
        Utc::now().timestamp_micros(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let id = db::insert_person(db, &name).await.unwrap().unwrap();
    db::get_person(db, id).await.unwrap().unwrap()
}

#[tokio::test]
async fn new_person_and_topic_show_up_in_listings() {
    let Some(db) = pool().await else { return };
    let kris = person(&db, "Kris").await;
    let other = person(&db, "Other").await;

    let people = db::list_people(&db).await.unwrap();
    let listed = people.iter().find(|p| p.id == kris.id).unwrap();
    assert_eq!(listed.topic_count, 0);
    assert_eq!(listed.discussed_count, 0);

    let topic = db::create_topic(&db, kris.id, "X", None).await.unwrap().unwrap();
    assert_eq!(topic.person_name, kris.name);
    assert_eq!(topic.vote_count, 0);

    let topics = db::list_topics(&db, Some(other.id)).await.unwrap();
    let listed = topics.iter().find(|t| t.id == topic.id).unwrap();
    assert_eq!(listed.title, "X");
    assert_eq!(listed.vote_count, 0);
    assert!(!listed.voted_by_current_user);
}

#[tokio::test]
async fn toggling_a_topic_vote_twice_restores_the_count() {
    let Some(db) = pool().await else { return };
    let owner = person(&db, "Owner").await;
    let voter = person(&db, "Voter").await;
    let topic = db::create_topic(&db, owner.id, "Rust", Some("ownership"))
        .await
        .unwrap()
        .unwrap();

    assert!(db::toggle_topic_vote(&db, topic.id, voter.id).await.unwrap());
    let listed = db::list_topics(&db, Some(voter.id)).await.unwrap();
    let voted = listed.iter().find(|t| t.id == topic.id).unwrap();
    assert_eq!(voted.vote_count, 1);
    assert!(voted.voted_by_current_user);

    assert!(!db::toggle_topic_vote(&db, topic.id, voter.id).await.unwrap());
    let listed = db::list_topics(&db, Some(voter.id)).await.unwrap();
    let unvoted = listed.iter().find(|t| t.id == topic.id).unwrap();
    assert_eq!(unvoted.vote_count, 0);
    assert!(!unvoted.voted_by_current_user);
}

#[tokio::test]
async fn voting_on_missing_rows_reports_false() {
    let Some(db) = pool().await else { return };
    let voter = person(&db, "Ghost").await;

    assert!(!db::toggle_topic_vote(&db, i32::MAX, voter.id).await.unwrap());
    assert!(!db::toggle_suggestion_vote(&db, i32::MAX, voter.id).await.unwrap());
    assert!(!db::claim_suggestion(&db, i32::MAX, voter.id).await.unwrap());
    assert!(db::create_topic(&db, i32::MAX, "nobody", None).await.unwrap().is_none());
}

#[tokio::test]
async fn only_the_owner_can_update_or_delete() {
    let Some(db) = pool().await else { return };
    let owner = person(&db, "Owner").await;
    let intruder = person(&db, "Intruder").await;
    let topic = db::create_topic(&db, owner.id, "Mine", None).await.unwrap().unwrap();

    assert!(!db::update_topic(&db, topic.id, intruder.id, "Hijacked", None).await.unwrap());
    assert!(!db::delete_topic(&db, topic.id, intruder.id).await.unwrap());

    let topics = db::list_topics_by_person(&db, owner.id).await.unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].title, "Mine");

    assert!(db::update_topic(&db, topic.id, owner.id, "Renamed", Some("now with notes")).await.unwrap());
    let topics = db::list_topics_by_person(&db, owner.id).await.unwrap();
    assert_eq!(topics[0].title, "Renamed");
    assert_eq!(topics[0].description.as_deref(), Some("now with notes"));

    assert!(db::delete_topic(&db, topic.id, owner.id).await.unwrap());
    assert!(db::list_topics_by_person(&db, owner.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn active_and_discussed_counts_partition_topics() {
    let Some(db) = pool().await else { return };
    let owner = person(&db, "Speaker").await;
    let first = db::create_topic(&db, owner.id, "one", None).await.unwrap().unwrap();
    db::create_topic(&db, owner.id, "two", None).await.unwrap().unwrap();
    db::create_topic(&db, owner.id, "three", None).await.unwrap().unwrap();

    assert!(db::mark_discussed(&db, first.id, true).await.unwrap());

    let me = db::get_person(&db, owner.id).await.unwrap().unwrap();
    assert_eq!(me.topic_count, 2);
    assert_eq!(me.discussed_count, 1);

    let discussed = db::list_discussed_topics(&db).await.unwrap();
    assert!(discussed.iter().any(|t| t.id == first.id && t.discussed));
    let active = db::list_topics(&db, None).await.unwrap();
    assert!(active.iter().all(|t| t.id != first.id));

    assert!(db::mark_discussed(&db, first.id, false).await.unwrap());
    let me = db::get_person(&db, owner.id).await.unwrap().unwrap();
    assert_eq!(me.topic_count, 3);
    assert_eq!(me.discussed_count, 0);
}

#[tokio::test]
async fn claiming_toggles_for_self_and_reassigns_from_others() {
    let Some(db) = pool().await else { return };
    let author = person(&db, "Author").await;
    let first = person(&db, "First").await;
    let second = person(&db, "Second").await;
    let suggestion = db::create_suggestion(&db, author.id, "Async Rust", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(suggestion.claimed_by, None);

    assert!(db::claim_suggestion(&db, suggestion.id, first.id).await.unwrap());
    assert!(db::claim_suggestion(&db, suggestion.id, second.id).await.unwrap());

    let listed = db::list_suggestions(&db, None).await.unwrap();
    let claimed = listed.iter().find(|s| s.id == suggestion.id).unwrap();
    assert_eq!(claimed.claimed_by, Some(second.id));
    assert_eq!(claimed.claimed_by_name.as_deref(), Some(second.name.as_str()));

    assert!(!db::claim_suggestion(&db, suggestion.id, second.id).await.unwrap());
    let listed = db::list_suggestions(&db, None).await.unwrap();
    let released = listed.iter().find(|s| s.id == suggestion.id).unwrap();
    assert_eq!(released.claimed_by, None);
}

#[tokio::test]
async fn suggestion_votes_toggle() {
    let Some(db) = pool().await else { return };
    let author = person(&db, "Author").await;
    let voter = person(&db, "Voter").await;
    let suggestion = db::create_suggestion(&db, author.id, "Macros", Some("declarative"))
        .await
        .unwrap()
        .unwrap();

    assert!(db::toggle_suggestion_vote(&db, suggestion.id, voter.id).await.unwrap());
    let listed = db::list_suggestions(&db, Some(voter.id)).await.unwrap();
    let row = listed.iter().find(|s| s.id == suggestion.id).unwrap();
    assert_eq!(row.vote_count, 1);
    assert!(row.voted_by_current_user);

    assert!(!db::toggle_suggestion_vote(&db, suggestion.id, voter.id).await.unwrap());
}

#[tokio::test]
async fn topics_since_excludes_own_and_needs_a_timestamp() {
    let Some(db) = pool().await else { return };
    let me = person(&db, "Me").await;
    let colleague = person(&db, "Colleague").await;
    let before = Utc::now() - Duration::seconds(5);

    let theirs = db::create_topic(&db, colleague.id, "theirs", None).await.unwrap().unwrap();
    let mine = db::create_topic(&db, me.id, "mine", None).await.unwrap().unwrap();

    assert!(db::topics_since(&db, None, me.id).await.unwrap().is_empty());

    let new = db::topics_since(&db, Some(before), me.id).await.unwrap();
    assert!(new.iter().any(|t| t.id == theirs.id));
    assert!(new.iter().all(|t| t.person_id != me.id && t.id != mine.id));

    let stamped = db::update_last_login(&db, me.id).await.unwrap().unwrap();
    let after = db::topics_since(&db, Some(stamped), me.id).await.unwrap();
    assert!(after.iter().all(|t| t.id != theirs.id));

    assert!(db::update_last_login(&db, i32::MAX).await.unwrap().is_none());
}

#[tokio::test]
async fn setup_is_idempotent() {
    let Some(db) = pool().await else { return };
    let name = format!("Seed-{}", Utc::now().timestamp_micros());

    assert_eq!(db::setup_database(&db, &[name.as_str()]).await.unwrap(), 1);
    assert_eq!(db::setup_database(&db, &[name.as_str()]).await.unwrap(), 0);

    let found = db::find_person_by_name(&db, &name.to_uppercase()).await.unwrap();
    assert_eq!(found.map(|p| p.name), Some(name));
}

async fn login(db: &PgPool, person_id: i32, body: &str) -> serde_json::Value {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/people/{person_id}/login"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router(AppState::new(db.clone(), Roles::default()))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn login_reports_topics_added_since_the_previous_visit() {
    let Some(db) = pool().await else { return };
    let me = person(&db, "Returning").await;
    let colleague = person(&db, "Colleague").await;

    let first = login(&db, me.id, "").await;
    assert_eq!(first["newTopics"], serde_json::json!([]));
    assert!(first["lastLogin"].is_string());

    let topic = db::create_topic(&db, colleague.id, "Fresh", None)
        .await
        .unwrap()
        .unwrap();

    // Other tests add topics concurrently, so only the colleague's count.
    let second = login(&db, me.id, "{}").await;
    let from_colleague: Vec<i64> = second["newTopics"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["person_id"] == colleague.id)
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(from_colleague, [i64::from(topic.id)]);

    let third = login(&db, me.id, "").await;
    assert!(
        third["newTopics"]
            .as_array()
            .unwrap()
            .iter()
            .all(|t| t["person_id"] != colleague.id)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_never_duplicate_a_vote() {
    let Some(db) = pool_with(8).await else { return };
    let owner = person(&db, "Owner").await;
    let voter = person(&db, "Voter").await;
    let topic = db::create_topic(&db, owner.id, "Races", None)
        .await
        .unwrap()
        .unwrap();

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let db = db.clone();
            tokio::spawn(async move { db::toggle_topic_vote(&db, topic.id, voter.id).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM topic_votes WHERE topic_id = $1 AND voter_id = $2",
    )
    .bind(topic.id)
    .bind(voter.id)
    .fetch_one(&db)
    .await
    .unwrap();
    assert!(rows <= 1, "found {rows} votes for one voter");
}
