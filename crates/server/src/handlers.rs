use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};

use crate::{
    db,
    error::AppError,
    models::*,
    state::AppState,
    views::{self, LEADERBOARD_SIZE, LeaderboardEntry},
};

// ===== Input helpers =====

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn path_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, AppError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn viewer(query: Result<Query<ViewerQuery>, QueryRejection>) -> Result<Option<i32>, AppError> {
    query
        .map(|Query(q)| q.user_id)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Ids are positive; zero counts as missing.
fn required_id(value: Option<i32>, field: &str) -> Result<i32, AppError> {
    value
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest(format!("{field} is required")))
}

/// Matches the `VARCHAR(255)` title columns.
pub const MAX_TITLE_CHARS: usize = 255;

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    let text =
        optional_text(value).ok_or_else(|| AppError::BadRequest(format!("{field} is required")))?;
    if text.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(text)
}

/// Trims, and treats blank text as absent.
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

// ===== Handlers =====

pub async fn root() -> &'static str {
    "Knowledge Sharing Planner - Use /health to check status"
}

/// Fails with the usual 500 body when the store is unreachable.
pub async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let people: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM people")
        .fetch_one(&state.db)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "database": "connected",
        "people": people
    })))
}

pub async fn setup(State(state): State<AppState>) -> Result<Json<SetupResponse>, AppError> {
    let seeded = db::setup_database(&state.db, db::DEFAULT_PEOPLE).await?;

    Ok(Json(SetupResponse {
        success: true,
        message: "Database setup complete".to_string(),
        seeded,
    }))
}

// ----- people -----

pub async fn list_people(State(state): State<AppState>) -> Result<Json<Vec<Person>>, AppError> {
    let mut people = db::list_people(&state.db).await?;
    for person in &mut people {
        person.is_admin = state.roles.is_admin(&person.name);
    }

    Ok(Json(people))
}

/// Reports topics added since the previous visit, then stamps this visit.
pub async fn login(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Bytes,
) -> Result<Json<LoginResponse>, AppError> {
    let person_id = path_id(path)?;
    let request = login_request(&payload)?;

    let person = db::get_person(&state.db, person_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Person not found".into()))?;

    // Must be read before the timestamp below overwrites it.
    let since = request.last_login.or(person.last_login);
    let new_topics = db::topics_since(&state.db, since, person.id).await?;

    let last_login = db::update_last_login(&state.db, person.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Person not found".into()))?;

    tracing::info!(
        "{} logged in, {} new topics since {:?}",
        person.name,
        new_topics.len(),
        since
    );

    Ok(Json(LoginResponse {
        new_topics,
        last_login,
    }))
}

/// An empty body means "use the stored last login".
fn login_request(payload: &[u8]) -> Result<LoginRequest, AppError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(LoginRequest::default());
    }
    serde_json::from_slice(payload).map_err(|e| AppError::BadRequest(format!("Invalid body: {e}")))
}

pub async fn person_topics(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<Topic>>, AppError> {
    let person_id = path_id(path)?;
    Ok(Json(db::list_topics_by_person(&state.db, person_id).await?))
}

// ----- topics -----

pub async fn list_topics(
    State(state): State<AppState>,
    query: Result<Query<ViewerQuery>, QueryRejection>,
) -> Result<Json<Vec<Topic>>, AppError> {
    let user_id = viewer(query)?;
    Ok(Json(db::list_topics(&state.db, user_id).await?))
}

pub async fn list_discussed_topics(
    State(state): State<AppState>,
) -> Result<Json<Vec<Topic>>, AppError> {
    Ok(Json(db::list_discussed_topics(&state.db).await?))
}

pub async fn create_topic(
    State(state): State<AppState>,
    payload: Result<Json<CreateTopicRequest>, JsonRejection>,
) -> Result<Json<Topic>, AppError> {
    let request = body(payload)?;
    let (person_id, title) = match (request.person_id, optional_text(request.title)) {
        (Some(id), Some(title)) if id > 0 => (id, required_text(Some(title), "title")?),
        _ => return Err(AppError::BadRequest("personId and title are required".into())),
    };
    let description = optional_text(request.description);

    let topic = db::create_topic(&state.db, person_id, &title, description.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound("Person not found".into()))?;

    tracing::info!("{} added topic {}: {}", topic.person_name, topic.id, topic.title);
    Ok(Json(topic))
}

pub async fn update_topic(
    State(state): State<AppState>,
    payload: Result<Json<UpdateTopicRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let request = body(payload)?;
    let topic_id = required_id(request.topic_id, "topicId")?;
    let person_id = required_id(request.person_id, "personId")?;
    let title = required_text(request.title, "title")?;
    let description = optional_text(request.description);

    let success =
        db::update_topic(&state.db, topic_id, person_id, &title, description.as_deref()).await?;

    Ok(Json(SuccessResponse { success }))
}

pub async fn delete_topic(
    State(state): State<AppState>,
    payload: Result<Json<DeleteTopicRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let request = body(payload)?;
    let (topic_id, person_id) = match (request.topic_id, request.person_id) {
        (Some(topic_id), Some(person_id)) if topic_id > 0 && person_id > 0 => (topic_id, person_id),
        _ => return Err(AppError::BadRequest("topicId and personId are required".into())),
    };

    let success = db::delete_topic(&state.db, topic_id, person_id).await?;
    if success {
        tracing::info!("Topic {} deleted by person {}", topic_id, person_id);
    }

    Ok(Json(SuccessResponse { success }))
}

pub async fn vote_topic(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteResponse>, AppError> {
    let topic_id = path_id(path)?;
    let voter_id = required_id(body(payload)?.voter_id, "voterId")?;

    let voted = db::toggle_topic_vote(&state.db, topic_id, voter_id).await?;
    Ok(Json(VoteResponse { voted }))
}

pub async fn mark_discussed(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<DiscussedRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let topic_id = path_id(path)?;
    let discussed = body(payload)?
        .discussed
        .ok_or_else(|| AppError::BadRequest("discussed is required".into()))?;

    let success = db::mark_discussed(&state.db, topic_id, discussed).await?;
    Ok(Json(SuccessResponse { success }))
}

// ----- suggestions -----

pub async fn list_suggestions(
    State(state): State<AppState>,
    query: Result<Query<ViewerQuery>, QueryRejection>,
) -> Result<Json<Vec<Suggestion>>, AppError> {
    let user_id = viewer(query)?;
    Ok(Json(db::list_suggestions(&state.db, user_id).await?))
}

pub async fn create_suggestion(
    State(state): State<AppState>,
    payload: Result<Json<CreateSuggestionRequest>, JsonRejection>,
) -> Result<Json<Suggestion>, AppError> {
    let request = body(payload)?;
    let (suggested_by, title) = match (request.suggested_by, optional_text(request.title)) {
        (Some(id), Some(title)) if id > 0 => (id, required_text(Some(title), "title")?),
        _ => return Err(AppError::BadRequest("suggestedBy and title are required".into())),
    };
    let description = optional_text(request.description);

    let suggestion =
        db::create_suggestion(&state.db, suggested_by, &title, description.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound("Person not found".into()))?;

    tracing::info!(
        "{} suggested {}: {}",
        suggestion.suggested_by_name,
        suggestion.id,
        suggestion.title
    );
    Ok(Json(suggestion))
}

pub async fn vote_suggestion(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteResponse>, AppError> {
    let suggestion_id = path_id(path)?;
    let voter_id = required_id(body(payload)?.voter_id, "voterId")?;

    let voted = db::toggle_suggestion_vote(&state.db, suggestion_id, voter_id).await?;
    Ok(Json(VoteResponse { voted }))
}

pub async fn claim_suggestion(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<ClaimRequest>, JsonRejection>,
) -> Result<Json<ClaimResponse>, AppError> {
    let suggestion_id = path_id(path)?;
    let claimer_id = required_id(body(payload)?.claimer_id, "claimerId")?;

    let claimed = db::claim_suggestion(&state.db, suggestion_id, claimer_id).await?;
    Ok(Json(ClaimResponse { claimed }))
}

// ----- leaderboard -----

pub async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let topics = db::list_topics(&state.db, None).await?;
    let suggestions = db::list_suggestions(&state.db, None).await?;

    Ok(Json(views::leaderboard(&topics, &suggestions, LEADERBOARD_SIZE)))
}
