//! View assembly over already-fetched rows. Nothing here touches the store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Person, Suggestion, Topic};

/// Topics each person is expected to bring.
pub const TOPIC_GOAL: i64 = 3;
pub const LEADERBOARD_SIZE: usize = 3;
pub const UNCLAIMED_PRESENTER: &str = "Suggestion Box";

// ===== Leaderboard =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub title: String,
    pub description: Option<String>,
    pub presenter: String,
    pub vote_count: i64,
    pub is_suggestion: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Topic> for LeaderboardEntry {
    fn from(topic: &Topic) -> Self {
        Self {
            title: topic.title.clone(),
            description: topic.description.clone(),
            presenter: topic.person_name.clone(),
            vote_count: topic.vote_count,
            is_suggestion: false,
            created_at: topic.created_at,
        }
    }
}

impl From<&Suggestion> for LeaderboardEntry {
    fn from(suggestion: &Suggestion) -> Self {
        Self {
            title: suggestion.title.clone(),
            description: suggestion.description.clone(),
            presenter: suggestion
                .claimed_by_name
                .clone()
                .unwrap_or_else(|| UNCLAIMED_PRESENTER.to_string()),
            vote_count: suggestion.vote_count,
            is_suggestion: true,
            created_at: suggestion.created_at,
        }
    }
}

/// Most voted items across active topics and suggestions.
///
/// Ties go to the older item; among equally old items topics come before
/// suggestions (the sort is stable over the topics-then-suggestions union).
pub fn leaderboard(topics: &[Topic], suggestions: &[Suggestion], limit: usize) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = topics
        .iter()
        .filter(|t| !t.discussed)
        .map(LeaderboardEntry::from)
        .chain(suggestions.iter().map(LeaderboardEntry::from))
        .collect();

    entries.sort_by(|a, b| {
        b.vote_count
            .cmp(&a.vote_count)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    entries.truncate(limit);
    entries
}

// ===== Progress =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Progress {
    None,
    Partial,
    Complete,
}

impl Progress {
    /// Classifies engagement from the combined active and discussed count.
    pub fn classify(active: i64, discussed: i64) -> Self {
        match active + discussed {
            total if total <= 0 => Progress::None,
            total if total < TOPIC_GOAL => Progress::Partial,
            _ => Progress::Complete,
        }
    }

    pub fn of(person: &Person) -> Self {
        Self::classify(person.topic_count, person.discussed_count)
    }
}

/// Badge label: `"✓ 4"` once the goal is met, `"1/3"` before.
pub fn badge_text(active: i64, discussed: i64) -> String {
    let total = active + discussed;
    if total >= TOPIC_GOAL {
        format!("✓ {total}")
    } else {
        format!("{total}/{TOPIC_GOAL}")
    }
}

/// Progress bar fill for a person's active topics, capped at 100.
pub fn progress_percent(active: i64) -> u8 {
    let percent = active.max(0).saturating_mul(100) / TOPIC_GOAL;
    percent.min(100) as u8
}

// ===== Grouping =====

/// Splits topics into the viewer's own and everyone else's keyed by owner name.
pub fn group_by_owner(topics: &[Topic], viewer_id: i32) -> (Vec<Topic>, BTreeMap<String, Vec<Topic>>) {
    let mut mine = Vec::new();
    let mut others: BTreeMap<String, Vec<Topic>> = BTreeMap::new();

    for topic in topics {
        if topic.person_id == viewer_id {
            mine.push(topic.clone());
        } else {
            others
                .entry(topic.person_name.clone())
                .or_default()
                .push(topic.clone());
        }
    }

    (mine, others)
}

pub fn find_person<'a>(people: &'a [Person], name: &str) -> Option<&'a Person> {
    let name = name.trim().to_lowercase();
    people.iter().find(|p| p.name.to_lowercase() == name)
}

// ===== Applying mutation results =====
//
// Mutations return enough to patch a fetched list in place, so a viewer does
// not need to re-fetch everything after each click.

pub fn apply_topic_vote(topics: &mut [Topic], topic_id: i32, voted: bool) {
    if let Some(topic) = topics.iter_mut().find(|t| t.id == topic_id) {
        if topic.voted_by_current_user != voted {
            topic.vote_count += if voted { 1 } else { -1 };
            topic.voted_by_current_user = voted;
        }
    }
}

pub fn apply_suggestion_vote(suggestions: &mut [Suggestion], suggestion_id: i32, voted: bool) {
    if let Some(suggestion) = suggestions.iter_mut().find(|s| s.id == suggestion_id) {
        if suggestion.voted_by_current_user != voted {
            suggestion.vote_count += if voted { 1 } else { -1 };
            suggestion.voted_by_current_user = voted;
        }
    }
}

/// Records the outcome of a claim by `claimer`.
pub fn apply_claim(suggestions: &mut [Suggestion], suggestion_id: i32, claimer: &Person, claimed: bool) {
    if let Some(suggestion) = suggestions.iter_mut().find(|s| s.id == suggestion_id) {
        if claimed {
            suggestion.claimed_by = Some(claimer.id);
            suggestion.claimed_by_name = Some(claimer.name.clone());
        } else if suggestion.claimed_by == Some(claimer.id) {
            suggestion.claimed_by = None;
            suggestion.claimed_by_name = None;
        }
    }
}
