use chrono::{DateTime, Utc};
use knowledge_share::{models::*, views::LeaderboardEntry};
use reqwest::{Method, Response};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;

pub struct Api {
    client: reqwest::Client,
    base_url: String,
}

impl Api {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        parse(response).await
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        let response = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        parse(response).await
    }

    // ===== People =====

    pub async fn people(&self) -> anyhow::Result<Vec<Person>> {
        self.get("/people").await
    }

    pub async fn login(
        &self,
        person_id: i32,
        last_login: Option<DateTime<Utc>>,
    ) -> anyhow::Result<LoginResponse> {
        self.send(
            Method::POST,
            &format!("/people/{person_id}/login"),
            &LoginRequest { last_login },
        )
        .await
    }

    pub async fn person_topics(&self, person_id: i32) -> anyhow::Result<Vec<Topic>> {
        self.get(&format!("/people/{person_id}/topics")).await
    }

    // ===== Topics =====

    pub async fn topics(&self, user_id: i32) -> anyhow::Result<Vec<Topic>> {
        self.get(&format!("/topics?userId={user_id}")).await
    }

    pub async fn create_topic(
        &self,
        person_id: i32,
        title: &str,
        description: Option<&str>,
    ) -> anyhow::Result<Topic> {
        let body = json!({ "personId": person_id, "title": title, "description": description });
        self.send(Method::POST, "/topics", &body).await
    }

    pub async fn update_topic(
        &self,
        topic_id: i32,
        person_id: i32,
        title: &str,
        description: Option<&str>,
    ) -> anyhow::Result<bool> {
        let body = json!({
            "topicId": topic_id,
            "personId": person_id,
            "title": title,
            "description": description,
        });
        let response: SuccessResponse = self.send(Method::PUT, "/topics", &body).await?;
        Ok(response.success)
    }

    pub async fn delete_topic(&self, topic_id: i32, person_id: i32) -> anyhow::Result<bool> {
        let body = json!({ "topicId": topic_id, "personId": person_id });
        let response: SuccessResponse = self.send(Method::DELETE, "/topics", &body).await?;
        Ok(response.success)
    }

    pub async fn vote_topic(&self, topic_id: i32, voter_id: i32) -> anyhow::Result<bool> {
        let body = json!({ "voterId": voter_id });
        let response: VoteResponse = self
            .send(Method::POST, &format!("/topics/{topic_id}/vote"), &body)
            .await?;
        Ok(response.voted)
    }

    pub async fn mark_discussed(&self, topic_id: i32, discussed: bool) -> anyhow::Result<bool> {
        let body = json!({ "discussed": discussed });
        let response: SuccessResponse = self
            .send(Method::POST, &format!("/topics/{topic_id}/discussed"), &body)
            .await?;
        Ok(response.success)
    }

    // ===== Suggestions =====

    pub async fn suggestions(&self, user_id: i32) -> anyhow::Result<Vec<Suggestion>> {
        self.get(&format!("/suggestions?userId={user_id}")).await
    }

    pub async fn create_suggestion(
        &self,
        suggested_by: i32,
        title: &str,
        description: Option<&str>,
    ) -> anyhow::Result<Suggestion> {
        let body =
            json!({ "suggestedBy": suggested_by, "title": title, "description": description });
        self.send(Method::POST, "/suggestions", &body).await
    }

    pub async fn vote_suggestion(&self, suggestion_id: i32, voter_id: i32) -> anyhow::Result<bool> {
        let body = json!({ "voterId": voter_id });
        let response: VoteResponse = self
            .send(Method::POST, &format!("/suggestions/{suggestion_id}/vote"), &body)
            .await?;
        Ok(response.voted)
    }

    pub async fn claim(&self, suggestion_id: i32, claimer_id: i32) -> anyhow::Result<bool> {
        let body = json!({ "claimerId": claimer_id });
        let response: ClaimResponse = self
            .send(Method::POST, &format!("/suggestions/{suggestion_id}/claim"), &body)
            .await?;
        Ok(response.claimed)
    }

    pub async fn leaderboard(&self) -> anyhow::Result<Vec<LeaderboardEntry>> {
        self.get("/leaderboard").await
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await?;
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v["error"].as_str().map(str::to_string))
            .unwrap_or(text);
        anyhow::bail!("API error ({}): {}", status, message);
    }

    Ok(response.json().await?)
}
