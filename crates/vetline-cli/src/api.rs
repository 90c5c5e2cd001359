//! Vetline API Client

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// API Client for Vetline
pub struct VetlineClient {
    client: Client,
    base_url: String,
}

// ============================================
// API Response Types
// ============================================

#[derive(Debug, Deserialize)]
pub struct InitiateResponse {
    pub assessment_id: String,
    pub provider_call_id: String,
    pub candidate_phone: String,
    pub role: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct AssessmentSummary {
    pub assessment_id: String,
    pub role: String,
    pub status: String,
    pub analyzed_at: String,
}

#[derive(Debug, Deserialize)]
pub struct IndexResponse {
    pub assessments: Vec<AssessmentSummary>,
    pub total_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct ScoredAnswer {
    pub question_key: String,
    pub tier: String,
    pub score: f64,
    pub reasoning: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryResult {
    pub category: String,
    pub name: String,
    pub percentage: f64,
    pub pass_threshold_pct: f64,
    pub passed: bool,
    pub degraded: bool,
}

#[derive(Debug, Deserialize)]
pub struct AssessmentResult {
    pub assessment_id: String,
    pub role: String,
    pub recommendation: String,
    pub reasoning: String,
    pub answers: Vec<ScoredAnswer>,
    pub categories: Vec<CategoryResult>,
    pub degraded: bool,
    pub analyzed_at: String,
}

#[derive(Debug, Serialize)]
struct InitiateRequest<'a> {
    candidate_phone: &'a str,
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidate_id: Option<&'a str>,
}

impl VetlineClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Test connection with health check
    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        Ok(resp.status().is_success())
    }

    /// Start an assessment call
    pub async fn initiate(
        &self,
        phone: &str,
        role: &str,
        candidate_id: Option<&str>,
    ) -> Result<InitiateResponse> {
        let url = format!("{}/initiate", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&InitiateRequest {
                candidate_phone: phone,
                role,
                candidate_id,
            })
            .send()
            .await
            .context("Failed to connect to Vetline API")?;

        Self::parse(resp).await
    }

    /// List the assessment index
    pub async fn list(&self) -> Result<IndexResponse> {
        let url = format!("{}/assessments", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to connect to Vetline API")?;

        Self::parse(resp).await
    }

    /// Fetch one assessment result
    pub async fn result(&self, assessment_id: &str) -> Result<AssessmentResult> {
        let url = format!("{}/assessments/{}", self.base_url, assessment_id);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to connect to Vetline API")?;

        Self::parse(resp).await
    }

    /// Re-run scoring for a completed session
    pub async fn rescore(&self, assessment_id: &str) -> Result<AssessmentResult> {
        let url = format!("{}/assessments/{}/rescore", self.base_url, assessment_id);
        let resp = self
            .client
            .post(&url)
            .json(&json!({}))
            .send()
            .await
            .context("Failed to connect to Vetline API")?;

        Self::parse(resp).await
    }

    async fn parse<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<T> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("API error ({}): {}", status, body);
        }
        resp.json().await.context("Failed to parse response")
    }
}
