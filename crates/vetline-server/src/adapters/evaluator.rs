//! LLM Evaluator Adapter
//!
//! Grades answer transcripts against their rubrics through an LLM messages
//! API. The whole batch goes out in one request; the model is required to
//! echo each question key next to its verdict, and the scoring engine
//! validates the returned key set before accepting anything.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use vetline::domain::DomainError;
use vetline::ports::{EvaluationRequest, EvaluationVerdict, Evaluator};

use crate::config::EvaluatorConfig;

/// Messages-API implementation of Evaluator
pub struct LlmEvaluator {
    client: Client,
    config: EvaluatorConfig,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: String,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    question_key: String,
    tier: String,
    #[serde(default)]
    reasoning: String,
}

impl LlmEvaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }
}

/// Build the grading prompt for one batch of answers.
fn build_grading_prompt(role_name: &str, requests: &[EvaluationRequest]) -> String {
    let mut prompt = format!(
        "You are an expert hospitality interviewer grading a {role_name} phone \
         screen. For each answer below, pick exactly one tier from: ideal, \
         acceptable, red-flag, no-response.\n\n"
    );

    for request in requests {
        prompt.push_str(&format!(
            "question_key: {}\nQuestion: {}\nCandidate answer: \"{}\"\n\
             Tier criteria:\n- ideal: {}\n- acceptable: {}\n- red-flag: {}\n- no-response: {}\n\n",
            request.question_key,
            request.question,
            request.transcript,
            request.rubric.ideal.description,
            request.rubric.acceptable.description,
            request.rubric.red_flag.description,
            request.rubric.no_response.description,
        ));
    }

    prompt.push_str(
        "Respond with a JSON array only, no prose. One object per answer, \
         echoing the question_key exactly as given:\n\
         [{\"question_key\": \"...\", \"tier\": \"ideal|acceptable|red-flag|no-response\", \
         \"reasoning\": \"one sentence\"}]\n\
         Every question_key above must appear exactly once.",
    );

    prompt
}

/// Parse the model's reply into raw verdicts. Tolerates a fenced code
/// block; anything else unparseable fails the whole batch.
fn parse_verdicts(text: &str) -> Result<Vec<EvaluationVerdict>, DomainError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();

    let raw: Vec<RawVerdict> = serde_json::from_str(body).map_err(|e| {
        DomainError::EvaluationUnavailable(format!("unparseable evaluator output: {e}"))
    })?;

    Ok(raw
        .into_iter()
        .map(|v| EvaluationVerdict {
            question_key: v.question_key,
            tier: v.tier,
            reasoning: v.reasoning,
        })
        .collect())
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    async fn evaluate(
        &self,
        role_name: &str,
        requests: &[EvaluationRequest],
    ) -> Result<Vec<EvaluationVerdict>, DomainError> {
        let prompt = build_grading_prompt(role_name, requests);

        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        });

        tracing::debug!(
            role = role_name,
            questions = requests.len(),
            "requesting batch evaluation"
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::EvaluationUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::EvaluationUnavailable(format!(
                "evaluator API returned {status}: {body}"
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| DomainError::EvaluationUnavailable(e.to_string()))?;

        let text = parsed
            .content
            .first()
            .map(|block| block.text.as_str())
            .ok_or_else(|| {
                DomainError::EvaluationUnavailable("evaluator returned no content".to_string())
            })?;

        parse_verdicts(text)
    }
}
