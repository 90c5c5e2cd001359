//! Scoring Service (Use Case)
//!
//! Post-call analysis for one completed session: transcribe every recorded
//! answer, grade each against its rubric through the evaluator, aggregate
//! into category results and an overall recommendation, and publish.
//!
//! The evaluator is treated as untrusted: verdicts are accepted only when
//! the returned question-key set exactly matches the requested set, and any
//! tier outside the four rubric tiers degrades that answer to
//! `evaluation-error`. A degraded result is flagged REVIEW, never a clean
//! PASS or FAIL.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;

use vetline::domain::services::scoring;
use vetline::domain::{
    AssessmentResult, CallSession, DomainError, IndexEntry, QuestionBank, Role, ScoredAnswer,
    SessionStatus, Tier,
};
use vetline::ports::{
    EvaluationRequest, Evaluator, ResultRepository, SessionRepository, Transcriber,
};

/// Application service producing assessment results from completed sessions.
pub struct ScoringService<S: SessionRepository, R: ResultRepository> {
    sessions: Arc<S>,
    results: Arc<R>,
    bank: Arc<QuestionBank>,
    transcriber: Arc<dyn Transcriber>,
    evaluator: Arc<dyn Evaluator>,
}

impl<S: SessionRepository, R: ResultRepository> ScoringService<S, R> {
    pub fn new(
        sessions: Arc<S>,
        results: Arc<R>,
        bank: Arc<QuestionBank>,
        transcriber: Arc<dyn Transcriber>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Self {
        Self {
            sessions,
            results,
            bank,
            transcriber,
            evaluator,
        }
    }

    /// Score one completed assessment and publish the result. Idempotent:
    /// rescoring the same session overwrites the published result.
    pub async fn score_assessment(
        &self,
        assessment_id: &str,
    ) -> Result<AssessmentResult, DomainError> {
        let session = match self.sessions.find(assessment_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                self.record_failure(assessment_id, "unknown").await;
                return Err(DomainError::session_not_found(assessment_id));
            }
            Err(e) => {
                // Total failure to read the session aborts scoring entirely
                // and surfaces as a failed index entry.
                self.record_failure(assessment_id, "unknown").await;
                return Err(e);
            }
        };

        if session.status != SessionStatus::Completed {
            return Err(DomainError::InvalidRequest(format!(
                "session {assessment_id} has status {}, only completed sessions are scored",
                session.status
            )));
        }

        let role = match self.bank.role(&session.role) {
            Some(role) => role.clone(),
            None => {
                self.record_failure(assessment_id, &session.role).await;
                return Err(DomainError::Validation(format!(
                    "session {assessment_id} references unknown role {}",
                    session.role
                )));
            }
        };

        tracing::info!(assessment_id, role = %role.key, "scoring assessment");

        let (mut answers, requests, transcripts) = self.transcribe_answers(&session, &role).await;
        self.attach_transcripts(session, &transcripts).await;

        answers.extend(self.evaluate(&role, &requests).await);

        // Stable output order: the role's question sequence.
        answers.sort_by_key(|a| {
            role.questions
                .iter()
                .position(|q| q.key == a.question_key)
                .unwrap_or(usize::MAX)
        });

        let result = scoring::assemble(assessment_id, &role, answers, Utc::now());
        self.results.publish(&result).await?;

        tracing::info!(
            assessment_id,
            recommendation = %result.recommendation,
            degraded = result.degraded,
            "assessment result published"
        );

        Ok(result)
    }

    /// Transcribe every recorded answer. No-response markers short-circuit
    /// straight to a scored answer without touching the transcriber; a
    /// transcription failure degrades that one question instead of aborting
    /// the assessment.
    async fn transcribe_answers(
        &self,
        session: &CallSession,
        role: &Role,
    ) -> (
        Vec<ScoredAnswer>,
        Vec<EvaluationRequest>,
        BTreeMap<String, String>,
    ) {
        let mut answers = Vec::new();
        let mut requests = Vec::new();
        let mut transcripts = BTreeMap::new();

        for question in &role.questions {
            let record = session.responses.get(&question.key);
            let recording_url = match record {
                Some(r) if !r.no_response => match &r.recording_url {
                    Some(url) => url.clone(),
                    None => {
                        answers.push(ScoredAnswer::no_response(&question.key));
                        continue;
                    }
                },
                _ => {
                    answers.push(ScoredAnswer::no_response(&question.key));
                    continue;
                }
            };

            match self.transcriber.transcribe(&recording_url).await {
                Ok(text) => {
                    transcripts.insert(question.key.clone(), text.clone());
                    requests.push(EvaluationRequest {
                        question_key: question.key.clone(),
                        question: question.prompt.clone(),
                        rubric: question.rubric.clone(),
                        transcript: text,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        assessment_id = %session.id,
                        question = %question.key,
                        error = %e,
                        "transcription failed"
                    );
                    answers.push(ScoredAnswer::evaluation_error(
                        &question.key,
                        &e.to_string(),
                    ));
                }
            }
        }

        (answers, requests, transcripts)
    }

    /// Attach transcripts to the session record, best effort: a conflict or
    /// write failure degrades nothing about the assessment result itself.
    async fn attach_transcripts(
        &self,
        mut session: CallSession,
        transcripts: &BTreeMap<String, String>,
    ) {
        if transcripts.is_empty() {
            return;
        }
        for (key, text) in transcripts {
            if let Some(record) = session.responses.get_mut(key) {
                record.transcript = Some(text.clone());
            }
        }
        if let Err(e) = self.sessions.update(&session).await {
            tracing::warn!(
                assessment_id = %session.id,
                error = %e,
                "failed to attach transcripts to session"
            );
        }
    }

    /// Run the batched evaluation and map verdicts back to scored answers
    /// by question key.
    async fn evaluate(&self, role: &Role, requests: &[EvaluationRequest]) -> Vec<ScoredAnswer> {
        if requests.is_empty() {
            return Vec::new();
        }

        let verdicts = match self.evaluator.evaluate(&role.name, requests).await {
            Ok(verdicts) => verdicts,
            Err(e) => {
                tracing::warn!(role = %role.key, error = %e, "evaluator unavailable");
                return requests
                    .iter()
                    .map(|r| ScoredAnswer::evaluation_error(&r.question_key, &e.to_string()))
                    .collect();
            }
        };

        // The returned key set must exactly match the requested set; a
        // mismatch is rejected wholesale rather than partially accepted,
        // since misassigned verdicts are indistinguishable from correct
        // ones once keys stop lining up.
        let expected: HashSet<&str> = requests.iter().map(|r| r.question_key.as_str()).collect();
        let returned: HashSet<&str> = verdicts.iter().map(|v| v.question_key.as_str()).collect();
        if expected != returned || verdicts.len() != requests.len() {
            tracing::warn!(
                role = %role.key,
                expected = expected.len(),
                returned = returned.len(),
                "evaluator verdict keys do not match requested questions, rejecting batch"
            );
            return requests
                .iter()
                .map(|r| {
                    ScoredAnswer::evaluation_error(
                        &r.question_key,
                        "verdict keys did not match requested questions",
                    )
                })
                .collect();
        }

        requests
            .iter()
            .map(|request| {
                let verdict = match verdicts
                    .iter()
                    .find(|v| v.question_key == request.question_key)
                {
                    Some(verdict) => verdict,
                    None => {
                        return ScoredAnswer::evaluation_error(
                            &request.question_key,
                            "verdict missing for question",
                        )
                    }
                };
                match Tier::parse_rubric(&verdict.tier) {
                    Ok(tier) => ScoredAnswer {
                        question_key: request.question_key.clone(),
                        tier,
                        score: request.rubric.score_for(tier),
                        reasoning: verdict.reasoning.clone(),
                    },
                    Err(e) => {
                        tracing::warn!(
                            question = %request.question_key,
                            tier = %verdict.tier,
                            "evaluator returned unknown tier"
                        );
                        ScoredAnswer::evaluation_error(&request.question_key, &e.to_string())
                    }
                }
            })
            .collect()
    }

    async fn record_failure(&self, assessment_id: &str, role: &str) {
        let entry = IndexEntry::failed(assessment_id, role);
        if let Err(e) = self.results.publish_failed(&entry).await {
            tracing::error!(assessment_id, error = %e, "failed to record scoring failure in index");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use vetline::domain::{PhoneNumber, Recommendation};
    use vetline::ports::EvaluationVerdict;

    use super::super::flow_service::tests::{bank_with, test_role, InMemorySessions};

    struct InMemoryResults {
        results: Mutex<HashMap<String, AssessmentResult>>,
        index: Mutex<HashMap<String, IndexEntry>>,
        publishes: Mutex<u32>,
    }

    impl InMemoryResults {
        fn new() -> Self {
            Self {
                results: Mutex::new(HashMap::new()),
                index: Mutex::new(HashMap::new()),
                publishes: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl ResultRepository for InMemoryResults {
        async fn publish(&self, result: &AssessmentResult) -> Result<(), DomainError> {
            *self.publishes.lock().unwrap() += 1;
            self.results
                .lock()
                .unwrap()
                .insert(result.assessment_id.clone(), result.clone());
            self.index
                .lock()
                .unwrap()
                .insert(result.assessment_id.clone(), IndexEntry::scored(result));
            Ok(())
        }

        async fn publish_failed(&self, entry: &IndexEntry) -> Result<(), DomainError> {
            self.index
                .lock()
                .unwrap()
                .insert(entry.assessment_id.clone(), entry.clone());
            Ok(())
        }

        async fn find(
            &self,
            assessment_id: &str,
        ) -> Result<Option<AssessmentResult>, DomainError> {
            Ok(self.results.lock().unwrap().get(assessment_id).cloned())
        }

        async fn index(&self) -> Result<Vec<IndexEntry>, DomainError> {
            Ok(self.index.lock().unwrap().values().cloned().collect())
        }
    }

    struct StubTranscriber {
        /// Recording URLs that should fail transcription.
        failing: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl StubTranscriber {
        fn new() -> Self {
            Self {
                failing: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(url: &str) -> Self {
            Self {
                failing: vec![url.to_string()],
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transcriber for StubTranscriber {
        async fn transcribe(&self, recording_url: &str) -> Result<String, DomainError> {
            self.calls.lock().unwrap().push(recording_url.to_string());
            if self.failing.iter().any(|f| f == recording_url) {
                return Err(DomainError::TranscriptionUnavailable(
                    "stub failure".to_string(),
                ));
            }
            Ok(format!("transcript of {recording_url}"))
        }
    }

    enum EvaluatorBehavior {
        /// Echo every key back with the given tier label.
        Echo(&'static str),
        /// Return verdicts for the wrong key set.
        WrongKeys,
        Unavailable,
    }

    struct StubEvaluator {
        behavior: EvaluatorBehavior,
        requested_keys: Mutex<Vec<String>>,
    }

    impl StubEvaluator {
        fn new(behavior: EvaluatorBehavior) -> Self {
            Self {
                behavior,
                requested_keys: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Evaluator for StubEvaluator {
        async fn evaluate(
            &self,
            _role_name: &str,
            requests: &[EvaluationRequest],
        ) -> Result<Vec<EvaluationVerdict>, DomainError> {
            let mut keys = self.requested_keys.lock().unwrap();
            keys.extend(requests.iter().map(|r| r.question_key.clone()));
            drop(keys);

            match &self.behavior {
                EvaluatorBehavior::Echo(tier) => Ok(requests
                    .iter()
                    .map(|r| EvaluationVerdict {
                        question_key: r.question_key.clone(),
                        tier: tier.to_string(),
                        reasoning: "stub verdict".to_string(),
                    })
                    .collect()),
                EvaluatorBehavior::WrongKeys => Ok(requests
                    .iter()
                    .map(|r| EvaluationVerdict {
                        question_key: format!("{}_shifted", r.question_key),
                        tier: "ideal".to_string(),
                        reasoning: "stub verdict".to_string(),
                    })
                    .collect()),
                EvaluatorBehavior::Unavailable => Err(DomainError::EvaluationUnavailable(
                    "stub outage".to_string(),
                )),
            }
        }
    }

    struct Fixture {
        sessions: Arc<InMemorySessions>,
        results: Arc<InMemoryResults>,
        evaluator: Arc<StubEvaluator>,
        service: ScoringService<InMemorySessions, InMemoryResults>,
    }

    async fn fixture(
        questions: usize,
        transcriber: StubTranscriber,
        behavior: EvaluatorBehavior,
    ) -> Fixture {
        let role = test_role(questions);
        let sessions = Arc::new(InMemorySessions::new());
        let results = Arc::new(InMemoryResults::new());
        let evaluator = Arc::new(StubEvaluator::new(behavior));
        let service = ScoringService::new(
            sessions.clone(),
            results.clone(),
            bank_with(&role),
            Arc::new(transcriber),
            evaluator.clone(),
        );
        Fixture {
            sessions,
            results,
            evaluator,
            service,
        }
    }

    /// A completed session; keys listed in `unanswered` get no-response
    /// markers, everything else gets a recording.
    async fn seed_completed(sessions: &InMemorySessions, questions: usize, unanswered: &[&str]) {
        let role = test_role(questions);
        let mut session = CallSession::new(
            "a1".to_string(),
            role.key.clone(),
            PhoneNumber::parse("+15551234567").unwrap(),
            None,
        );
        for question in &role.questions {
            if unanswered.contains(&question.key.as_str()) {
                session.record_no_response(&question.key);
            } else {
                session.record_answer(&question.key, format!("https://rec/{}.mp3", question.key));
            }
            session.advance();
        }
        session.mark_completed(&role).unwrap();
        sessions.create(&session).await.unwrap();
    }

    #[tokio::test]
    async fn test_happy_path_scores_and_publishes() {
        let f = fixture(2, StubTranscriber::new(), EvaluatorBehavior::Echo("ideal")).await;
        seed_completed(&f.sessions, 2, &[]).await;

        let result = f.service.score_assessment("a1").await.unwrap();

        assert_eq!(result.recommendation, Recommendation::Pass);
        assert!(!result.degraded);
        assert_eq!(result.answers.len(), 2);
        assert!(result.answers.iter().all(|a| a.tier == Tier::Ideal));
        assert_eq!(result.categories.len(), 1);
        assert_eq!(result.categories[0].percentage, 100.0);

        let published = f.results.find("a1").await.unwrap().unwrap();
        assert_eq!(published.recommendation, Recommendation::Pass);
        let index = f.results.index().await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].status, "pass");
    }

    #[tokio::test]
    async fn test_no_response_short_circuits_evaluator() {
        let f = fixture(2, StubTranscriber::new(), EvaluatorBehavior::Echo("ideal")).await;
        seed_completed(&f.sessions, 2, &["q1"]).await;

        let result = f.service.score_assessment("a1").await.unwrap();

        // Only the answered question reached the evaluator.
        assert_eq!(*f.evaluator.requested_keys.lock().unwrap(), vec!["q0"]);
        let q1 = result
            .answers
            .iter()
            .find(|a| a.question_key == "q1")
            .unwrap();
        assert_eq!(q1.tier, Tier::NoResponse);
        assert_eq!(q1.score, 0.0);
    }

    #[tokio::test]
    async fn test_mismatched_verdict_keys_are_rejected_wholesale() {
        let f = fixture(2, StubTranscriber::new(), EvaluatorBehavior::WrongKeys).await;
        seed_completed(&f.sessions, 2, &[]).await;

        let result = f.service.score_assessment("a1").await.unwrap();

        assert!(result.degraded);
        assert_eq!(result.recommendation, Recommendation::Review);
        assert!(result
            .answers
            .iter()
            .all(|a| a.tier == Tier::EvaluationError));
    }

    #[tokio::test]
    async fn test_evaluator_outage_degrades_to_review() {
        let f = fixture(2, StubTranscriber::new(), EvaluatorBehavior::Unavailable).await;
        seed_completed(&f.sessions, 2, &[]).await;

        let result = f.service.score_assessment("a1").await.unwrap();

        assert!(result.degraded);
        assert_eq!(result.recommendation, Recommendation::Review);
        // The result is still published rather than missing.
        assert!(f.results.find("a1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_tier_degrades_that_answer() {
        let f = fixture(1, StubTranscriber::new(), EvaluatorBehavior::Echo("superb")).await;
        seed_completed(&f.sessions, 1, &[]).await;

        let result = f.service.score_assessment("a1").await.unwrap();

        assert_eq!(result.answers[0].tier, Tier::EvaluationError);
        assert_eq!(result.recommendation, Recommendation::Review);
    }

    #[tokio::test]
    async fn test_transcription_failure_degrades_one_question() {
        let f = fixture(
            2,
            StubTranscriber::failing_on("https://rec/q0.mp3"),
            EvaluatorBehavior::Echo("acceptable"),
        )
        .await;
        seed_completed(&f.sessions, 2, &[]).await;

        let result = f.service.score_assessment("a1").await.unwrap();

        let q0 = result
            .answers
            .iter()
            .find(|a| a.question_key == "q0")
            .unwrap();
        assert_eq!(q0.tier, Tier::EvaluationError);
        let q1 = result
            .answers
            .iter()
            .find(|a| a.question_key == "q1")
            .unwrap();
        assert_eq!(q1.tier, Tier::Acceptable);
        assert_eq!(result.recommendation, Recommendation::Review);
    }

    #[tokio::test]
    async fn test_abandoned_session_is_not_scored() {
        let f = fixture(2, StubTranscriber::new(), EvaluatorBehavior::Echo("ideal")).await;
        let role = test_role(2);
        let mut session = CallSession::new(
            "a1".to_string(),
            role.key.clone(),
            PhoneNumber::parse("+15551234567").unwrap(),
            None,
        );
        session.mark_abandoned();
        f.sessions.create(&session).await.unwrap();

        let err = f.service.score_assessment("a1").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
        assert!(f.results.find("a1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_session_records_failed_index_entry() {
        let f = fixture(2, StubTranscriber::new(), EvaluatorBehavior::Echo("ideal")).await;

        let err = f.service.score_assessment("ghost").await.unwrap_err();
        assert!(matches!(err, DomainError::SessionNotFound(_)));

        let index = f.results.index().await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].status, "failed");
    }

    #[tokio::test]
    async fn test_rescoring_overwrites_instead_of_duplicating() {
        let f = fixture(2, StubTranscriber::new(), EvaluatorBehavior::Echo("ideal")).await;
        seed_completed(&f.sessions, 2, &[]).await;

        let first = f.service.score_assessment("a1").await.unwrap();
        let second = f.service.score_assessment("a1").await.unwrap();

        assert_eq!(first.recommendation, second.recommendation);
        assert_eq!(f.results.results.lock().unwrap().len(), 1);
        assert_eq!(f.results.index.lock().unwrap().len(), 1);
        assert_eq!(*f.results.publishes.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_transcripts_are_attached_to_session() {
        let f = fixture(2, StubTranscriber::new(), EvaluatorBehavior::Echo("ideal")).await;
        seed_completed(&f.sessions, 2, &[]).await;

        f.service.score_assessment("a1").await.unwrap();

        let stored = f.sessions.get("a1").unwrap();
        assert_eq!(
            stored.responses["q0"].transcript.as_deref(),
            Some("transcript of https://rec/q0.mp3")
        );
    }
}
