//! Call-Flow Service (Use Case)
//!
//! The webhook-driven state machine. Every inbound telephony event is
//! handled as a single-shot request/response: fetch the session, apply
//! exactly one transition, persist, and return the one next instruction for
//! the gateway. Nothing is held in memory between invocations, so duplicate
//! and out-of-order deliveries must land on the persisted state and come
//! out harmless.

use std::sync::Arc;

use vetline::domain::{
    CallEvent, CallSession, DomainError, Instruction, PromptRef, Question, QuestionBank,
    ResponseWindow, Role, SessionStatus, REPEAT_KEY, SUBMIT_KEY,
};
use vetline::ports::SessionRepository;

use crate::config::FlowConfig;

/// Result of handling one webhook event.
#[derive(Debug)]
pub struct FlowOutcome {
    /// The single next instruction for the telephony gateway.
    pub instruction: Instruction,
    /// Set when this event moved the session to COMPLETED; the caller is
    /// expected to kick off scoring for this assessment id.
    pub completed: Option<String>,
}

impl FlowOutcome {
    fn reply(instruction: Instruction) -> Self {
        Self {
            instruction,
            completed: None,
        }
    }
}

/// Application service driving the call-flow state machine.
pub struct FlowService<R: SessionRepository> {
    sessions: Arc<R>,
    bank: Arc<QuestionBank>,
    config: FlowConfig,
}

impl<R: SessionRepository> FlowService<R> {
    pub fn new(sessions: Arc<R>, bank: Arc<QuestionBank>, config: FlowConfig) -> Self {
        Self {
            sessions,
            bank,
            config,
        }
    }

    /// Handle one parsed telephony event and return the next instruction.
    pub async fn handle_event(&self, event: CallEvent) -> Result<FlowOutcome, DomainError> {
        let assessment_id = event.assessment_id().to_string();
        let session = self
            .sessions
            .find(&assessment_id)
            .await?
            .ok_or_else(|| DomainError::session_not_found(&assessment_id))?;
        let role = self.role_for(&session)?;

        match event {
            CallEvent::Answered { .. } => self.on_answered(session, role),
            CallEvent::RecordingComplete {
                question_key,
                recording_url,
                duration_secs,
                digits,
                ..
            } => {
                self.on_recording(session, role, &question_key, recording_url, duration_secs, digits)
                    .await
            }
            CallEvent::GatherComplete {
                question_key,
                digits,
                ..
            } => self.on_gather(session, role, &question_key, digits).await,
            CallEvent::StatusUpdate { call_status, .. } => {
                self.on_status(session, role, &call_status).await
            }
        }
    }

    fn role_for(&self, session: &CallSession) -> Result<Role, DomainError> {
        self.bank
            .role(&session.role)
            .cloned()
            .ok_or_else(|| {
                DomainError::Validation(format!(
                    "session {} references unknown role {}",
                    session.id, session.role
                ))
            })
    }

    fn prompt_ref(role: &Role, question: &Question) -> PromptRef {
        PromptRef {
            role_key: role.key.clone(),
            question_key: question.key.clone(),
            prompt_text: question.prompt.clone(),
            audio_url: question.audio_url.clone(),
        }
    }

    /// The instruction matching a session's current persisted state. Used
    /// to answer duplicate deliveries without applying any transition.
    fn instruction_for(&self, session: &CallSession, role: &Role) -> Instruction {
        match session.status {
            SessionStatus::Completed => Instruction::Conclude {
                goodbye_audio: role.goodbye_audio.clone(),
            },
            SessionStatus::Failed | SessionStatus::Abandoned => Instruction::Acknowledge,
            SessionStatus::InProgress => match role.question_at(session.current_question_index) {
                Some(question) => Instruction::Ask {
                    prompt: Self::prompt_ref(role, question),
                    include_intro: false,
                    intro_audio: None,
                    window: ResponseWindow::Standard,
                },
                // Pointer past the end without a terminal status should not
                // persist; treat it as a finished call.
                None => Instruction::Conclude {
                    goodbye_audio: role.goodbye_audio.clone(),
                },
            },
        }
    }

    /// INITIATED -> ASKING(0): the call was answered.
    fn on_answered(&self, session: CallSession, role: Role) -> Result<FlowOutcome, DomainError> {
        if session.status.is_terminal() {
            return Ok(FlowOutcome::reply(self.instruction_for(&session, &role)));
        }

        let fresh = session.current_question_index == 0 && session.responses.is_empty();
        let question = role
            .question_at(session.current_question_index)
            .ok_or_else(|| {
                DomainError::Validation(format!("role {} has no questions", role.key))
            })?;

        tracing::info!(
            assessment_id = %session.id,
            question = %question.key,
            "call answered, asking first question"
        );

        Ok(FlowOutcome::reply(Instruction::Ask {
            prompt: Self::prompt_ref(&role, question),
            include_intro: fresh,
            intro_audio: if fresh { role.intro_audio.clone() } else { None },
            window: ResponseWindow::Standard,
        }))
    }

    /// AWAITING_RESPONSE(i) transitions driven by a closed response window.
    async fn on_recording(
        &self,
        session: CallSession,
        role: Role,
        question_key: &str,
        recording_url: Option<String>,
        duration_secs: u32,
        digits: Option<String>,
    ) -> Result<FlowOutcome, DomainError> {
        if session.status.is_terminal() {
            return Ok(FlowOutcome::reply(self.instruction_for(&session, &role)));
        }

        if role.question(question_key).is_none() {
            return Err(DomainError::malformed(format!(
                "unknown question key {question_key} for role {}",
                role.key
            )));
        }

        let current = match role.question_at(session.current_question_index) {
            Some(q) => q.clone(),
            None => return self.finish(session, role).await,
        };

        // Duplicate or out-of-order delivery: the pointer has already moved
        // past (or not yet reached) this question. Re-issue the instruction
        // for the current state without advancing anything.
        if current.key != question_key {
            tracing::info!(
                assessment_id = %session.id,
                received = %question_key,
                current = %current.key,
                "stale recording callback, re-issuing current instruction"
            );
            return Ok(FlowOutcome::reply(self.instruction_for(&session, &role)));
        }

        let digits = digits.filter(|d| !d.is_empty());
        if digits.as_deref() == Some(REPEAT_KEY) {
            return self.on_repeat(session, role, &current).await;
        }

        let submitted = digits.as_deref() == Some(SUBMIT_KEY);
        let silent = !submitted
            && digits.is_none()
            && (recording_url.is_none() || duration_secs <= self.config.response_timeout_secs);

        if silent {
            return self.on_silence(session, role, &current).await;
        }

        let mut session = session;
        match recording_url {
            Some(url) => {
                tracing::info!(
                    assessment_id = %session.id,
                    question = %current.key,
                    duration_secs,
                    "answer recorded"
                );
                session.record_answer(&current.key, url);
            }
            // Submit key pressed before anything was recorded.
            None => session.record_no_response(&current.key),
        }
        self.advance(session, role).await
    }

    /// Keypad-only collection result: repeat request or continue listening.
    async fn on_gather(
        &self,
        session: CallSession,
        role: Role,
        question_key: &str,
        digits: Option<String>,
    ) -> Result<FlowOutcome, DomainError> {
        if session.status.is_terminal() {
            return Ok(FlowOutcome::reply(self.instruction_for(&session, &role)));
        }

        let current = match role.question_at(session.current_question_index) {
            Some(q) => q.clone(),
            None => return self.finish(session, role).await,
        };
        if current.key != question_key {
            return Ok(FlowOutcome::reply(self.instruction_for(&session, &role)));
        }

        if digits.as_deref() == Some(REPEAT_KEY) {
            return self.on_repeat(session, role, &current).await;
        }

        Ok(FlowOutcome::reply(Instruction::Listen {
            prompt: Self::prompt_ref(&role, &current),
            window: ResponseWindow::Standard,
        }))
    }

    /// AWAITING_RESPONSE(i) -> REPEATING(i), bounded by the repeat cap.
    async fn on_repeat(
        &self,
        mut session: CallSession,
        role: Role,
        current: &Question,
    ) -> Result<FlowOutcome, DomainError> {
        let count = session.note_repeat(&current.key);

        if count > self.config.repeat_cap {
            tracing::info!(
                assessment_id = %session.id,
                question = %current.key,
                count,
                "repeat cap exceeded, advancing with no-response marker"
            );
            session.record_no_response(&current.key);
            return self.advance(session, role).await;
        }

        tracing::info!(
            assessment_id = %session.id,
            question = %current.key,
            count,
            "replaying question"
        );
        let session = self.persist(session, &role).await?;
        let question = role.question(&current.key).cloned();
        match (session.status, question) {
            (SessionStatus::InProgress, Some(q)) => Ok(FlowOutcome::reply(Instruction::Replay {
                prompt: Self::prompt_ref(&role, &q),
                window: ResponseWindow::Standard,
            })),
            _ => Ok(FlowOutcome::reply(self.instruction_for(&session, &role))),
        }
    }

    /// Silence handling: one instructions replay, then a no-response
    /// advance. Never leaves the candidate on a dead line.
    async fn on_silence(
        &self,
        mut session: CallSession,
        role: Role,
        current: &Question,
    ) -> Result<FlowOutcome, DomainError> {
        let count = session.note_timeout(&current.key);

        if count <= 1 {
            tracing::info!(
                assessment_id = %session.id,
                question = %current.key,
                "silence after question, playing instructions"
            );
            let session = self.persist(session, &role).await?;
            if session.status.is_terminal() {
                return Ok(FlowOutcome::reply(self.instruction_for(&session, &role)));
            }
            return Ok(FlowOutcome::reply(Instruction::Encourage {
                prompt: Self::prompt_ref(&role, current),
            }));
        }

        tracing::info!(
            assessment_id = %session.id,
            question = %current.key,
            "second silence, advancing with no-response marker"
        );
        session.record_no_response(&current.key);
        self.advance(session, role).await
    }

    /// Move past the current (now resolved) question: ask the next one, or
    /// complete the session after the last.
    async fn advance(
        &self,
        mut session: CallSession,
        role: Role,
    ) -> Result<FlowOutcome, DomainError> {
        session.advance();

        if let Some(next) = role.question_at(session.current_question_index).cloned() {
            let expected_index = session.current_question_index;
            let session = self.persist(session, &role).await?;
            if session.status != SessionStatus::InProgress
                || session.current_question_index != expected_index
            {
                // A concurrent invocation got there first; answer from the
                // fresh state.
                return Ok(FlowOutcome::reply(self.instruction_for(&session, &role)));
            }
            return Ok(FlowOutcome::reply(Instruction::Ask {
                prompt: Self::prompt_ref(&role, &next),
                include_intro: false,
                intro_audio: None,
                window: ResponseWindow::Standard,
            }));
        }

        self.finish(session, role).await
    }

    /// ASKING(last) -> COMPLETED: every question is resolved.
    async fn finish(
        &self,
        mut session: CallSession,
        role: Role,
    ) -> Result<FlowOutcome, DomainError> {
        if session.status == SessionStatus::InProgress {
            session.mark_completed(&role)?;
        }
        let session = self.persist(session, &role).await?;

        let completed = (session.status == SessionStatus::Completed).then(|| session.id.clone());
        tracing::info!(assessment_id = %session.id, "assessment call completed");

        Ok(FlowOutcome {
            instruction: Instruction::Conclude {
                goodbye_audio: role.goodbye_audio.clone(),
            },
            completed,
        })
    }

    /// Hangups and provider failures.
    async fn on_status(
        &self,
        mut session: CallSession,
        role: Role,
        call_status: &str,
    ) -> Result<FlowOutcome, DomainError> {
        if session.status.is_terminal() {
            return Ok(FlowOutcome::reply(Instruction::Acknowledge));
        }

        match call_status {
            // Hangup before the goodbye: preserve partial answers, exclude
            // from scoring.
            "completed" => {
                tracing::info!(assessment_id = %session.id, "call hung up mid-assessment, abandoning");
                session.mark_abandoned();
                self.persist(session, &role).await?;
            }
            "failed" | "busy" | "no-answer" | "canceled" => {
                tracing::warn!(assessment_id = %session.id, call_status, "provider reported call failure");
                session.mark_failed();
                self.persist(session, &role).await?;
            }
            other => {
                tracing::debug!(assessment_id = %session.id, call_status = other, "ignoring status update");
            }
        }

        Ok(FlowOutcome::reply(Instruction::Acknowledge))
    }

    /// Conditional write with duplicate-delivery fallback: a version
    /// conflict means a concurrent invocation already applied an equivalent
    /// transition, so the fresh state wins and our mutation is dropped.
    async fn persist(
        &self,
        session: CallSession,
        _role: &Role,
    ) -> Result<CallSession, DomainError> {
        match self.sessions.update(&session).await {
            Ok(saved) => Ok(saved),
            Err(DomainError::Conflict(_)) => {
                tracing::warn!(
                    assessment_id = %session.id,
                    "stale session write, deferring to concurrent update"
                );
                self.sessions
                    .find(&session.id)
                    .await?
                    .ok_or_else(|| DomainError::session_not_found(&session.id))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use vetline::domain::{
        Category, PhoneNumber, RecommendationPolicy, Rubric, RubricTier,
    };

    /// HashMap-backed session store with the same conditional-write
    /// semantics as the Postgres adapter.
    pub struct InMemorySessions {
        store: Mutex<HashMap<String, CallSession>>,
    }

    impl InMemorySessions {
        pub fn new() -> Self {
            Self {
                store: Mutex::new(HashMap::new()),
            }
        }

        pub fn get(&self, id: &str) -> Option<CallSession> {
            self.store.lock().unwrap().get(id).cloned()
        }
    }

    #[async_trait]
    impl SessionRepository for InMemorySessions {
        async fn create(&self, session: &CallSession) -> Result<CallSession, DomainError> {
            let mut store = self.store.lock().unwrap();
            store.insert(session.id.clone(), session.clone());
            Ok(session.clone())
        }

        async fn find(&self, id: &str) -> Result<Option<CallSession>, DomainError> {
            Ok(self.store.lock().unwrap().get(id).cloned())
        }

        async fn find_by_call_id(
            &self,
            call_id: &str,
        ) -> Result<Option<CallSession>, DomainError> {
            Ok(self
                .store
                .lock()
                .unwrap()
                .values()
                .find(|s| s.provider_call_id.as_deref() == Some(call_id))
                .cloned())
        }

        async fn update(&self, session: &CallSession) -> Result<CallSession, DomainError> {
            let mut store = self.store.lock().unwrap();
            let stored = store
                .get(&session.id)
                .ok_or_else(|| DomainError::session_not_found(&session.id))?;
            if stored.version != session.version {
                return Err(DomainError::Conflict(session.id.clone()));
            }
            let mut updated = session.clone();
            updated.version += 1;
            updated.updated_at = Utc::now();
            store.insert(session.id.clone(), updated.clone());
            Ok(updated)
        }
    }

    pub fn test_rubric() -> Rubric {
        Rubric {
            ideal: RubricTier {
                score: 10.0,
                description: "ideal".to_string(),
            },
            acceptable: RubricTier {
                score: 7.0,
                description: "acceptable".to_string(),
            },
            red_flag: RubricTier {
                score: 2.0,
                description: "red flag".to_string(),
            },
            no_response: RubricTier {
                score: 0.0,
                description: "no answer".to_string(),
            },
        }
    }

    /// A role with `n` questions q0..q(n-1) in one category.
    pub fn test_role(n: usize) -> Role {
        Role {
            key: "bartender".to_string(),
            name: "Bartender".to_string(),
            intro_audio: Some("https://assets.test/intro.mp3".to_string()),
            goodbye_audio: Some("https://assets.test/goodbye.mp3".to_string()),
            recommendation_policy: RecommendationPolicy::default(),
            categories: vec![Category {
                key: "general".to_string(),
                name: "General".to_string(),
                pass_threshold_pct: 70.0,
            }],
            questions: (0..n)
                .map(|i| Question {
                    key: format!("q{i}"),
                    category: "general".to_string(),
                    prompt: format!("question {i}"),
                    audio_url: None,
                    rubric: test_rubric(),
                })
                .collect(),
        }
    }

    pub fn bank_with(role: &Role) -> Arc<QuestionBank> {
        let mut map = HashMap::new();
        map.insert(role.key.clone(), role.clone());
        let json = serde_json::to_string(&map).unwrap();
        Arc::new(QuestionBank::from_json(&json).unwrap())
    }

    async fn setup(questions: usize) -> (Arc<InMemorySessions>, FlowService<InMemorySessions>) {
        let role = test_role(questions);
        let sessions = Arc::new(InMemorySessions::new());
        let service = FlowService::new(sessions.clone(), bank_with(&role), FlowConfig::default());
        let session = CallSession::new(
            "a1".to_string(),
            role.key.clone(),
            PhoneNumber::parse("+15551234567").unwrap(),
            None,
        );
        sessions.create(&session).await.unwrap();
        (sessions, service)
    }

    fn recording(question: &str, url: &str, digits: Option<&str>) -> CallEvent {
        CallEvent::RecordingComplete {
            assessment_id: "a1".to_string(),
            question_key: question.to_string(),
            recording_url: Some(url.to_string()),
            duration_secs: 30,
            digits: digits.map(|d| d.to_string()),
        }
    }

    fn silence(question: &str) -> CallEvent {
        CallEvent::RecordingComplete {
            assessment_id: "a1".to_string(),
            question_key: question.to_string(),
            recording_url: None,
            duration_secs: 5,
            digits: None,
        }
    }

    #[tokio::test]
    async fn test_answered_asks_first_question_with_intro() {
        let (_, service) = setup(3).await;
        let outcome = service
            .handle_event(CallEvent::Answered {
                assessment_id: "a1".to_string(),
            })
            .await
            .unwrap();

        match outcome.instruction {
            Instruction::Ask {
                prompt,
                include_intro,
                ..
            } => {
                assert_eq!(prompt.question_key, "q0");
                assert!(include_intro);
            }
            other => panic!("expected Ask, got {other:?}"),
        }
        assert!(outcome.completed.is_none());
    }

    #[tokio::test]
    async fn test_submit_attaches_recording_and_advances() {
        let (sessions, service) = setup(3).await;
        let outcome = service
            .handle_event(recording("q0", "https://rec/q0.mp3", Some("#")))
            .await
            .unwrap();

        match outcome.instruction {
            Instruction::Ask { prompt, .. } => assert_eq!(prompt.question_key, "q1"),
            other => panic!("expected Ask, got {other:?}"),
        }
        let stored = sessions.get("a1").unwrap();
        assert_eq!(stored.current_question_index, 1);
        assert_eq!(
            stored.responses["q0"].recording_url.as_deref(),
            Some("https://rec/q0.mp3")
        );
    }

    #[tokio::test]
    async fn test_duplicate_submit_is_idempotent() {
        // "Submit answer, question 2 of 5" delivered twice: the pointer
        // ends at question 3, not question 4.
        let (sessions, service) = setup(5).await;
        service
            .handle_event(recording("q0", "https://rec/q0.mp3", None))
            .await
            .unwrap();
        service
            .handle_event(recording("q1", "https://rec/q1.mp3", None))
            .await
            .unwrap();
        assert_eq!(sessions.get("a1").unwrap().current_question_index, 2);

        let outcome = service
            .handle_event(recording("q1", "https://rec/q1-dup.mp3", None))
            .await
            .unwrap();

        let stored = sessions.get("a1").unwrap();
        assert_eq!(stored.current_question_index, 2);
        assert_eq!(
            stored.responses["q1"].recording_url.as_deref(),
            Some("https://rec/q1.mp3")
        );
        // The duplicate is answered with the current question, not an error.
        match outcome.instruction {
            Instruction::Ask { prompt, .. } => assert_eq!(prompt.question_key, "q2"),
            other => panic!("expected Ask, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_repeat_replays_until_cap_then_advances() {
        // Cap 3: three replays, then the fourth request forces an advance
        // with a no-response marker.
        let (sessions, service) = setup(3).await;

        for _ in 0..3 {
            let outcome = service
                .handle_event(recording("q0", "https://rec/q0.mp3", Some("*")))
                .await
                .unwrap();
            match outcome.instruction {
                Instruction::Replay { ref prompt, .. } => assert_eq!(prompt.question_key, "q0"),
                ref other => panic!("expected Replay, got {other:?}"),
            }
            assert_eq!(sessions.get("a1").unwrap().current_question_index, 0);
        }

        let outcome = service
            .handle_event(recording("q0", "https://rec/q0.mp3", Some("*")))
            .await
            .unwrap();
        match outcome.instruction {
            Instruction::Ask { prompt, .. } => assert_eq!(prompt.question_key, "q1"),
            other => panic!("expected Ask, got {other:?}"),
        }
        let stored = sessions.get("a1").unwrap();
        assert_eq!(stored.current_question_index, 1);
        assert!(stored.responses["q0"].no_response);
    }

    #[tokio::test]
    async fn test_first_silence_encourages_second_advances() {
        let (sessions, service) = setup(2).await;

        let outcome = service.handle_event(silence("q0")).await.unwrap();
        assert!(matches!(outcome.instruction, Instruction::Encourage { .. }));
        assert_eq!(sessions.get("a1").unwrap().current_question_index, 0);

        let outcome = service.handle_event(silence("q0")).await.unwrap();
        match outcome.instruction {
            Instruction::Ask { prompt, .. } => assert_eq!(prompt.question_key, "q1"),
            other => panic!("expected Ask, got {other:?}"),
        }
        let stored = sessions.get("a1").unwrap();
        assert!(stored.responses["q0"].no_response);
    }

    #[tokio::test]
    async fn test_last_answer_completes_and_signals_scoring() {
        let (sessions, service) = setup(2).await;
        service
            .handle_event(recording("q0", "https://rec/q0.mp3", None))
            .await
            .unwrap();
        let outcome = service
            .handle_event(recording("q1", "https://rec/q1.mp3", Some("#")))
            .await
            .unwrap();

        assert!(matches!(outcome.instruction, Instruction::Conclude { .. }));
        assert_eq!(outcome.completed.as_deref(), Some("a1"));

        let stored = sessions.get("a1").unwrap();
        assert_eq!(stored.status, SessionStatus::Completed);
        assert!(stored.responses.values().all(|r| r.is_resolved()));
    }

    #[tokio::test]
    async fn test_hangup_before_completion_abandons() {
        let (sessions, service) = setup(3).await;
        service
            .handle_event(recording("q0", "https://rec/q0.mp3", None))
            .await
            .unwrap();

        let outcome = service
            .handle_event(CallEvent::StatusUpdate {
                assessment_id: "a1".to_string(),
                call_status: "completed".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(outcome.instruction, Instruction::Acknowledge));
        assert!(outcome.completed.is_none());
        let stored = sessions.get("a1").unwrap();
        assert_eq!(stored.status, SessionStatus::Abandoned);
        // Partial answers are preserved.
        assert!(stored.responses.contains_key("q0"));
    }

    #[tokio::test]
    async fn test_provider_failure_marks_failed() {
        let (sessions, service) = setup(3).await;
        service
            .handle_event(CallEvent::StatusUpdate {
                assessment_id: "a1".to_string(),
                call_status: "no-answer".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(sessions.get("a1").unwrap().status, SessionStatus::Failed);
    }

    #[tokio::test]
    async fn test_events_after_terminal_state_do_not_mutate() {
        let (sessions, service) = setup(2).await;
        service
            .handle_event(recording("q0", "https://rec/q0.mp3", None))
            .await
            .unwrap();
        service
            .handle_event(recording("q1", "https://rec/q1.mp3", None))
            .await
            .unwrap();
        let before = sessions.get("a1").unwrap();
        assert_eq!(before.status, SessionStatus::Completed);

        let outcome = service
            .handle_event(recording("q1", "https://rec/q1-late.mp3", None))
            .await
            .unwrap();
        assert!(matches!(outcome.instruction, Instruction::Conclude { .. }));
        assert!(outcome.completed.is_none());
        let after = sessions.get("a1").unwrap();
        assert_eq!(after.version, before.version);
    }

    #[tokio::test]
    async fn test_pointer_is_monotonic_across_event_sequence() {
        let (sessions, service) = setup(3).await;
        let events = vec![
            CallEvent::Answered {
                assessment_id: "a1".to_string(),
            },
            recording("q0", "https://rec/q0.mp3", Some("*")),
            recording("q0", "https://rec/q0.mp3", None),
            silence("q1"),
            silence("q1"),
            recording("q0", "https://rec/q0-dup.mp3", None),
            recording("q2", "https://rec/q2.mp3", Some("#")),
        ];

        let mut last_index = 0;
        for event in events {
            service.handle_event(event).await.unwrap();
            let index = sessions.get("a1").unwrap().current_question_index;
            assert!(index >= last_index, "pointer went backwards");
            last_index = index;
        }
        assert_eq!(sessions.get("a1").unwrap().status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_unknown_session_is_an_error() {
        let (_, service) = setup(1).await;
        let err = service
            .handle_event(CallEvent::Answered {
                assessment_id: "missing".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_question_key_is_malformed() {
        let (_, service) = setup(1).await;
        let err = service
            .handle_event(recording("nope", "https://rec/x.mp3", None))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::MalformedEvent(_)));
    }

    #[tokio::test]
    async fn test_gather_repeat_replays_question() {
        let (sessions, service) = setup(2).await;
        let outcome = service
            .handle_event(CallEvent::GatherComplete {
                assessment_id: "a1".to_string(),
                question_key: "q0".to_string(),
                digits: Some("*".to_string()),
            })
            .await
            .unwrap();
        assert!(matches!(outcome.instruction, Instruction::Replay { .. }));
        assert_eq!(sessions.get("a1").unwrap().repeat_count("q0"), 1);
    }
}
