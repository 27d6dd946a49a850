use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use test_utils::search_response_fixture;
use tokio::time::Instant;

use crate::domain::models::AlternativeRequest;
use crate::domain::models::ApiError;
use crate::domain::models::ApprovalRequest;
use crate::domain::models::CodeBlock;
use crate::domain::models::ContinueChatRequest;
use crate::domain::models::FollowUpPrompt;
use crate::domain::models::InterviewApi;
use crate::domain::models::NewSession;
use crate::domain::models::Note;
use crate::domain::models::Notification;
use crate::domain::models::NotificationList;
use crate::domain::models::SearchRequest;
use crate::domain::models::SearchResponse;
use crate::domain::models::Session;
use crate::domain::models::SessionResult;
use crate::domain::models::Suggestion;
use crate::domain::models::User;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Search(SearchRequest),
    ContinueChat(ContinueChatRequest),
    Alternative(AlternativeRequest),
    Suggestions {
        query: String,
        language: String,
        at: Instant,
    },
    Approval(ApprovalRequest),
    Prompts,
    MarkRead(Vec<String>),
    Other(&'static str),
}

/// In-memory `InterviewApi` that records every call. Endpoints listed in
/// `failing` return a 500.
pub struct FakeApi {
    pub response: SearchResponse,
    pub answer: SearchResponse,
    pub prompts: Option<Vec<FollowUpPrompt>>,
    pub failing: Vec<&'static str>,
    pub unauthorized: bool,
    pub suggestion_delays: Mutex<VecDeque<Duration>>,
    pub calls: Mutex<Vec<Call>>,
}

impl Default for FakeApi {
    fn default() -> FakeApi {
        return FakeApi {
            response: serde_json::from_str(search_response_fixture()).unwrap(),
            answer: SearchResponse {
                explanation: "Walk once with a `prev` pointer.".to_string(),
                clean_code_blocks: vec![
                    CodeBlock::new("Statement", "ignored"),
                    CodeBlock::new("python", "prev = None"),
                ],
                ..SearchResponse::default()
            },
            prompts: None,
            failing: vec![],
            unauthorized: false,
            suggestion_delays: Mutex::new(VecDeque::new()),
            calls: Mutex::new(vec![]),
        };
    }
}

impl FakeApi {
    pub fn failing(endpoints: &[&'static str]) -> FakeApi {
        return FakeApi {
            failing: endpoints.to_vec(),
            ..FakeApi::default()
        };
    }

    pub fn calls(&self) -> Vec<Call> {
        return self.calls.lock().unwrap().clone();
    }

    pub fn suggestion_queries(&self) -> Vec<String> {
        return self
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Suggestions { query, .. } => return Some(query),
                _ => return None,
            })
            .collect();
    }

    fn record(&self, endpoint: &'static str, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);

        if self.unauthorized {
            return Err(ApiError::Unauthorized.into());
        }
        if self.failing.contains(&endpoint) {
            return Err(ApiError::Status {
                path: format!("/{endpoint}"),
                status: 500,
                detail: "boom".to_string(),
            }
            .into());
        }

        return Ok(());
    }
}

#[async_trait]
impl InterviewApi for FakeApi {
    async fn health_check(&self) -> Result<()> {
        return self.record("health", Call::Other("health"));
    }

    async fn login(&self, _username: &str, _password: &str) -> Result<()> {
        return self.record("token", Call::Other("token"));
    }

    async fn logout(&self) -> Result<()> {
        return self.record("logout", Call::Other("logout"));
    }

    async fn me(&self) -> Result<User> {
        self.record("me", Call::Other("me"))?;
        return Ok(User {
            id: "1".to_string(),
            username: "ada".to_string(),
            role: "user".to_string(),
        });
    }

    async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
        self.record("search", Call::Search(req))?;
        return Ok(self.response.clone());
    }

    async fn continue_chat(&self, req: ContinueChatRequest) -> Result<SearchResponse> {
        self.record("continue-chat", Call::ContinueChat(req))?;
        return Ok(self.answer.clone());
    }

    async fn generate_alternative(&self, req: AlternativeRequest) -> Result<SearchResponse> {
        let approach_type = req.approach_type;
        self.record("generate-alternative", Call::Alternative(req))?;
        return Ok(SearchResponse {
            approach_type,
            explanation: format!("{} version", approach_type.title()),
            ..self.response.clone()
        });
    }

    async fn suggestions(&self, query: &str, language: &str) -> Result<Vec<Suggestion>> {
        let delay = self.suggestion_delays.lock().unwrap().pop_front();
        self.record(
            "suggestions",
            Call::Suggestions {
                query: query.to_string(),
                language: language.to_string(),
                at: Instant::now(),
            },
        )?;

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        return Ok(vec![Suggestion {
            text: format!("{query} in place"),
            ..Suggestion::default()
        }]);
    }

    async fn submit_for_approval(&self, req: ApprovalRequest) -> Result<()> {
        return self.record("submit-for-approval", Call::Approval(req));
    }

    async fn follow_up_prompts(&self) -> Result<Option<Vec<FollowUpPrompt>>> {
        self.record("prompts", Call::Prompts)?;
        return Ok(self.prompts.clone());
    }

    async fn languages(&self) -> Result<Vec<String>> {
        self.record("languages", Call::Other("languages"))?;
        return Ok(vec!["python".to_string(), "javascript".to_string()]);
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.record("sessions", Call::Other("sessions"))?;
        return Ok(vec![Session {
            id: "S1".to_string(),
            candidate_name: "Ada".to_string(),
            company_name: "Acme".to_string(),
            is_active: true,
            ..Session::default()
        }]);
    }

    async fn active_session(&self) -> Result<Option<Session>> {
        self.record("sessions/active", Call::Other("sessions/active"))?;
        return Ok(None);
    }

    async fn create_session(&self, session: NewSession) -> Result<Session> {
        self.record("create-session", Call::Other("create-session"))?;
        return Ok(Session {
            id: "S2".to_string(),
            candidate_name: session.candidate_name,
            company_name: session.company_name,
            session_date: session.session_date,
            is_active: true,
            ..Session::default()
        });
    }

    async fn end_session(&self, _session_id: &str, _format: &str) -> Result<Option<String>> {
        self.record("end-session", Call::Other("end-session"))?;
        return Ok(None);
    }

    async fn session_results(&self, _session_id: &str) -> Result<Vec<SessionResult>> {
        self.record("session-results", Call::Other("session-results"))?;
        return Ok(vec![SessionResult {
            id: "R1".to_string(),
            question_text: self.response.question_text.clone(),
            language: Some("python".to_string()),
            explanation: self.response.explanation.clone(),
            code_blocks: self.response.clean_code_blocks.clone(),
            ..SessionResult::default()
        }]);
    }

    async fn list_notes(&self, session_id: &str) -> Result<Vec<Note>> {
        self.record("notes", Call::Other("notes"))?;
        return Ok(vec![Note {
            id: "1".to_string(),
            session_id: session_id.to_string(),
            content: "Strong on pointers".to_string(),
            ..Note::default()
        }]);
    }

    async fn add_note(&self, session_id: &str, content: &str) -> Result<Note> {
        self.record("add-note", Call::Other("add-note"))?;
        return Ok(Note {
            id: "2".to_string(),
            session_id: session_id.to_string(),
            content: content.to_string(),
            ..Note::default()
        });
    }

    async fn notifications(&self) -> Result<NotificationList> {
        self.record("notifications", Call::Other("notifications"))?;
        return Ok(NotificationList {
            notifications: vec![Notification {
                id: "7".to_string(),
                message: "Your solution was approved".to_string(),
                ..Notification::default()
            }],
            unread_count: 1,
        });
    }

    async fn mark_notifications_read(&self, ids: &[String]) -> Result<()> {
        return self.record("notifications/mark-read", Call::MarkRead(ids.to_vec()));
    }

    async fn mark_all_notifications_read(&self) -> Result<()> {
        return self.record(
            "notifications/mark-all-read",
            Call::Other("notifications/mark-all-read"),
        );
    }
}
