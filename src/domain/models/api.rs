#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::ApproachType;
use super::FollowUpPrompt;
use super::FollowUpType;
use super::ImageFile;
use super::NewSession;
use super::Note;
use super::NotificationList;
use super::SearchResponse;
use super::Session;
use super::SessionResult;
use super::Suggestion;
use super::User;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub language_filter: String,
    pub session_id: String,
    pub images: Vec<ImageFile>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContinueChatRequest {
    pub previous_result: SearchResponse,
    pub follow_up_question: String,
    pub language_filter: String,
    pub approach_type: FollowUpType,
    pub session_id: Option<String>,
    pub images: Vec<ImageFile>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlternativeRequest {
    pub question_text: String,
    pub current_code: String,
    pub current_explanation: String,
    pub language: String,
    pub approach_type: ApproachType,
    pub session_id: Option<String>,
}

/// Form body of a "save solution" submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApprovalRequest {
    pub question_text: String,
    pub code_blocks: String,
    pub explanation: String,
    pub difficulty: String,
    pub language: String,
    pub search_hash: String,
    pub image_paths: String,
    pub approach_type: ApproachType,
    pub session_id: Option<String>,
    pub original_query: Option<String>,
}

impl ApprovalRequest {
    pub fn from_response(res: &SearchResponse) -> Result<ApprovalRequest> {
        let language = if res.language.is_empty() {
            "text".to_string()
        } else {
            res.language.to_string()
        };

        return Ok(ApprovalRequest {
            question_text: res.question_text.to_string(),
            code_blocks: serde_json::to_string(&res.code_blocks)?,
            explanation: res.explanation.to_string(),
            difficulty: res
                .difficulty
                .clone()
                .filter(|e| return !e.is_empty())
                .unwrap_or_else(|| return "medium".to_string()),
            language,
            search_hash: res.search_hash.to_string(),
            image_paths: serde_json::to_string(&res.image_paths)?,
            approach_type: res.approach_type,
            session_id: res.session_id.clone(),
            original_query: res.original_query.clone(),
        });
    }
}

/// Every backend call the client makes. The HTTP implementation lives in
/// `infrastructure::api`.
#[async_trait]
pub trait InterviewApi {
    /// Used at startup to verify the backend is reachable.
    async fn health_check(&self) -> Result<()>;

    /// Exchanges credentials for a bearer token, which is persisted.
    async fn login(&self, username: &str, password: &str) -> Result<()>;

    /// Forgets the stored bearer token.
    async fn logout(&self) -> Result<()>;

    async fn me(&self) -> Result<User>;

    async fn search(&self, req: SearchRequest) -> Result<SearchResponse>;

    async fn continue_chat(&self, req: ContinueChatRequest) -> Result<SearchResponse>;

    async fn generate_alternative(&self, req: AlternativeRequest) -> Result<SearchResponse>;

    async fn suggestions(&self, query: &str, language: &str) -> Result<Vec<Suggestion>>;

    async fn submit_for_approval(&self, req: ApprovalRequest) -> Result<()>;

    /// Returns `None` when the backend has no prompt list configured.
    async fn follow_up_prompts(&self) -> Result<Option<Vec<FollowUpPrompt>>>;

    async fn languages(&self) -> Result<Vec<String>>;

    async fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Returns `None` when no session is active.
    async fn active_session(&self) -> Result<Option<Session>>;

    async fn create_session(&self, session: NewSession) -> Result<Session>;

    /// Ends a session, returning the report path or URL when one is produced.
    async fn end_session(&self, session_id: &str, format: &str) -> Result<Option<String>>;

    /// Searches filed under a session, newest first as the backend orders them.
    async fn session_results(&self, session_id: &str) -> Result<Vec<SessionResult>>;

    async fn list_notes(&self, session_id: &str) -> Result<Vec<Note>>;

    async fn add_note(&self, session_id: &str, content: &str) -> Result<Note>;

    async fn notifications(&self) -> Result<NotificationList>;

    async fn mark_notifications_read(&self, ids: &[String]) -> Result<()>;

    async fn mark_all_notifications_read(&self) -> Result<()>;
}

pub type ApiBox = Arc<dyn InterviewApi + Send + Sync>;
