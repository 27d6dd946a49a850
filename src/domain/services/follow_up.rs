#[cfg(test)]
#[path = "follow_up_test.rs"]
mod tests;

use anyhow::Result;

use crate::domain::models::ApiBox;
use crate::domain::models::ChatTurn;
use crate::domain::models::ContinueChatRequest;
use crate::domain::models::FollowUpPrompt;
use crate::domain::models::FollowUpType;
use crate::domain::models::ImageSet;
use crate::domain::models::ObjectUrls;
use crate::domain::models::SearchResponse;
use crate::domain::models::ValidationError;

pub const FOLLOW_UP_FAILED: &str = "Failed to process follow-up. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Open,
    Sending,
}

/// A follow-up that has been appended to the transcript but not yet answered.
/// It must be settled with `commit` or `rollback`.
#[derive(Debug)]
pub struct PendingSend {
    generation: u64,
    pub request: ContinueChatRequest,
}

/// Multi-turn conversation about a search result. Questions are appended as
/// soon as they are sent and removed again if the backend fails to answer.
pub struct FollowUpChat {
    state: ChatState,
    generation: u64,
    seed: Option<SearchResponse>,
    session_id: Option<String>,
    transcript: Vec<ChatTurn>,
    pub language: String,
    pub input: String,
    pub images: ImageSet,
    pub prompts: Vec<FollowUpPrompt>,
    pub error: Option<String>,
}

impl FollowUpChat {
    pub fn new(urls: ObjectUrls) -> FollowUpChat {
        return FollowUpChat {
            state: ChatState::Idle,
            generation: 0,
            seed: None,
            session_id: None,
            transcript: vec![],
            language: "all".to_string(),
            input: "".to_string(),
            images: ImageSet::new(urls),
            prompts: FollowUpPrompt::fallback(),
            error: None,
        };
    }

    pub fn state(&self) -> ChatState {
        return self.state;
    }

    pub fn is_open(&self) -> bool {
        return self.state != ChatState::Idle;
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        return &self.transcript;
    }

    /// Loads quick prompts from the backend, falling back to the built-in list
    /// when none are configured or the request fails.
    pub async fn load_prompts(&mut self, api: &ApiBox) {
        self.prompts = match api.follow_up_prompts().await {
            Ok(Some(prompts)) if !prompts.is_empty() => prompts,
            Ok(_) => FollowUpPrompt::fallback(),
            Err(err) => {
                tracing::error!(error = ?err, "Failed to load follow-up prompts");
                FollowUpPrompt::fallback()
            }
        };
    }

    pub fn open(&mut self, seed: &SearchResponse, session_id: Option<String>) {
        self.generation += 1;

        let question = if seed.question_text.is_empty() {
            "Original question".to_string()
        } else {
            seed.question_text.to_string()
        };

        self.transcript = vec![ChatTurn::Original {
            question,
            code: seed.valid_code_blocks(),
            explanation: seed.explanation.to_string(),
        }];
        self.language = if seed.language.is_empty() {
            "all".to_string()
        } else {
            seed.language.to_string()
        };
        self.seed = Some(seed.clone());
        self.session_id = session_id.filter(|e| return !e.is_empty());
        self.error = None;
        self.state = ChatState::Open;
    }

    /// Closes the conversation. Anything still in flight for it is ignored
    /// when it settles.
    pub fn close(&mut self) {
        self.generation += 1;
        self.state = ChatState::Idle;
        self.seed = None;
        self.transcript.clear();
        self.input.clear();
        self.images.clear();
        self.error = None;
    }

    /// Appends the question and moves to `Sending`. `text` overrides the input
    /// box, as quick prompts do.
    pub fn begin_send(
        &mut self,
        text: Option<&str>,
        approach_type: Option<FollowUpType>,
    ) -> Result<PendingSend, ValidationError> {
        let seed = match (self.state, &self.seed) {
            (ChatState::Sending, _) => {
                return Err(ValidationError::Busy("A follow-up".to_string()))
            }
            (ChatState::Open, Some(seed)) => seed,
            _ => return Err(ValidationError::ConversationClosed),
        };

        let text = text
            .map(|e| return e.to_string())
            .unwrap_or_else(|| return self.input.to_string());
        if text.trim().is_empty() && self.images.is_empty() {
            return Err(ValidationError::EmptyFollowUp);
        }

        let request = ContinueChatRequest {
            previous_result: seed.clone(),
            follow_up_question: text.to_string(),
            language_filter: self.language.to_string(),
            approach_type: approach_type.unwrap_or_default(),
            session_id: self.session_id.clone(),
            images: self.images.files(),
        };

        self.transcript.push(ChatTurn::Question {
            text,
            images: self.images.previews(),
        });
        self.state = ChatState::Sending;
        self.error = None;

        return Ok(PendingSend {
            generation: self.generation,
            request,
        });
    }

    fn is_stale(&self, pending: &PendingSend) -> bool {
        if pending.generation != self.generation || self.state != ChatState::Sending {
            tracing::debug!(
                generation = pending.generation,
                current = self.generation,
                "ignoring follow-up for a closed conversation"
            );
            return true;
        }

        return false;
    }

    /// Appends the answer. Returns false when the conversation was closed
    /// while the request was in flight.
    pub fn commit(&mut self, pending: PendingSend, res: SearchResponse) -> bool {
        if self.is_stale(&pending) {
            return false;
        }

        self.transcript.push(ChatTurn::Answer {
            explanation: res.explanation.to_string(),
            code: res.valid_code_blocks(),
        });
        self.input.clear();
        self.images.clear();
        self.state = ChatState::Open;

        return true;
    }

    /// Removes the unanswered question, leaving input and images for a retry.
    pub fn rollback(&mut self, pending: PendingSend) -> bool {
        if self.is_stale(&pending) {
            return false;
        }

        if self.transcript.last().map(|e| return e.is_question()) == Some(true) {
            self.transcript.pop();
        }
        self.error = Some(FOLLOW_UP_FAILED.to_string());
        self.state = ChatState::Open;

        return true;
    }

    async fn dispatch(&mut self, api: &ApiBox, pending: PendingSend) -> Result<()> {
        tracing::debug!(
            approach_type = %pending.request.approach_type,
            images = pending.request.images.len(),
            "sending follow-up"
        );

        match api.continue_chat(pending.request.clone()).await {
            Ok(res) => {
                self.commit(pending, res);
                return Ok(());
            }
            Err(err) => {
                tracing::error!(error = ?err, "follow-up failed");
                self.rollback(pending);
                return Err(err);
            }
        }
    }

    /// Sends the input box as a debugging follow-up.
    pub async fn send(&mut self, api: &ApiBox) -> Result<()> {
        let pending = self.begin_send(None, None)?;
        return self.dispatch(api, pending).await;
    }

    pub async fn send_prompt(&mut self, api: &ApiBox, index: usize) -> Result<()> {
        let prompt = self
            .prompts
            .get(index)
            .cloned()
            .ok_or(ValidationError::OutOfBounds(index + 1))?;

        let pending = self.begin_send(Some(&prompt.text), Some(prompt.prompt_type))?;
        return self.dispatch(api, pending).await;
    }
}
