#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use super::clipboard::ClipboardService;
use super::copy_key;
use super::display_blocks;
use super::extract_fenced;
use super::AlternativeContext;
use super::AlternativeGenerator;
use super::CodeBlocks;
use super::CopyTracker;
use super::FollowUpChat;
use super::SearchPage;
use super::SuggestionFetcher;
use super::ALTERNATIVE_FAILED;
use super::FOLLOW_UP_FAILED;
use super::SEARCH_FAILED;
use crate::domain::models::ApiBox;
use crate::domain::models::ApiError;
use crate::domain::models::ApprovalRequest;
use crate::domain::models::ApproachType;
use crate::domain::models::ChatTurn;
use crate::domain::models::CodeBlock;
use crate::domain::models::Event;
use crate::domain::models::ImageFile;
use crate::domain::models::ImageSet;
use crate::domain::models::Note;
use crate::domain::models::Notice;
use crate::domain::models::ObjectUrls;
use crate::domain::models::SlashCommand;
use crate::domain::models::ValidationError;

pub const COPIED: &str = "Code copied to clipboard!";
pub const COPY_FAILED: &str = "Failed to copy code";
pub const SAVED: &str = "Solution saved successfully!";
pub const SAVE_FAILED: &str = "Failed to save solution";

/// What the terminal should show after handling a line of input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    Notice(Notice),
    Response,
    Alternative,
    Transcript,
    Answer,
    Suggestions,
    Prompts,
    Images,
    Languages(Vec<String>),
    Notes(Vec<Note>),
    PickSession,
    Help,
    Quit,
}

/// Which response `/copy` and `/save` act on: whatever was displayed last.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    None,
    Search,
    Alternative,
    Turn(usize),
}

pub type ClipboardFn = fn(String) -> Result<()>;

fn error_notice(err: &anyhow::Error, fallback: &str) -> Notice {
    if let Some(err) = err.downcast_ref::<ValidationError>() {
        return Notice::error(&err.to_string());
    }
    if ApiError::is_unauthorized(err) {
        return Notice::error(&ApiError::Unauthorized.to_string());
    }

    return Notice::error(fallback);
}

fn notice(err: ValidationError) -> Vec<Output> {
    return vec![Output::Notice(Notice::error(&err.to_string()))];
}

/// Code blocks of a transcript turn. Answers without clean blocks fall back to
/// what is fenced in their explanation.
pub fn turn_blocks(turn: &ChatTurn) -> Vec<CodeBlock> {
    match turn {
        ChatTurn::Answer { explanation, code } if code.is_empty() => {
            return extract_fenced(explanation)
        }
        _ => return turn.code().to_vec(),
    }
}

/// Everything the interactive client knows, created once at startup and
/// handed to the loop that owns it.
pub struct AppState {
    api: ApiBox,
    clipboard: ClipboardFn,
    prompts_loaded: bool,
    pub urls: ObjectUrls,
    pub search: SearchPage,
    pub alternatives: AlternativeGenerator,
    pub follow_up: FollowUpChat,
    pub suggestions: SuggestionFetcher,
    pub codeblocks: CodeBlocks,
    pub copies: CopyTracker,
    pub focus: Focus,
}

impl AppState {
    pub fn new(
        api: ApiBox,
        tx: mpsc::UnboundedSender<Event>,
        language: &str,
        session_id: Option<String>,
        quiet_window: Duration,
    ) -> AppState {
        let urls = ObjectUrls::default();

        return AppState {
            api: api.clone(),
            clipboard: ClipboardService::set,
            prompts_loaded: false,
            search: SearchPage::new(urls.clone(), language, session_id),
            alternatives: AlternativeGenerator::default(),
            follow_up: FollowUpChat::new(urls.clone()),
            suggestions: SuggestionFetcher::new(api, tx, quiet_window),
            codeblocks: CodeBlocks::default(),
            copies: CopyTracker::default(),
            focus: Focus::None,
            urls,
        };
    }

    pub fn with_clipboard(mut self, clipboard: ClipboardFn) -> AppState {
        self.clipboard = clipboard;
        return self;
    }

    /// Drops everything tied to the signed in user.
    pub fn reset(&mut self) {
        self.follow_up.close();
        self.alternatives.clear();
        self.search.response = None;
        self.search.error = None;
        self.search.query.clear();
        self.search.images.clear();
        self.focus = Focus::None;
    }

    fn failure(&mut self, err: &anyhow::Error, fallback: &str) -> Vec<Output> {
        if ApiError::is_unauthorized(err) {
            self.reset();
        }

        return vec![Output::Notice(error_notice(err, fallback))];
    }

    /// Images go to the follow-up while a conversation is open, otherwise to
    /// the search form.
    fn active_images(&mut self) -> &mut ImageSet {
        if self.follow_up.is_open() {
            return &mut self.follow_up.images;
        }

        return &mut self.search.images;
    }

    pub fn handle_event(&mut self, event: Event) -> Vec<Output> {
        if self.suggestions.handle_event(event) {
            return vec![Output::Suggestions];
        }

        return vec![];
    }

    pub async fn submit_search(&mut self) -> Vec<Output> {
        let res = self.search.submit(&self.api).await.map(|_| return ());
        if let Err(err) = res {
            return self.failure(&err, SEARCH_FAILED);
        }

        self.follow_up.close();
        self.alternatives.clear();
        self.focus = Focus::Search;

        return vec![Output::Response];
    }

    pub async fn generate_alternative(&mut self, approach_type: ApproachType) -> Vec<Output> {
        let Some(res) = self.search.response.as_ref() else {
            return notice(ValidationError::NoResponse);
        };
        if !res.can_generate_alternative {
            return notice(ValidationError::AlternativesUnavailable);
        }

        // Same session the follow-up uses; the response's own id is a fallback.
        let mut context = AlternativeContext::from_response(res);
        if self.search.session_id.is_some() {
            context.session_id = self.search.session_id.clone();
        }

        let res = self
            .alternatives
            .generate(&self.api, approach_type, &context)
            .await
            .map(|_| return ());
        if let Err(err) = res {
            return self.failure(&err, ALTERNATIVE_FAILED);
        }
        self.focus = Focus::Alternative;

        return vec![Output::Alternative];
    }

    pub async fn open_follow_up(&mut self) -> Vec<Output> {
        let Some(seed) = self.search.response.clone() else {
            return notice(ValidationError::NoResponse);
        };

        if !self.prompts_loaded {
            self.follow_up.load_prompts(&self.api).await;
            self.prompts_loaded = true;
        }

        self.follow_up.open(&seed, self.search.session_id.clone());
        self.focus = Focus::Turn(0);

        return vec![Output::Transcript];
    }

    pub fn close_follow_up(&mut self) -> Vec<Output> {
        if !self.follow_up.is_open() {
            return notice(ValidationError::ConversationClosed);
        }

        self.follow_up.close();
        self.focus = if self.search.response.is_some() {
            Focus::Search
        } else {
            Focus::None
        };

        return vec![Output::Notice(Notice::info("Follow-up conversation closed"))];
    }

    fn settle_follow_up(&mut self, res: Result<()>) -> Vec<Output> {
        if let Err(err) = res {
            return self.failure(&err, FOLLOW_UP_FAILED);
        }

        self.focus = Focus::Turn(self.follow_up.transcript().len().saturating_sub(1));
        return vec![Output::Answer];
    }

    pub async fn send_follow_up(&mut self, text: &str) -> Vec<Output> {
        self.follow_up.input = text.to_string();
        let res = self.follow_up.send(&self.api).await;

        return self.settle_follow_up(res);
    }

    pub async fn send_prompt(&mut self, index: usize) -> Vec<Output> {
        let res = self.follow_up.send_prompt(&self.api, index).await;
        return self.settle_follow_up(res);
    }

    pub async fn add_images(&mut self, paths: &[String]) -> Vec<Output> {
        let mut outputs = vec![];
        let mut files = vec![];
        for path in paths {
            match ImageFile::from_path(Path::new(path)).await {
                Ok(file) => files.push(file),
                Err(err) => {
                    tracing::error!(error = ?err, path = %path, "Failed to read image");
                    outputs.push(Output::Notice(Notice::error(&format!(
                        "Could not read {path}"
                    ))));
                }
            }
        }

        let errors = self.active_images().add_files(files);
        for err in errors {
            outputs.push(Output::Notice(Notice::error(&err.to_string())));
        }
        outputs.push(Output::Images);

        return outputs;
    }

    pub fn remove_image(&mut self, index: usize) -> Vec<Output> {
        if let Err(err) = self.active_images().remove(index) {
            return notice(err);
        }

        return vec![Output::Images];
    }

    pub fn set_language(&mut self, language: &str) -> Vec<Output> {
        self.search.language = language.to_string();
        if self.follow_up.is_open() {
            self.follow_up.language = language.to_string();
        }

        return vec![Output::Notice(Notice::info(&format!(
            "Language filter set to {language}"
        )))];
    }

    pub fn select_session(&mut self, session_id: &str) -> Vec<Output> {
        self.search.session_id = Some(session_id.to_string()).filter(|e| return !e.is_empty());
        if self.search.session_id.is_none() {
            return notice(ValidationError::NoSession);
        }

        return vec![Output::Notice(Notice::info(&format!(
            "Using session {session_id}"
        )))];
    }

    pub fn pick_suggestion(&mut self, index: usize) -> Vec<Output> {
        let Some(selection) = self.suggestions.select(index) else {
            return notice(ValidationError::OutOfBounds(index + 1));
        };

        self.search.query = selection.query;
        let mut outputs = vec![];
        if let Some(language) = selection.language {
            outputs.append(&mut self.set_language(&language));
        }
        outputs.push(Output::Notice(Notice::info(&format!(
            "Query set to \"{}\", use /search to submit it",
            self.search.query
        ))));

        return outputs;
    }

    fn focused_blocks(&self) -> Option<(String, Vec<CodeBlock>)> {
        match self.focus {
            Focus::None => return None,
            Focus::Search => {
                return self
                    .search
                    .response
                    .as_ref()
                    .map(|res| return ("search".to_string(), display_blocks(res)))
            }
            Focus::Alternative => {
                return self
                    .alternatives
                    .response
                    .as_ref()
                    .map(|res| return ("alternative".to_string(), display_blocks(res)))
            }
            Focus::Turn(idx) => {
                return self
                    .follow_up
                    .transcript()
                    .get(idx)
                    .map(|turn| return (idx.to_string(), turn_blocks(turn)))
            }
        }
    }

    pub fn copy(&mut self, args: &[String]) -> Vec<Output> {
        let Some((scope, blocks)) = self.focused_blocks() else {
            return notice(ValidationError::NoCode);
        };
        self.codeblocks.replace(blocks);

        let (text, indexes) = match self
            .codeblocks
            .indexes_from_args(args)
            .and_then(|indexes| return Ok((self.codeblocks.text_for(&indexes)?, indexes)))
        {
            Ok(res) => res,
            Err(err) => return vec![Output::Notice(error_notice(&err, COPY_FAILED))],
        };

        if let Err(err) = (self.clipboard)(text) {
            tracing::error!(error = ?err, "Failed to copy code");
            return vec![Output::Notice(Notice::error(COPY_FAILED))];
        }

        self.copies.prune();
        for idx in indexes {
            self.copies.mark(&copy_key(&scope, idx));
        }

        return vec![Output::Notice(Notice::success(COPIED))];
    }

    pub async fn save_solution(&mut self) -> Vec<Output> {
        let res = if self.focus == Focus::Alternative {
            self.alternatives.response.as_ref()
        } else {
            self.search.response.as_ref()
        };
        let Some(res) = res else {
            return notice(ValidationError::NoResponse);
        };

        let req = match ApprovalRequest::from_response(res) {
            Ok(req) => req,
            Err(err) => return self.failure(&err, SAVE_FAILED),
        };

        if let Err(err) = self.api.submit_for_approval(req).await {
            tracing::error!(error = ?err, "Failed to save solution");
            return self.failure(&err, SAVE_FAILED);
        }

        return vec![Output::Notice(Notice::success(SAVED))];
    }

    pub async fn add_note(&mut self, content: &str) -> Vec<Output> {
        let Some(session_id) = self.search.session_id.clone() else {
            return notice(ValidationError::NoSession);
        };
        if content.trim().is_empty() {
            return self.list_notes().await;
        }

        match self.api.add_note(&session_id, content).await {
            Ok(_) => return vec![Output::Notice(Notice::success("Note added"))],
            Err(err) => {
                tracing::error!(error = ?err, session_id = %session_id, "Failed to add note");
                return self.failure(&err, "Failed to add note");
            }
        }
    }

    pub async fn list_notes(&mut self) -> Vec<Output> {
        let Some(session_id) = self.search.session_id.clone() else {
            return notice(ValidationError::NoSession);
        };

        match self.api.list_notes(&session_id).await {
            Ok(notes) => return vec![Output::Notes(notes)],
            Err(err) => return self.failure(&err, "Failed to load notes"),
        }
    }

    pub async fn languages(&mut self) -> Vec<Output> {
        match self.api.languages().await {
            Ok(languages) => return vec![Output::Languages(languages)],
            Err(err) => return self.failure(&err, "Failed to load languages"),
        }
    }

    /// Plain text searches, or asks a follow-up while a conversation is open.
    pub async fn handle_text(&mut self, text: &str) -> Vec<Output> {
        if self.follow_up.is_open() {
            return self.send_follow_up(text).await;
        }

        self.search.query = text.to_string();
        return self.submit_search().await;
    }

    pub async fn handle_slash_commands(&mut self, command: SlashCommand) -> Vec<Output> {
        if command.is_quit() {
            return vec![Output::Quit];
        }
        if command.is_help() {
            return vec![Output::Help];
        }
        if command.is_image() {
            return self.add_images(&command.args).await;
        }
        if command.is_remove_image() {
            return match command.index() {
                Ok(idx) => self.remove_image(idx),
                Err(err) => vec![Output::Notice(error_notice(&err, &err.to_string()))],
            };
        }
        if command.is_language() {
            if command.args.is_empty() {
                return self.languages().await;
            }
            return self.set_language(&command.text());
        }
        if command.is_session() {
            if command.args.is_empty() {
                return vec![Output::PickSession];
            }
            return self.select_session(&command.text());
        }
        if command.is_suggest() {
            let language = self.search.language.to_string();
            self.suggestions.on_query_change(&command.text(), &language);
            return vec![];
        }
        if command.is_pick() {
            return match command.index() {
                Ok(idx) => self.pick_suggestion(idx),
                Err(err) => vec![Output::Notice(error_notice(&err, &err.to_string()))],
            };
        }
        if command.is_search() {
            if !command.args.is_empty() {
                self.search.query = command.text();
            }
            return self.submit_search().await;
        }
        if command.is_alternative() {
            let text = command.text();
            let Some(approach_type) = ApproachType::parse(&text) else {
                return notice(ValidationError::UnsupportedApproach(text));
            };
            return self.generate_alternative(approach_type).await;
        }
        if command.is_follow_up() {
            return self.open_follow_up().await;
        }
        if command.is_prompts() {
            if !self.follow_up.is_open() {
                return notice(ValidationError::ConversationClosed);
            }
            return vec![Output::Prompts];
        }
        if command.is_prompt() {
            return match command.index() {
                Ok(idx) => self.send_prompt(idx).await,
                Err(err) => vec![Output::Notice(error_notice(&err, &err.to_string()))],
            };
        }
        if command.is_close() {
            return self.close_follow_up();
        }
        if command.is_copy() {
            return self.copy(&command.args);
        }
        if command.is_save() {
            return self.save_solution().await;
        }
        if command.is_note() {
            return self.add_note(&command.text()).await;
        }

        return vec![Output::Notice(Notice::error(&format!(
            "Unknown command {}, try /help",
            command.name()
        )))];
    }

    pub async fn handle_input(&mut self, text: &str) -> Vec<Output> {
        let text = text.trim();
        if text.is_empty() {
            return vec![];
        }

        if let Some(command) = SlashCommand::parse(text) {
            return self.handle_slash_commands(command).await;
        }
        if text.starts_with('/') {
            let name = text.split_whitespace().next().unwrap_or(text);
            return vec![Output::Notice(Notice::error(&format!(
                "Unknown command {name}, try /help"
            )))];
        }

        return self.handle_text(text).await;
    }
}
