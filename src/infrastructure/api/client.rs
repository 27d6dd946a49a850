#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::multipart::Part;
use reqwest::Method;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use serde_json::Value;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AlternativeRequest;
use crate::domain::models::ApiError;
use crate::domain::models::ApprovalRequest;
use crate::domain::models::ContinueChatRequest;
use crate::domain::models::FollowUpPrompt;
use crate::domain::models::ImageFile;
use crate::domain::models::InterviewApi;
use crate::domain::models::NewSession;
use crate::domain::models::Note;
use crate::domain::models::NotificationList;
use crate::domain::models::PromptsResponse;
use crate::domain::models::SearchRequest;
use crate::domain::models::SearchResponse;
use crate::domain::models::Session;
use crate::domain::models::SessionResult;
use crate::domain::models::Suggestion;
use crate::domain::models::User;
use crate::domain::services::AuthStore;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct EndSessionResponse {
    #[serde(default)]
    document_path: Option<String>,
}

fn with_images(mut form: Form, images: &[ImageFile]) -> Result<Form> {
    for image in images {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.name.to_string())
            .mime_str(&image.mime)?;
        form = form.part("images", part);
    }

    return Ok(form);
}

/// Pulls a readable message out of an error body. The backend usually sends
/// `{"detail": "..."}`, but validation failures carry a list.
fn error_detail(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        match json.get("detail") {
            Some(Value::String(detail)) => return detail.to_string(),
            Some(detail) => return detail.to_string(),
            None => {}
        }
    }

    return body.trim().to_string();
}

/// Notification ids go back as numbers whenever they look like one.
fn notification_ids(ids: &[String]) -> Vec<Value> {
    return ids
        .iter()
        .map(|id| match id.parse::<i64>() {
            Ok(number) => return Value::from(number),
            Err(_) => return Value::from(id.as_str()),
        })
        .collect();
}

/// `/languages` has answered with plain strings, `{value, label}` objects and a
/// wrapping `{"languages": [...]}` object over time.
fn parse_languages(json: Value) -> Vec<String> {
    let items = match json {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("languages") {
            Some(Value::Array(items)) => items,
            _ => vec![],
        },
        _ => vec![],
    };

    return items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) => return Some(text),
            Value::Object(obj) => {
                return obj
                    .get("value")
                    .or_else(|| return obj.get("name"))
                    .and_then(|e| return e.as_str())
                    .map(|e| return e.to_string());
            }
            _ => return None,
        })
        .collect();
}

/// HTTP client for the CodeQuest REST API. Every request carries the stored
/// bearer token, and any 401 forgets it.
pub struct ApiClient {
    url: String,
    auth: AuthStore,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(url: &str, auth: AuthStore, timeout: Duration) -> Result<ApiClient> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        return Ok(ApiClient {
            url: url.trim_end_matches('/').to_string(),
            auth,
            client,
        });
    }

    pub fn from_config(auth: AuthStore) -> Result<ApiClient> {
        return ApiClient::new(
            &Config::get(ConfigKey::ApiURL),
            auth,
            Duration::from_millis(Config::millis(ConfigKey::RequestTimeout)),
        );
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.client.request(method, format!("{}{path}", self.url));
        if let Some(token) = self.auth.token().await {
            req = req.bearer_auth(token);
        }

        return req;
    }

    async fn send(&self, req: RequestBuilder, path: &str) -> Result<reqwest::Response> {
        let res = match req.send().await {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, path = path, "CodeQuest API is not reachable");
                return Err(ApiError::Transport {
                    url: format!("{}{path}", self.url),
                    reason: err.to_string(),
                }
                .into());
            }
        };

        let status = res.status().as_u16();
        if status == 401 {
            tracing::warn!(path = path, "Unauthorized, clearing token");
            self.auth.clear().await?;
            return Err(ApiError::Unauthorized.into());
        }

        if !res.status().is_success() {
            let detail = error_detail(&res.text().await.unwrap_or_default());
            tracing::error!(status = status, path = path, detail = %detail, "CodeQuest API request failed");
            return Err(ApiError::Status {
                path: path.to_string(),
                status,
                detail,
            }
            .into());
        }

        return Ok(res);
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder, path: &str) -> Result<T> {
        let res = self.send(req, path).await?;
        let body = res.json::<T>().await?;

        return Ok(body);
    }
}

#[async_trait]
impl InterviewApi for ApiClient {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let req = self.request(Method::GET, "/health").await;
        self.send(req, "/health").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn login(&self, username: &str, password: &str) -> Result<()> {
        let req = self
            .request(Method::POST, "/token")
            .await
            .form(&[("username", username), ("password", password)]);
        let res: TokenResponse = self.json(req, "/token").await?;
        if res.access_token.is_empty() {
            bail!("Login succeeded but no token was returned");
        }

        self.auth.set(&res.access_token).await?;
        tracing::info!(username = username, "logged in");

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn logout(&self) -> Result<()> {
        return self.auth.clear().await;
    }

    #[allow(clippy::implicit_return)]
    async fn me(&self) -> Result<User> {
        let req = self.request(Method::GET, "/me").await;
        return self.json(req, "/me").await;
    }

    #[allow(clippy::implicit_return)]
    async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
        let form = Form::new()
            .text("query", req.query)
            .text("language_filter", req.language_filter)
            .text("session_id", req.session_id);
        let form = with_images(form, &req.images)?;

        let http_req = self.request(Method::POST, "/search").await.multipart(form);
        return self.json(http_req, "/search").await;
    }

    #[allow(clippy::implicit_return)]
    async fn continue_chat(&self, req: ContinueChatRequest) -> Result<SearchResponse> {
        let mut form = Form::new()
            .text("previous_result", serde_json::to_string(&req.previous_result)?)
            .text("follow_up_question", req.follow_up_question)
            .text("language_filter", req.language_filter)
            .text("approach_type", req.approach_type.to_string());
        if let Some(session_id) = req.session_id {
            form = form.text("session_id", session_id);
        }
        let form = with_images(form, &req.images)?;

        let http_req = self
            .request(Method::POST, "/continue-chat")
            .await
            .multipart(form);
        return self.json(http_req, "/continue-chat").await;
    }

    #[allow(clippy::implicit_return)]
    async fn generate_alternative(&self, req: AlternativeRequest) -> Result<SearchResponse> {
        let mut form = Form::new()
            .text("question_text", req.question_text)
            .text("current_code", req.current_code)
            .text("current_explanation", req.current_explanation)
            .text("language", req.language)
            .text("approach_type", req.approach_type.to_string());
        if let Some(session_id) = req.session_id {
            form = form.text("session_id", session_id);
        }

        let http_req = self
            .request(Method::POST, "/generate-alternative")
            .await
            .multipart(form);
        return self.json(http_req, "/generate-alternative").await;
    }

    #[allow(clippy::implicit_return)]
    async fn suggestions(&self, query: &str, language: &str) -> Result<Vec<Suggestion>> {
        let req = self
            .request(Method::GET, "/suggestions")
            .await
            .query(&[("q", query), ("language_filter", language)]);
        return self.json(req, "/suggestions").await;
    }

    #[allow(clippy::implicit_return)]
    async fn submit_for_approval(&self, req: ApprovalRequest) -> Result<()> {
        let mut form = Form::new()
            .text("question_text", req.question_text)
            .text("code_blocks", req.code_blocks)
            .text("explanation", req.explanation)
            .text("difficulty", req.difficulty)
            .text("language", req.language)
            .text("search_hash", req.search_hash)
            .text("image_paths", req.image_paths)
            .text("approach_type", req.approach_type.to_string());
        if let Some(session_id) = req.session_id {
            form = form.text("session_id", session_id);
        }
        if let Some(original_query) = req.original_query {
            form = form.text("original_query", original_query);
        }

        let http_req = self
            .request(Method::POST, "/submit-for-approval")
            .await
            .multipart(form);
        self.send(http_req, "/submit-for-approval").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn follow_up_prompts(&self) -> Result<Option<Vec<FollowUpPrompt>>> {
        let req = self.request(Method::GET, "/prompts").await;
        let res: PromptsResponse = self.json(req, "/prompts").await?;

        return Ok(res.default_follow_up_prompts);
    }

    #[allow(clippy::implicit_return)]
    async fn languages(&self) -> Result<Vec<String>> {
        let req = self.request(Method::GET, "/languages").await;
        let res: Value = self.json(req, "/languages").await?;

        return Ok(parse_languages(res));
    }

    #[allow(clippy::implicit_return)]
    async fn list_sessions(&self) -> Result<Vec<Session>> {
        let req = self.request(Method::GET, "/sessions").await;
        return self.json(req, "/sessions").await;
    }

    #[allow(clippy::implicit_return)]
    async fn active_session(&self) -> Result<Option<Session>> {
        let req = self.request(Method::GET, "/sessions/active").await;
        match self.json::<Option<Session>>(req, "/sessions/active").await {
            Ok(session) => return Ok(session),
            Err(err) if ApiError::is_not_found(&err) => return Ok(None),
            Err(err) => return Err(err),
        }
    }

    #[allow(clippy::implicit_return)]
    async fn create_session(&self, session: NewSession) -> Result<Session> {
        let req = self
            .request(Method::POST, "/sessions")
            .await
            .json(&session);
        return self.json(req, "/sessions").await;
    }

    #[allow(clippy::implicit_return)]
    async fn end_session(&self, session_id: &str, format: &str) -> Result<Option<String>> {
        let path = format!("/sessions/{session_id}/end");
        let req = self
            .request(Method::PUT, &path)
            .await
            .query(&[("format_type", format)]);
        let res: EndSessionResponse = self.json(req, &path).await?;

        return Ok(res.document_path.filter(|e| return !e.is_empty()));
    }

    #[allow(clippy::implicit_return)]
    async fn session_results(&self, session_id: &str) -> Result<Vec<SessionResult>> {
        let path = format!("/sessions/{session_id}/results");
        let req = self.request(Method::GET, &path).await;
        return self.json(req, &path).await;
    }

    #[allow(clippy::implicit_return)]
    async fn list_notes(&self, session_id: &str) -> Result<Vec<Note>> {
        let path = format!("/sessions/{session_id}/notes");
        let req = self.request(Method::GET, &path).await;
        return self.json(req, &path).await;
    }

    #[allow(clippy::implicit_return)]
    async fn add_note(&self, session_id: &str, content: &str) -> Result<Note> {
        let path = format!("/sessions/{session_id}/notes");
        let body = serde_json::json!({
            "session_id": session_id,
            "content": content,
            "search_result_id": Value::Null,
        });
        let req = self.request(Method::POST, &path).await.json(&body);
        return self.json(req, &path).await;
    }

    #[allow(clippy::implicit_return)]
    async fn notifications(&self) -> Result<NotificationList> {
        let req = self.request(Method::GET, "/notifications").await;
        return self.json(req, "/notifications").await;
    }

    #[allow(clippy::implicit_return)]
    async fn mark_notifications_read(&self, ids: &[String]) -> Result<()> {
        let body = serde_json::json!({ "notification_ids": notification_ids(ids) });
        let req = self
            .request(Method::PUT, "/notifications/mark-read")
            .await
            .json(&body);
        self.send(req, "/notifications/mark-read").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn mark_all_notifications_read(&self) -> Result<()> {
        let req = self
            .request(Method::PUT, "/notifications/mark-all-read")
            .await;
        self.send(req, "/notifications/mark-all-read").await?;

        return Ok(());
    }
}
