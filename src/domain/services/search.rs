#[cfg(test)]
#[path = "search_test.rs"]
mod tests;

use anyhow::Result;

use crate::domain::models::ApiBox;
use crate::domain::models::ImageSet;
use crate::domain::models::ObjectUrls;
use crate::domain::models::SearchRequest;
use crate::domain::models::SearchResponse;
use crate::domain::models::ValidationError;

pub const SEARCH_FAILED: &str = "Failed to process search. Please try again.";

/// The search form plus the response it currently displays.
pub struct SearchPage {
    pub query: String,
    pub language: String,
    pub session_id: Option<String>,
    pub images: ImageSet,
    pub response: Option<SearchResponse>,
    pub error: Option<String>,
}

impl SearchPage {
    pub fn new(urls: ObjectUrls, language: &str, session_id: Option<String>) -> SearchPage {
        return SearchPage {
            query: "".to_string(),
            language: language.to_string(),
            session_id: session_id.filter(|e| return !e.is_empty()),
            images: ImageSet::new(urls),
            response: None,
            error: None,
        };
    }

    /// Checks the form and builds the request without touching any state.
    pub fn validate(&self) -> Result<SearchRequest, ValidationError> {
        if self.query.trim().is_empty() && self.images.is_empty() {
            return Err(ValidationError::EmptySearch);
        }

        let Some(session_id) = self.session_id.as_ref().filter(|e| return !e.is_empty()) else {
            return Err(ValidationError::NoSession);
        };

        return Ok(SearchRequest {
            query: self.query.to_string(),
            language_filter: self.language.to_string(),
            session_id: session_id.to_string(),
            images: self.images.files(),
        });
    }

    /// Submits the form. Validation failures never reach the network. A
    /// backend failure sets the error banner and leaves the inputs as they
    /// were so the user can retry.
    pub async fn submit(&mut self, api: &ApiBox) -> Result<&SearchResponse> {
        let req = self.validate()?;
        tracing::debug!(
            query = %req.query,
            language = %req.language_filter,
            session_id = %req.session_id,
            images = req.images.len(),
            "submitting search"
        );

        let res = match api.search(req).await {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "search failed");
                self.error = Some(SEARCH_FAILED.to_string());
                return Err(err);
            }
        };

        self.error = None;
        self.query.clear();
        self.images.clear();

        return Ok(self.response.insert(res));
    }
}
