#[cfg(test)]
#[path = "alternatives_test.rs"]
mod tests;

use anyhow::Result;

use crate::domain::models::AlternativeRequest;
use crate::domain::models::ApiBox;
use crate::domain::models::ApproachType;
use crate::domain::models::SearchResponse;
use crate::domain::models::ValidationError;

pub const ALTERNATIVE_FAILED: &str = "Failed to generate alternative solution. Please try again.";

/// What the alternative generator needs to know about the displayed answer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlternativeContext {
    pub question_text: String,
    pub current_code: String,
    pub current_explanation: String,
    pub language: String,
    pub session_id: Option<String>,
}

impl AlternativeContext {
    pub fn from_response(res: &SearchResponse) -> AlternativeContext {
        let language = if res.language.is_empty() {
            "python".to_string()
        } else {
            res.language.to_string()
        };

        return AlternativeContext {
            question_text: res.question_text.to_string(),
            current_code: res.first_code(),
            current_explanation: res.explanation.to_string(),
            language,
            session_id: res.session_id.clone(),
        };
    }

    pub fn request(&self, approach_type: ApproachType) -> AlternativeRequest {
        return AlternativeRequest {
            question_text: self.question_text.to_string(),
            current_code: self.current_code.to_string(),
            current_explanation: self.current_explanation.to_string(),
            language: self.language.to_string(),
            approach_type,
            session_id: self.session_id.clone(),
        };
    }
}

/// Requests a different take on the displayed answer. Only one approach is
/// generated at a time, and the result is shown under the original rather
/// than replacing it.
#[derive(Debug, Default)]
pub struct AlternativeGenerator {
    active: Option<ApproachType>,
    pub response: Option<SearchResponse>,
    pub error: Option<String>,
}

impl AlternativeGenerator {
    /// The approach currently being generated, if any.
    pub fn active(&self) -> Option<ApproachType> {
        return self.active;
    }

    pub fn is_busy(&self) -> bool {
        return self.active.is_some();
    }

    pub fn begin(
        &mut self,
        approach_type: ApproachType,
        context: &AlternativeContext,
    ) -> Result<AlternativeRequest, ValidationError> {
        if !approach_type.is_alternative() {
            return Err(ValidationError::UnsupportedApproach(
                approach_type.to_string(),
            ));
        }

        if let Some(active) = self.active {
            return Err(ValidationError::Busy(active.title().to_string()));
        }

        self.active = Some(approach_type);
        self.error = None;

        return Ok(context.request(approach_type));
    }

    pub fn finish(&mut self, res: Result<SearchResponse>) -> Result<&SearchResponse> {
        let approach = self.active.take();

        match res {
            Ok(res) => {
                return Ok(self.response.insert(res));
            }
            Err(err) => {
                tracing::error!(error = ?err, approach = ?approach, "alternative generation failed");
                self.error = Some(ALTERNATIVE_FAILED.to_string());
                return Err(err);
            }
        }
    }

    pub async fn generate(
        &mut self,
        api: &ApiBox,
        approach_type: ApproachType,
        context: &AlternativeContext,
    ) -> Result<&SearchResponse> {
        let req = self.begin(approach_type, context)?;
        let res = api.generate_alternative(req).await;

        return self.finish(res);
    }

    /// A new top-level search discards the previous alternative.
    pub fn clear(&mut self) {
        self.response = None;
        self.error = None;
    }
}
