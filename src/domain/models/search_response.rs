#[cfg(test)]
#[path = "search_response_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::serde_ext::null_as_default;
use super::serde_ext::optional_string_or_number;
use super::valid_blocks;
use super::ApproachType;
use super::CodeBlock;

/// The structured solution returned by `/search`, `/generate-alternative` and
/// `/continue-chat`. Missing or null fields degrade to empty values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub question_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub language: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code_blocks: Vec<CodeBlock>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clean_code_blocks: Vec<CodeBlock>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub explanation: String,
    #[serde(default)]
    pub approach_type: ApproachType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub search_hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_paths: Vec<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub can_generate_alternative: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_query: Option<String>,
}

impl SearchResponse {
    pub fn valid_code_blocks(&self) -> Vec<CodeBlock> {
        return valid_blocks(&self.clean_code_blocks);
    }

    /// The code handed to the alternative generator: the first raw block.
    pub fn first_code(&self) -> String {
        return self
            .code_blocks
            .first()
            .map(|block| return block.code.to_string())
            .unwrap_or_default();
    }
}
