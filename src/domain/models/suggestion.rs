#[cfg(test)]
#[path = "suggestion_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::serde_ext::null_as_default;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionType {
    #[default]
    Question,
    Solution,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub stype: SuggestionType,
    #[serde(default)]
    pub language: Option<String>,
}

impl Suggestion {
    /// The language a selection should switch the filter to, if any.
    pub fn language_switch(&self) -> Option<String> {
        return self
            .language
            .as_ref()
            .filter(|language| return !language.is_empty() && language.as_str() != "all")
            .cloned();
    }
}
