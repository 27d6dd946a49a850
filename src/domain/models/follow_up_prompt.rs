#[cfg(test)]
#[path = "follow_up_prompt_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::serde_ext::null_as_default;
use super::FollowUpType;

/// A canned follow-up question. Its type doubles as the `approach_type` sent
/// with the follow-up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpPrompt {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub prompt_type: FollowUpType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

impl FollowUpPrompt {
    pub fn new(prompt_type: FollowUpType, text: &str) -> FollowUpPrompt {
        return FollowUpPrompt {
            prompt_type,
            text: text.to_string(),
        };
    }

    /// Used whenever the backend has no prompt list to offer.
    pub fn fallback() -> Vec<FollowUpPrompt> {
        return vec![
            FollowUpPrompt::new(
                FollowUpType::TimeComplexity,
                "Can you optimize the time complexity?",
            ),
            FollowUpPrompt::new(
                FollowUpType::SpaceComplexity,
                "How can we reduce the memory usage?",
            ),
            FollowUpPrompt::new(
                FollowUpType::Debugging,
                "What are common edge cases to watch for?",
            ),
            FollowUpPrompt::new(
                FollowUpType::Alternative,
                "Is there a different approach to solve this?",
            ),
            FollowUpPrompt::new(
                FollowUpType::EdgeCase,
                "How would this handle very large inputs?",
            ),
        ];
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptsResponse {
    #[serde(default)]
    pub default_follow_up_prompts: Option<Vec<FollowUpPrompt>>,
}
