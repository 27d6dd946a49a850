#[cfg(test)]
#[path = "code_block_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::serde_ext::null_as_default;

/// Pseudo-languages the backend uses to carry the problem statement rather than
/// code.
pub const PLACEHOLDER_LANGUAGES: [&str; 3] = ["Statement", "Restatement", "text"];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    #[serde(default, deserialize_with = "null_as_default")]
    pub language: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
}

impl CodeBlock {
    pub fn new(language: &str, code: &str) -> CodeBlock {
        return CodeBlock {
            language: language.to_string(),
            code: code.to_string(),
        };
    }

    /// A block is displayable when it carries code in a real language.
    pub fn is_valid(&self) -> bool {
        return !self.code.trim().is_empty()
            && !PLACEHOLDER_LANGUAGES.contains(&self.language.as_str());
    }
}

pub fn valid_blocks(blocks: &[CodeBlock]) -> Vec<CodeBlock> {
    return blocks
        .iter()
        .filter(|block| return block.is_valid())
        .cloned()
        .collect();
}
