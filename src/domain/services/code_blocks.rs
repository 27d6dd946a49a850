#[cfg(test)]
#[path = "code_blocks_test.rs"]
mod tests;

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::Instant;

use crate::domain::models::valid_blocks;
use crate::domain::models::CodeBlock;
use crate::domain::models::SearchResponse;
use crate::domain::models::ValidationError;

static FENCE: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r"```(\w+)?\n([\s\S]*?)```").expect("fence pattern is valid");
});

pub const COPIED_FOR: Duration = Duration::from_secs(2);

/// Block numbers shown to the user start at 1.
fn block_number(text: &str) -> Result<usize> {
    let number = text.trim().parse::<usize>()?;
    if number == 0 {
        return Err(ValidationError::OutOfBounds(0).into());
    }

    return Ok(number);
}

/// Finds fenced code in Markdown. Fences without a language become "text".
pub fn extract_fenced(text: &str) -> Vec<CodeBlock> {
    return FENCE
        .captures_iter(text)
        .map(|cap| {
            let language = cap.get(1).map(|e| return e.as_str()).unwrap_or("text");
            let code = cap.get(2).map(|e| return e.as_str()).unwrap_or_default();
            return CodeBlock::new(language, code.trim());
        })
        .collect();
}

/// Removes fenced code from Markdown, since it is displayed separately.
pub fn strip_fenced(text: &str) -> String {
    return FENCE.replace_all(text, "").to_string();
}

/// The blocks to show for a response: the valid clean blocks, or whatever is
/// fenced in the explanation when there are none.
pub fn display_blocks(res: &SearchResponse) -> Vec<CodeBlock> {
    let blocks = valid_blocks(&res.clean_code_blocks);
    if !blocks.is_empty() {
        return blocks;
    }

    return extract_fenced(&res.explanation);
}

pub fn copy_text(blocks: &[CodeBlock]) -> Result<String, ValidationError> {
    if blocks.is_empty() {
        return Err(ValidationError::NoCode);
    }

    return Ok(blocks
        .iter()
        .map(|block| return block.code.to_string())
        .collect::<Vec<String>>()
        .join("\n\n"));
}

/// Identifies one copy button. `scope` is a transcript turn index, or a name
/// for blocks outside the transcript.
pub fn copy_key<T: fmt::Display>(scope: T, block: usize) -> String {
    return format!("{scope}-{block}");
}

/// The code blocks currently on screen, numbered from 1 for `/copy`.
#[derive(Default)]
pub struct CodeBlocks {
    codeblocks: Vec<CodeBlock>,
}

impl CodeBlocks {
    pub fn replace(&mut self, blocks: Vec<CodeBlock>) {
        self.codeblocks = blocks;
    }

    pub fn blocks(&self) -> &[CodeBlock] {
        return &self.codeblocks;
    }

    /// Resolves `/copy` arguments such as `2`, `1,3` or `1..3` to zero based
    /// block indexes. No arguments selects every block.
    pub fn indexes_from_args(&self, args: &[String]) -> Result<Vec<usize>> {
        let args = args
            .iter()
            .map(|e| return e.trim().to_string())
            .filter(|e| return !e.is_empty())
            .collect::<Vec<String>>();

        if args.is_empty() {
            return Ok((0..self.codeblocks.len()).collect());
        }

        let mut indexes = vec![];
        for arg in args.iter() {
            for e in arg.split(',') {
                let trimmed = e.trim();
                if trimmed.contains("..") {
                    let split = trimmed.split("..").collect::<Vec<&str>>();
                    let first = block_number(split[0])? - 1;
                    let last = block_number(split[1])?;

                    indexes.extend_from_slice(&(first..last).collect::<Vec<usize>>())
                } else if !trimmed.is_empty() {
                    indexes.push(block_number(trimmed)? - 1);
                }
            }
        }

        if let Some(missing) = indexes.iter().find(|e| return **e >= self.codeblocks.len()) {
            return Err(ValidationError::OutOfBounds(missing + 1).into());
        }

        return Ok(indexes);
    }

    pub fn text_for(&self, indexes: &[usize]) -> Result<String, ValidationError> {
        let mut selected = vec![];
        for index in indexes {
            let Some(block) = self.codeblocks.get(*index) else {
                return Err(ValidationError::OutOfBounds(index + 1));
            };
            selected.push(block.clone());
        }

        return copy_text(&selected);
    }

    pub fn text_from_args(&self, args: &[String]) -> Result<String> {
        let indexes = self.indexes_from_args(args)?;
        return Ok(self.text_for(&indexes)?);
    }
}

/// Tracks which copy buttons should show "copied". Each key expires on its
/// own two seconds after its last copy.
pub struct CopyTracker {
    copied: HashMap<String, Instant>,
    ttl: Duration,
}

impl Default for CopyTracker {
    fn default() -> CopyTracker {
        return CopyTracker {
            copied: HashMap::new(),
            ttl: COPIED_FOR,
        };
    }
}

impl CopyTracker {
    pub fn mark(&mut self, key: &str) {
        self.copied.insert(key.to_string(), Instant::now());
    }

    pub fn is_copied(&self, key: &str) -> bool {
        return self
            .copied
            .get(key)
            .map(|at| return at.elapsed() < self.ttl)
            .unwrap_or(false);
    }

    /// Drops expired indicators.
    pub fn prune(&mut self) {
        let ttl = self.ttl;
        self.copied.retain(|_, at| return at.elapsed() < ttl);
    }

    pub fn active(&self) -> usize {
        return self
            .copied
            .values()
            .filter(|at| return at.elapsed() < self.ttl)
            .count();
    }
}
