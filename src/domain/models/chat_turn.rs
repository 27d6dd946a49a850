use super::CodeBlock;
use super::PreviewUrl;

/// One entry of a follow-up conversation transcript. Transcripts only live in
/// memory for as long as the conversation is open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatTurn {
    Original {
        question: String,
        code: Vec<CodeBlock>,
        explanation: String,
    },
    Question {
        text: String,
        images: Vec<PreviewUrl>,
    },
    Answer {
        explanation: String,
        code: Vec<CodeBlock>,
    },
}

impl ChatTurn {
    pub fn is_question(&self) -> bool {
        return matches!(self, ChatTurn::Question { .. });
    }

    pub fn code(&self) -> &[CodeBlock] {
        match self {
            ChatTurn::Original { code, .. } => return code,
            ChatTurn::Answer { code, .. } => return code,
            ChatTurn::Question { .. } => return &[],
        }
    }
}
