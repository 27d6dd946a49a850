#[cfg(test)]
#[path = "approach_test.rs"]
mod tests;

use std::fmt;

use serde::Deserializer;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::IntoEnumIterator;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, EnumIter, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApproachType {
    #[default]
    Original,
    Optimized,
    Simplified,
    Different,
}

impl ApproachType {
    pub fn parse(text: &str) -> Option<ApproachType> {
        let text = text.trim().to_lowercase();
        return ApproachType::iter().find(|e| return e.to_string() == text);
    }

    /// Approaches the alternative generator can be asked for.
    pub fn alternatives() -> Vec<ApproachType> {
        return ApproachType::iter()
            .filter(|e| return e.is_alternative())
            .collect();
    }

    pub fn is_alternative(&self) -> bool {
        return *self != ApproachType::Original;
    }

    pub fn title(&self) -> &'static str {
        match self {
            ApproachType::Original => return "Original Approach",
            ApproachType::Optimized => return "Optimized Approach",
            ApproachType::Simplified => return "Simplified Approach",
            ApproachType::Different => return "Alternative Approach",
        }
    }
}

impl<'de> serde::Deserialize<'de> for ApproachType {
    fn deserialize<D>(deserializer: D) -> Result<ApproachType, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = <Option<String> as serde::Deserialize>::deserialize(deserializer)?
            .unwrap_or_default();
        return Ok(ApproachType::parse(&text).unwrap_or_default());
    }
}

/// The semantic tag attached to a follow-up question. Unknown tags from the
/// backend are kept verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FollowUpType {
    TimeComplexity,
    SpaceComplexity,
    #[default]
    Debugging,
    Alternative,
    EdgeCase,
    Other(String),
}

impl FollowUpType {
    pub fn as_str(&self) -> &str {
        match self {
            FollowUpType::TimeComplexity => return "time_complexity",
            FollowUpType::SpaceComplexity => return "space_complexity",
            FollowUpType::Debugging => return "debugging",
            FollowUpType::Alternative => return "alternative",
            FollowUpType::EdgeCase => return "edge_case",
            FollowUpType::Other(text) => return text,
        }
    }

    /// Marker shown next to quick prompts in the terminal.
    pub fn icon(&self) -> &'static str {
        match self {
            FollowUpType::TimeComplexity => return "⚡",
            FollowUpType::SpaceComplexity => return "🧠",
            FollowUpType::Debugging => return "🐛",
            FollowUpType::Alternative => return "🔄",
            FollowUpType::EdgeCase => return "🎯",
            FollowUpType::Other(_) => return "💬",
        }
    }
}

impl From<String> for FollowUpType {
    fn from(text: String) -> FollowUpType {
        match text.as_str() {
            "time_complexity" => return FollowUpType::TimeComplexity,
            "space_complexity" => return FollowUpType::SpaceComplexity,
            "debugging" => return FollowUpType::Debugging,
            "alternative" => return FollowUpType::Alternative,
            "edge_case" => return FollowUpType::EdgeCase,
            _ => return FollowUpType::Other(text),
        }
    }
}

impl From<FollowUpType> for String {
    fn from(follow_up_type: FollowUpType) -> String {
        return follow_up_type.as_str().to_string();
    }
}

impl fmt::Display for FollowUpType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        return write!(f, "{}", self.as_str());
    }
}
