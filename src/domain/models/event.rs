use super::Suggestion;

/// Results reported back to the interactive loop by background tasks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    SuggestionsLoaded {
        generation: u64,
        suggestions: Vec<Suggestion>,
    },
}
