#[cfg(test)]
#[path = "suggestions_test.rs"]
mod tests;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::models::ApiBox;
use crate::domain::models::Event;
use crate::domain::models::Suggestion;

pub const MIN_QUERY_LENGTH: usize = 3;

/// What picking a suggestion changes in the search form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub query: String,
    pub language: Option<String>,
}

/// Fetches question suggestions once typing has paused. At most one timer is
/// pending at a time, while dispatched fetches always run to completion and
/// report back through the event channel tagged with a generation.
pub struct SuggestionFetcher {
    api: ApiBox,
    tx: mpsc::UnboundedSender<Event>,
    quiet_window: Duration,
    timer: Option<JoinHandle<()>>,
    scheduled_generation: u64,
    applied_generation: u64,
    pub suggestions: Vec<Suggestion>,
    pub visible: bool,
}

impl SuggestionFetcher {
    pub fn new(
        api: ApiBox,
        tx: mpsc::UnboundedSender<Event>,
        quiet_window: Duration,
    ) -> SuggestionFetcher {
        return SuggestionFetcher {
            api,
            tx,
            quiet_window,
            timer: None,
            scheduled_generation: 0,
            applied_generation: 0,
            suggestions: vec![],
            visible: false,
        };
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    pub fn has_pending_timer(&self) -> bool {
        return self
            .timer
            .as_ref()
            .map(|timer| return !timer.is_finished())
            .unwrap_or(false);
    }

    pub fn on_query_change(&mut self, text: &str, language: &str) {
        self.cancel_timer();

        if text.chars().count() < MIN_QUERY_LENGTH {
            self.suggestions.clear();
            self.visible = false;
            // Anything still in flight predates the clear.
            self.applied_generation = self.scheduled_generation;
            return;
        }

        self.scheduled_generation += 1;
        let generation = self.scheduled_generation;
        let api = self.api.clone();
        let tx = self.tx.clone();
        let query = text.to_string();
        let language = language.to_string();
        let quiet_window = self.quiet_window;

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_window).await;

            // Detached so later keystrokes can't abort a dispatched request.
            tokio::spawn(async move {
                tracing::debug!(generation, query = %query, "fetching suggestions");
                match api.suggestions(&query, &language).await {
                    Ok(suggestions) => {
                        let _ = tx.send(Event::SuggestionsLoaded {
                            generation,
                            suggestions,
                        });
                    }
                    Err(err) => {
                        tracing::error!(error = ?err, generation, "Failed to fetch suggestions");
                    }
                }
            });
        }));
    }

    /// Applies a fetch result unless a newer one was applied already. Returns
    /// true when the suggestion list changed.
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::SuggestionsLoaded {
                generation,
                suggestions,
            } => {
                if generation <= self.applied_generation {
                    tracing::debug!(
                        generation,
                        applied = self.applied_generation,
                        "discarding stale suggestions"
                    );
                    return false;
                }

                self.applied_generation = generation;
                self.suggestions = suggestions;
                self.visible = true;
                return true;
            }
        }
    }

    pub fn select(&mut self, index: usize) -> Option<Selection> {
        let suggestion = self.suggestions.get(index)?;
        let selection = Selection {
            query: suggestion.text.to_string(),
            language: suggestion.language_switch(),
        };
        self.visible = false;

        return Some(selection);
    }
}

impl Drop for SuggestionFetcher {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
