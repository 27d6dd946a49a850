#[cfg(test)]
#[path = "view_test.rs"]
mod tests;

use chrono::Utc;

use crate::domain::models::time_ago;
use crate::domain::models::ChatTurn;
use crate::domain::models::CodeBlock;
use crate::domain::models::FollowUpPrompt;
use crate::domain::models::ImageSet;
use crate::domain::models::Note;
use crate::domain::models::NotificationList;
use crate::domain::models::SearchResponse;
use crate::domain::models::Session;
use crate::domain::models::SessionResult;
use crate::domain::models::Suggestion;
use crate::domain::models::HELP_TEXT;
use crate::domain::models::valid_blocks;
use crate::domain::services::display_blocks;
use crate::domain::services::strip_fenced;
use crate::domain::services::turn_blocks;
use crate::domain::services::AppState;
use crate::domain::services::Output;
use crate::domain::services::Renderer;

fn body(renderer: &dyn Renderer, explanation: &str, blocks: &[CodeBlock]) -> String {
    let mut parts = vec![];
    let explanation = renderer.explanation(&strip_fenced(explanation));
    if !explanation.is_empty() {
        parts.push(explanation);
    }
    for (idx, block) in blocks.iter().enumerate() {
        parts.push(renderer.code(idx, block));
    }

    return parts.join("\n\n");
}

pub fn response(renderer: &dyn Renderer, title: &str, res: &SearchResponse) -> String {
    return format!(
        "{}\n\n{}",
        renderer.title(title),
        body(renderer, &res.explanation, &display_blocks(res))
    );
}

/// Commands that apply to a displayed search response. Alternatives are only
/// offered when the backend allows them.
pub fn hints(res: &SearchResponse) -> String {
    let mut hints = vec!["/followup to ask about it", "/copy for the code", "/save to submit it"];
    if res.can_generate_alternative {
        hints.insert(0, "/alt optimized|simplified|different for another approach");
    }

    return format!("Try {}", hints.join(", "));
}

pub fn turn(renderer: &dyn Renderer, turn: &ChatTurn) -> String {
    match turn {
        ChatTurn::Original {
            question,
            explanation,
            ..
        } => {
            return format!(
                "{}\n\n{}",
                renderer.title(question),
                body(renderer, explanation, &turn_blocks(turn))
            );
        }
        ChatTurn::Question { text, images } => {
            let mut res = format!("> {text}");
            for image in images {
                res += &format!("\n  [image {image}]");
            }
            return res;
        }
        ChatTurn::Answer { explanation, .. } => {
            return body(renderer, explanation, &turn_blocks(turn));
        }
    }
}

pub fn transcript(renderer: &dyn Renderer, turns: &[ChatTurn]) -> String {
    return turns
        .iter()
        .map(|e| return turn(renderer, e))
        .collect::<Vec<String>>()
        .join("\n\n");
}

pub fn suggestions(suggestions: &[Suggestion]) -> String {
    if suggestions.is_empty() {
        return "No suggestions found.".to_string();
    }

    return suggestions
        .iter()
        .enumerate()
        .map(|(idx, suggestion)| {
            if let Some(language) = suggestion.language_switch() {
                return format!("{}. {} ({language})", idx + 1, suggestion.text);
            }
            return format!("{}. {}", idx + 1, suggestion.text);
        })
        .collect::<Vec<String>>()
        .join("\n");
}

pub fn prompts(prompts: &[FollowUpPrompt]) -> String {
    return prompts
        .iter()
        .enumerate()
        .map(|(idx, prompt)| {
            return format!("{}. {} {}", idx + 1, prompt.prompt_type.icon(), prompt.text);
        })
        .collect::<Vec<String>>()
        .join("\n");
}

pub fn images(images: &ImageSet) -> String {
    if images.is_empty() {
        return "No images attached.".to_string();
    }

    return images
        .iter()
        .enumerate()
        .map(|(idx, image)| {
            return format!(
                "{}. {} ({} KB) {}",
                idx + 1,
                image.file.name,
                (image.file.size() + 1023) / 1024,
                image.preview
            );
        })
        .collect::<Vec<String>>()
        .join("\n");
}

pub fn notes(notes: &[Note]) -> String {
    if notes.is_empty() {
        return "No notes for this session yet.".to_string();
    }

    let now = Utc::now();
    return notes
        .iter()
        .map(|note| {
            if let Some(created_at) = note.created_at.as_ref() {
                return format!("- {} ({})", note.content, time_ago(created_at, now));
            }
            return format!("- {}", note.content);
        })
        .collect::<Vec<String>>()
        .join("\n");
}

pub fn session(session: &Session) -> String {
    let mut res = format!("- (ID: {}) {}", session.id, session.candidate_name);
    if !session.company_name.is_empty() {
        res = format!("{res} at {}", session.company_name);
    }
    if !session.session_date.is_empty() {
        res = format!("{res}, {}", session.session_date);
    }
    res = format!("{res}, Searches: {}", session.total_searches);
    if session.is_active {
        res = format!("{res}, active");
    }

    return res;
}

fn excerpt(text: &str, limit: usize) -> String {
    let text = text.split_whitespace().collect::<Vec<&str>>().join(" ");
    if text.chars().count() <= limit {
        return text;
    }

    return format!("{}...", text.chars().take(limit).collect::<String>());
}

pub fn session_results(results: &[SessionResult]) -> String {
    if results.is_empty() {
        return "This session doesn't have any search results yet.".to_string();
    }

    let now = Utc::now();
    return results
        .iter()
        .enumerate()
        .map(|(idx, result)| {
            let mut res = if result.question_text.is_empty() {
                format!("{}. Search {}", idx + 1, idx + 1)
            } else {
                format!("{}. {}", idx + 1, result.question_text)
            };

            let mut details = vec![];
            if let Some(language) = result.language.as_ref().filter(|e| return !e.is_empty()) {
                details.push(language.to_uppercase());
            }
            match valid_blocks(&result.code_blocks).len() {
                0 => {}
                1 => details.push("1 code block".to_string()),
                count => details.push(format!("{count} code blocks")),
            }
            if let Some(created_at) = result.created_at.as_ref() {
                details.push(time_ago(created_at, now));
            }
            if !details.is_empty() {
                res = format!("{res} ({})", details.join(", "));
            }

            let summary = excerpt(&strip_fenced(&result.explanation), 150);
            if !summary.is_empty() {
                res = format!("{res}\n   {summary}");
            }

            return res;
        })
        .collect::<Vec<String>>()
        .join("\n");
}

pub fn notifications(list: &NotificationList) -> String {
    if list.notifications.is_empty() {
        return "You don't have any notifications yet.".to_string();
    }

    let now = Utc::now();
    let mut lines = vec![match list.unread_count {
        1 => "1 unread notification".to_string(),
        count => format!("{count} unread notifications"),
    }];
    for notification in &list.notifications {
        let marker = if notification.is_read { " " } else { "*" };
        let mut line = format!("{marker} (ID: {}) {}", notification.id, notification.message);
        if let Some(created_at) = notification.created_at.as_ref() {
            line = format!("{line} ({})", time_ago(created_at, now));
        }
        if let Some(url) = notification.action_url.as_ref().filter(|e| return !e.is_empty()) {
            line = format!("{line} -> {url}");
        }
        lines.push(line);
    }

    return lines.join("\n");
}

/// Turns an output into terminal text. `None` means nothing to print.
pub fn render(renderer: &dyn Renderer, state: &AppState, output: &Output) -> Option<String> {
    match output {
        Output::Notice(notice) => return Some(notice.colored()),
        Output::Response => {
            let res = state.search.response.as_ref()?;
            let title = if res.question_text.is_empty() {
                "Solution"
            } else {
                res.question_text.as_str()
            };
            return Some(format!(
                "{}\n\n{}",
                response(renderer, title, res),
                hints(res)
            ));
        }
        Output::Alternative => {
            let res = state.alternatives.response.as_ref()?;
            return Some(response(renderer, res.approach_type.title(), res));
        }
        Output::Transcript => {
            return Some(transcript(renderer, state.follow_up.transcript()));
        }
        Output::Answer => {
            let last = state.follow_up.transcript().last()?;
            return Some(turn(renderer, last));
        }
        Output::Suggestions => {
            if !state.suggestions.visible {
                return None;
            }
            return Some(suggestions(&state.suggestions.suggestions));
        }
        Output::Prompts => return Some(prompts(&state.follow_up.prompts)),
        Output::Images => {
            if state.follow_up.is_open() {
                return Some(images(&state.follow_up.images));
            }
            return Some(images(&state.search.images));
        }
        Output::Languages(languages) => return Some(languages.join("\n")),
        Output::Notes(list) => return Some(notes(list)),
        Output::Help => return Some(HELP_TEXT.trim().to_string()),
        Output::PickSession | Output::Quit => return None,
    }
}
