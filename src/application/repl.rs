use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use owo_colors::OwoColorize;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use super::view;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ApiBox;
use crate::domain::models::Event;
use crate::domain::models::Notice;
use crate::domain::services::AppState;
use crate::domain::services::Output;
use crate::domain::services::RendererBox;

fn prompt(state: &AppState) {
    let mut label = "search".to_string();
    if state.follow_up.is_open() {
        label = "follow-up".to_string();
    }
    if !state.search.language.is_empty() && state.search.language != "all" {
        label = format!("{label}:{}", state.search.language);
    }

    print!("{} ", format!("{label}>").cyan().bold());
    let _ = std::io::stdout().flush();
}

/// Lets the user choose one of their sessions. Returns `None` when there are
/// none or the picker was dismissed.
pub async fn pick_session(api: &ApiBox) -> Result<Option<String>> {
    let sessions = api.list_sessions().await?;
    if sessions.is_empty() {
        println!("There are no sessions available. Create one with `codequest sessions create`.");
        return Ok(None);
    }

    let options = sessions
        .iter()
        .map(view::session)
        .collect::<Vec<String>>();

    let idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Which session would you like to use?")
        .default(0)
        .items(&options)
        .interact_opt()?;

    return Ok(idx.map(|idx| return sessions[idx].id.to_string()));
}

/// Prints outputs, returning false once the user asked to quit.
async fn print_outputs(
    state: &mut AppState,
    renderer: &RendererBox,
    api: &ApiBox,
    outputs: Vec<Output>,
) -> Result<bool> {
    for output in outputs {
        match output {
            Output::Quit => return Ok(false),
            Output::PickSession => {
                if let Some(session_id) = pick_session(api).await? {
                    for notice in state.select_session(&session_id) {
                        if let Some(text) = view::render(renderer.as_ref(), state, &notice) {
                            println!("{text}\n");
                        }
                    }
                }
            }
            output => {
                if let Some(text) = view::render(renderer.as_ref(), state, &output) {
                    println!("{text}\n");
                }
            }
        }
    }

    return Ok(true);
}

/// Runs the interactive chat until `/quit` or end of input.
pub async fn start(api: ApiBox, renderer: RendererBox) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let session_id = Some(Config::get(ConfigKey::SessionID)).filter(|e| return !e.is_empty());

    let mut state = AppState::new(
        api.clone(),
        tx,
        &Config::get(ConfigKey::Language),
        session_id,
        Duration::from_millis(Config::millis(ConfigKey::SuggestionDelay)),
    );

    if let Err(err) = api.health_check().await {
        tracing::error!(error = ?err, "health check failed");
        println!(
            "{}\n",
            Notice::error(&format!(
                "Hey, it looks like the CodeQuest API at {} isn't reachable. Searches will fail until it is.",
                Config::get(ConfigKey::ApiURL)
            ))
            .colored()
        );
    }

    if state.search.session_id.is_none() {
        print_outputs(&mut state, &renderer, &api, vec![Output::PickSession]).await?;
    }

    println!(
        "{}\n",
        Notice::info("Ask away! Type /help for commands, /quit to leave.").colored()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(&state);

        let outputs = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                state.handle_input(&line).await
            }
            Some(event) = rx.recv() => {
                println!();
                state.handle_event(event)
            }
        };

        if !print_outputs(&mut state, &renderer, &api, outputs).await? {
            break;
        }
    }

    return Ok(());
}
