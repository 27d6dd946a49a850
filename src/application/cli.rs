#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;
use std::path::Path;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use chrono::Utc;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use dialoguer::Password;
use owo_colors::OwoColorize;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::repl;
use super::view;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ApiBox;
use crate::domain::models::ImageFile;
use crate::domain::models::InterviewApi;
use crate::domain::models::NewSession;
use crate::domain::models::ObjectUrls;
use crate::domain::models::ValidationError;
use crate::domain::models::HELP_TEXT;
use crate::domain::services::AuthStore;
use crate::domain::services::RendererBox;
use crate::domain::services::RendererManager;
use crate::domain::services::RendererName;
use crate::domain::services::SearchPage;
use crate::infrastructure::api::ApiClient;

const REPORT_FORMATS: [&str; 5] = ["md", "pdf", "docx", "html", "json"];
const DEFAULT_REPORT_FORMAT: &str = "md";

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn api() -> Result<ApiBox> {
    let auth = AuthStore::default();
    auth.load().await?;

    return Ok(Arc::new(ApiClient::from_config(auth)?));
}

fn renderer() -> Result<RendererBox> {
    let name = RendererName::parse(&Config::get(ConfigKey::Renderer)).unwrap_or(RendererName::Rich);
    return RendererManager::get(name, &Config::get(ConfigKey::Theme));
}

fn session_id(matches: &ArgMatches) -> Result<String> {
    if let Some(id) = matches.get_one::<String>("id") {
        return Ok(id.to_string());
    }

    let id = Config::get(ConfigKey::SessionID);
    if id.is_empty() {
        return Err(ValidationError::NoSession.into());
    }

    return Ok(id);
}

fn report_format(matches: &ArgMatches) -> &str {
    return matches
        .get_one::<String>("format")
        .map(|e| return e.as_str())
        .unwrap_or(DEFAULT_REPORT_FORMAT);
}

/// Marks the given notifications as read, or all of them when no id is given.
async fn read_notifications(api: &dyn InterviewApi, ids: &[String]) -> Result<String> {
    if ids.is_empty() {
        api.mark_all_notifications_read().await?;
        return Ok("All notifications marked as read".to_string());
    }

    api.mark_notifications_read(ids).await?;
    if ids.len() == 1 {
        return Ok("1 notification marked as read".to_string());
    }
    return Ok(format!("{} notifications marked as read", ids.len()));
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn login(matches: &ArgMatches) -> Result<()> {
    let mut username = Config::get(ConfigKey::Username);
    if username.is_empty() {
        username = Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Username")
            .interact_text()?;
    }

    let password = match matches.get_one::<String>("password") {
        Some(password) => password.to_string(),
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Password")
            .interact()?,
    };

    api().await?.login(&username, &password).await?;
    println!("Logged in as {}", username.green());

    return Ok(());
}

async fn search(matches: &ArgMatches) -> Result<()> {
    let mut page = SearchPage::new(
        ObjectUrls::default(),
        &Config::get(ConfigKey::Language),
        Some(Config::get(ConfigKey::SessionID)),
    );
    page.query = matches
        .get_many::<String>("query")
        .map(|e| return e.cloned().collect::<Vec<String>>().join(" "))
        .unwrap_or_default();

    let mut files = vec![];
    if let Some(paths) = matches.get_many::<String>("image") {
        for path in paths {
            files.push(ImageFile::from_path(Path::new(path)).await?);
        }
    }
    if let Some(err) = page.images.add_files(files).into_iter().next() {
        return Err(err.into());
    }

    let renderer = renderer()?;
    let res = page.submit(&api().await?).await?;
    let title = if res.question_text.is_empty() {
        "Solution"
    } else {
        res.question_text.as_str()
    };
    println!("{}", view::response(renderer.as_ref(), title, res));

    return Ok(());
}

async fn sessions(matches: &ArgMatches) -> Result<()> {
    let api = api().await?;

    match matches.subcommand() {
        Some(("list", _)) => {
            let sessions = api
                .list_sessions()
                .await?
                .iter()
                .map(view::session)
                .collect::<Vec<String>>();

            if sessions.is_empty() {
                println!("There are no sessions available. You should create your first one!");
            } else {
                println!("{}", sessions.join("\n"));
            }
        }
        Some(("active", _)) => match api.active_session().await? {
            Some(session) => println!("{}", view::session(&session)),
            None => println!("No session is active."),
        },
        Some(("create", create_matches)) => {
            let session = api
                .create_session(NewSession {
                    candidate_name: create_matches
                        .get_one::<String>("candidate")
                        .cloned()
                        .unwrap_or_default(),
                    company_name: create_matches
                        .get_one::<String>("company")
                        .cloned()
                        .unwrap_or_default(),
                    session_date: create_matches
                        .get_one::<String>("date")
                        .cloned()
                        .unwrap_or_else(|| return Utc::now().format("%Y-%m-%d").to_string()),
                    notes: create_matches
                        .get_one::<String>("notes")
                        .cloned()
                        .unwrap_or_default(),
                })
                .await?;
            println!("Created session {}", session.id.green());
        }
        Some(("end", end_matches)) => {
            let id = session_id(end_matches)?;
            let format = report_format(end_matches);

            match api.end_session(&id, format).await? {
                Some(report) => println!("Ended session {id}. Report: {report}"),
                None => println!("Ended session {id}."),
            }
        }
        Some(("results", results_matches)) => {
            let id = session_id(results_matches)?;
            let results = api.session_results(&id).await?;
            println!("{}", view::session_results(&results));
        }
        _ => {
            subcommand_sessions().print_long_help()?;
        }
    }

    return Ok(());
}

async fn notes(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", list_matches)) => {
            let id = session_id(list_matches)?;
            let notes = api().await?.list_notes(&id).await?;
            println!("{}", view::notes(&notes));
        }
        Some(("add", add_matches)) => {
            let id = session_id(add_matches)?;
            let content = add_matches
                .get_many::<String>("content")
                .map(|e| return e.cloned().collect::<Vec<String>>().join(" "))
                .unwrap_or_default();
            api().await?.add_note(&id, &content).await?;
            println!("Note added to session {id}");
        }
        _ => {
            subcommand_notes().print_long_help()?;
        }
    }

    return Ok(());
}

async fn notifications(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => {
            let list = api().await?.notifications().await?;
            println!("{}", view::notifications(&list));
        }
        Some(("read", read_matches)) => {
            let ids = read_matches
                .get_many::<String>("ids")
                .map(|e| return e.cloned().collect::<Vec<String>>())
                .unwrap_or_default();
            let api = api().await?;
            println!("{}", read_notifications(api.as_ref(), &ids).await?);
        }
        _ => {
            subcommand_notifications().print_long_help()?;
        }
    }

    return Ok(());
}

fn arg_session_id() -> Arg {
    return Arg::new("id")
        .short('i')
        .long("id")
        .num_args(1)
        .help("Session ID. Defaults to --session-id.");
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for CodeQuest")
        .hide(true)
        .subcommand(
            Command::new("themes").about("List all supported code highlighting themes.")
        )
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running CodeQuest with environment variable RUST_LOG=codequest")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn subcommand_login() -> Command {
    return Command::new("login")
        .about("Log in to the CodeQuest API and store the token.")
        .arg(
            Arg::new("password")
                .long("password")
                .env("CODEQUEST_PASSWORD")
                .hide_env_values(true)
                .num_args(1)
                .help("Password. Prompted for when not set."),
        );
}

fn subcommand_search() -> Command {
    return Command::new("search")
        .about("Run a single search and print the answer.")
        .arg(
            Arg::new("query")
                .num_args(0..)
                .help("The programming question."),
        )
        .arg(
            Arg::new("image")
                .short('i')
                .long("image")
                .action(ArgAction::Append)
                .help("Image of the question to upload. Can be repeated."),
        );
}

fn subcommand_sessions() -> Command {
    return Command::new("sessions")
        .about("Manage interview sessions.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List all sessions with their ids."))
        .subcommand(Command::new("active").about("Show the active session."))
        .subcommand(
            Command::new("create")
                .about("Create a new interview session.")
                .arg(
                    Arg::new("candidate")
                        .long("candidate")
                        .num_args(1)
                        .required(true)
                        .help("Candidate name."),
                )
                .arg(
                    Arg::new("company")
                        .long("company")
                        .num_args(1)
                        .help("Company name."),
                )
                .arg(
                    Arg::new("date")
                        .long("date")
                        .num_args(1)
                        .help("Session date. Defaults to today."),
                )
                .arg(
                    Arg::new("notes")
                        .long("notes")
                        .num_args(1)
                        .help("Notes to start the session with."),
                ),
        )
        .subcommand(
            Command::new("end")
                .about("End a session and generate its report.")
                .arg(arg_session_id())
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .num_args(1)
                        .help(format!("Report format. [default: {DEFAULT_REPORT_FORMAT}]"))
                        .value_parser(PossibleValuesParser::new(REPORT_FORMATS)),
                ),
        )
        .subcommand(
            Command::new("results")
                .about("List the searches filed under a session.")
                .arg(arg_session_id()),
        );
}

fn subcommand_notifications() -> Command {
    return Command::new("notifications")
        .about("Read and dismiss notifications.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List notifications, unread ones marked with *."))
        .subcommand(
            Command::new("read")
                .about("Mark notifications as read. Marks all of them when no id is given.")
                .arg(
                    Arg::new("ids")
                        .num_args(0..)
                        .help("Notification ids."),
                ),
        );
}

fn subcommand_notes() -> Command {
    return Command::new("notes")
        .about("Read and write session notes.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List the notes of a session.")
                .arg(arg_session_id()),
        )
        .subcommand(
            Command::new("add")
                .about("Add a note to a session.")
                .arg(arg_session_id())
                .arg(
                    Arg::new("content")
                        .num_args(1..)
                        .required(true)
                        .help("Note text."),
                ),
        );
}

pub fn build() -> Command {
    let commands_text = HELP_TEXT
        .trim()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("codequest")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(format!("{}\n{commands_text}", "CHAT COMMANDS:".bold().underline()))
        .arg_required_else_help(false)
        .subcommand(Command::new("chat").about("Start an interactive search and follow-up chat."))
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(subcommand_login())
        .subcommand(Command::new("logout").about("Forget the stored token."))
        .subcommand(subcommand_notes())
        .subcommand(subcommand_notifications())
        .subcommand(subcommand_search())
        .subcommand(subcommand_sessions())
        .subcommand(Command::new("whoami").about("Show the logged in user."))
        .arg(
            Arg::new(ConfigKey::ApiURL.to_string())
                .long(ConfigKey::ApiURL.to_string())
                .env("CODEQUEST_API_URL")
                .num_args(1)
                .help(format!("CodeQuest API URL. [default: {}]", Config::default(ConfigKey::ApiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("CODEQUEST_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::Language.to_string())
                .short('l')
                .long(ConfigKey::Language.to_string())
                .env("CODEQUEST_LANGUAGE")
                .num_args(1)
                .help(format!("Language filter for searches, \"all\" for any. [default: {}]", Config::default(ConfigKey::Language)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SessionID.to_string())
                .short('s')
                .long(ConfigKey::SessionID.to_string())
                .env("CODEQUEST_SESSION_ID")
                .num_args(1)
                .help("Interview session searches are filed under. Picked interactively in chat when not set.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Renderer.to_string())
                .short('r')
                .long(ConfigKey::Renderer.to_string())
                .env("CODEQUEST_RENDERER")
                .num_args(1)
                .help(format!("How answers are printed. [default: {}]", Config::default(ConfigKey::Renderer)))
                .value_parser(PossibleValuesParser::new(RendererName::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Theme.to_string())
                .short('t')
                .long(ConfigKey::Theme.to_string())
                .env("CODEQUEST_THEME")
                .num_args(1)
                .help(format!("Sets code syntax highlighting theme. [default: {}]", Config::default(ConfigKey::Theme)))
                .value_parser(PossibleValuesParser::new(RendererManager::themes()))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RequestTimeout.to_string())
                .long(ConfigKey::RequestTimeout.to_string())
                .env("CODEQUEST_REQUEST_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds before an API request times out. [default: {}]", Config::default(ConfigKey::RequestTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SuggestionDelay.to_string())
                .long(ConfigKey::SuggestionDelay.to_string())
                .env("CODEQUEST_SUGGESTION_DELAY")
                .num_args(1)
                .help(format!("Quiet time in milliseconds before suggestions are fetched. [default: {}]", Config::default(ConfigKey::SuggestionDelay)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Username.to_string())
                .short('u')
                .long(ConfigKey::Username.to_string())
                .env("CODEQUEST_USERNAME")
                .num_args(1)
                .help("Username for `codequest login`. Prompted for when not set.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::TokenFile.to_string())
                .long(ConfigKey::TokenFile.to_string())
                .env("CODEQUEST_TOKEN_FILE")
                .num_args(1)
                .help(format!("Where the API token is stored. [default: {}]", Config::default(ConfigKey::TokenFile)))
                .global(true),
        );
}

/// Parses arguments and runs one-shot subcommands. Returns true when the
/// interactive chat should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("themes", _)) => {
                    println!("{}", RendererManager::themes().join("\n"));
                }
                Some(("log-path", _)) => {
                    let log_path = Config::log_dir().join("debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("login", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            login(subcmd_matches).await?;
            return Ok(false);
        }
        Some(("logout", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            api().await?.logout().await?;
            println!("Logged out");
            return Ok(false);
        }
        Some(("whoami", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let user = api().await?.me().await?;
            println!("{} ({})", user.username, user.role);
            return Ok(false);
        }
        Some(("search", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            search(subcmd_matches).await?;
            return Ok(false);
        }
        Some(("sessions", subcmd_matches)) => {
            let mut all = vec![&matches, subcmd_matches];
            if let Some((_, inner)) = subcmd_matches.subcommand() {
                all.push(inner);
            }
            Config::load(build(), all).await?;
            sessions(subcmd_matches).await?;
            return Ok(false);
        }
        Some(("notes", subcmd_matches)) => {
            let mut all = vec![&matches, subcmd_matches];
            if let Some((_, inner)) = subcmd_matches.subcommand() {
                all.push(inner);
            }
            Config::load(build(), all).await?;
            notes(subcmd_matches).await?;
            return Ok(false);
        }
        Some(("notifications", subcmd_matches)) => {
            let mut all = vec![&matches, subcmd_matches];
            if let Some((_, inner)) = subcmd_matches.subcommand() {
                all.push(inner);
            }
            Config::load(build(), all).await?;
            notifications(subcmd_matches).await?;
            return Ok(false);
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}

/// Starts the interactive chat with the loaded configuration.
pub async fn chat() -> Result<()> {
    let auth = AuthStore::default();
    if auth.load().await?.is_none() {
        println!(
            "{}",
            "You are not logged in. Run `codequest login` first.".yellow()
        );
    }

    let api: ApiBox = Arc::new(ApiClient::from_config(auth)?);
    return repl::start(api, renderer()?).await;
}
