#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use domain::models::ApiError;
use domain::models::ValidationError;
use domain::services::clipboard::ClipboardService;
use owo_colors::OwoColorize;
use tokio::task;

use crate::application::cli;
use crate::configuration::Config;

fn handle_error(err: Error) {
    if err.is::<ValidationError>() || err.is::<ApiError>() {
        eprintln!("{}", err.to_string().red());
        process::exit(1);
    }

    eprintln!(
        "{}",
        format!(
            "Oh no! CodeQuest has failed with the following app version and error.\n\nVersion: {}\nCommit: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            env!("VERGEN_GIT_DESCRIBE"),
            err
        )
        .red()
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
        eprintln!(
            "\nA debug log is written to {} when RUST_LOG=codequest is set.",
            Config::log_dir().join("debug.log").to_string_lossy()
        );
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let file_appender = tracing_appender::rolling::never(Config::log_dir(), "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("codequest")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    match cli::parse().await {
        Ok(true) => {}
        Ok(false) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    }

    let mut background_futures = task::JoinSet::new();
    if let Err(clipboard_err) = ClipboardService::healthcheck() {
        tracing::warn!(err = ?clipboard_err, "Clipboard service is unable to start")
    } else {
        background_futures.spawn(async move {
            return ClipboardService::start().await;
        });
    }

    let chat_future = cli::chat();
    tokio::pin!(chat_future);

    let res = tokio::select!(
        Some(res) = background_futures.join_next() => {
            match res {
                Ok(Err(err)) => tracing::warn!(err = ?err, "Clipboard service stopped"),
                Err(err) => tracing::warn!(err = ?err, "Clipboard service panicked"),
                Ok(Ok(_)) => {}
            }
            chat_future.await
        },
        res = &mut chat_future => res,
    );

    if let Err(err) = res {
        handle_error(err);
    }

    process::exit(0);
}
