use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use driftwood::client::{InitialSnapshot, TodoClient, TodoController, ViewState};
use driftwood::config::ClientConfig;
use driftwood::model::TodoItem;
use driftwood::sync::SyncConfig;
use driftwood::telemetry::logging::{self as logctl, LogConfig, LogLevel};
use driftwood::transport::{HttpApi, UuidSource, WebSocketSubscriber};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "driftwood",
    about = "Optimistically synced todo list client",
    version
)]
struct Cli {
    #[arg(
        long,
        env = "DRIFTWOOD_SERVER",
        default_value = "http://127.0.0.1:8080",
        help = "Base URL for the list server"
    )]
    server: String,

    #[command(flatten)]
    logging: LoggingArgs,
}

#[derive(Args, Debug, Clone)]
struct LoggingArgs {
    #[arg(
        long = "log-level",
        value_enum,
        env = "DRIFTWOOD_LOG_LEVEL",
        default_value_t = LogLevel::Warn,
        help = "Minimum log level (error, warn, info, debug, trace)"
    )]
    level: LogLevel,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        env = "DRIFTWOOD_LOG_FILE",
        help = "Write structured logs to the specified file"
    )]
    file: Option<PathBuf>,
}

impl LoggingArgs {
    fn to_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            file: self.file.clone(),
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logctl::init(&cli.logging.to_config()).context("logging setup failed")?;

    let config = ClientConfig::new(&cli.server)?;
    let api = Arc::new(HttpApi::new(config.todos_endpoint()?)?);
    let (items, fetch_latency) = api
        .fetch_snapshot()
        .await
        .with_context(|| format!("initial snapshot fetch from {} failed", config.base_url()))?;
    debug!(items = items.len(), latency_ms = fetch_latency.as_millis() as u64, "initial snapshot loaded");
    println!(
        "loaded {} item(s) in {}ms",
        items.len(),
        fetch_latency.as_millis()
    );

    let subscriber = WebSocketSubscriber::new(config.watch_endpoint()?);
    let client = TodoClient::spawn(
        SyncConfig::default(),
        InitialSnapshot {
            items,
            fetch_latency,
        },
        api,
        subscriber,
        Arc::new(UuidSource),
    );

    let mut updates = client.updates();
    print_help();
    render(&updates.borrow());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                render(&updates.borrow());
            }
            line = lines.next_line() => {
                match line.context("reading stdin failed")? {
                    None => break,
                    Some(line) => {
                        let state = updates.borrow().clone();
                        if !handle_command(&client, client.controller(), &state, line.trim()) {
                            break;
                        }
                    }
                }
            }
        }
    }

    client.shutdown();
    client.join().await;
    Ok(())
}

fn print_help() {
    println!("commands: add <text> | done <n> | undo <n> | edit <n> <text> | rm <n> | hide | show | quit");
}

fn render(state: &ViewState) {
    let status = if state.busy { "syncing" } else { "in sync" };
    println!("-- {} item(s) [{status}] --", state.items.len());
    for (index, item) in state.items.iter().enumerate() {
        let mark = if item.completed { "x" } else { " " };
        let lock = if state.locked.contains(&item.id) {
            " *"
        } else {
            ""
        };
        println!("{:>3}. [{mark}] {}{lock}", index + 1, item.text);
    }
}

/// Returns false when the session should end.
fn handle_command(
    client: &TodoClient,
    controller: &TodoController,
    state: &ViewState,
    line: &str,
) -> bool {
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    match command {
        "" => {}
        "quit" | "exit" => return false,
        "help" => print_help(),
        "hide" => client.set_visible(false),
        "show" => client.set_visible(true),
        "add" => {
            if rest.is_empty() {
                println!("usage: add <text>");
            } else {
                controller.add_item(rest);
            }
        }
        "done" | "undo" => {
            if let Some(item) = lookup(state, rest) {
                controller.save_item(item.id.clone(), Some(item.text.clone()), command == "done");
            }
        }
        "rm" => {
            if let Some(item) = lookup(state, rest) {
                controller.save_item(item.id.clone(), None, item.completed);
            }
        }
        "edit" => {
            let (index, text) = match rest.split_once(' ') {
                Some((index, text)) => (index, text.trim()),
                None => (rest, ""),
            };
            if text.is_empty() {
                println!("usage: edit <n> <text>");
            } else if let Some(item) = lookup(state, index) {
                controller.save_item(item.id.clone(), Some(text.to_string()), item.completed);
            }
        }
        other => println!("unknown command: {other}"),
    }
    true
}

fn lookup<'a>(state: &'a ViewState, index: &str) -> Option<&'a TodoItem> {
    let position = match index.parse::<usize>() {
        Ok(position) if position >= 1 => position,
        _ => {
            println!("expected an item number between 1 and {}", state.items.len());
            return None;
        }
    };
    let item = state.items.get(position - 1);
    if item.is_none() {
        println!("no item {position}; the list has {}", state.items.len());
    }
    item
}
