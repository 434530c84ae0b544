//! `daylist` command-line front end.
//!
//! # Responsibility
//! - Drive the core task store from a terminal against the configured SQLite
//!   file.
//! - Host the daily reset timer and reminder delivery in `watch` mode.
//!
//! # Invariants
//! - Every command loads the persisted collection before acting on it.
//! - Store errors are printed to stderr and turn into a non-zero exit code.

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use daylist_core::{
    delay_until, init_logging_from_config, ChannelNotifier, CoreConfig, DailyResetTimer,
    LogNotifier, Notifier, NotificationPayload, ReminderTime, SqliteKeyValueStore, SystemClock,
    Task, TaskId, TaskRepository, TaskStore,
};
use log::warn;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

type CliResult<T = ()> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(author, version, about = "daylist: a to-do list that starts fresh every day", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show today's tasks in display order.
    List,
    /// Add a task to the top of the list.
    Add {
        /// Task text; surrounding whitespace is trimmed.
        text: Vec<String>,
    },
    /// Replace a task's text.
    Edit { id: String, text: Vec<String> },
    /// Toggle a task between open and completed.
    Done { id: String },
    /// Delete a task.
    Rm { id: String },
    /// Set a one-shot reminder for a task.
    ///
    /// The reminder is stored with the task. It is delivered by `daylist watch`,
    /// which picks up stored reminders when it starts; restart a running
    /// `watch` to include reminders set after it started.
    #[command(after_help = "Delivery needs `daylist watch`; a watch started before this command will not see the reminder.\n\nEXAMPLES:\n    daylist remind <id> 17:30\n    daylist remind <id> 2026-10-16T17:30:00+02:00")]
    Remind {
        id: String,
        /// Local `HH:MM` today, or an RFC 3339 timestamp.
        at: String,
    },
    /// Delete every task.
    Clear,
    /// Run the midnight reset and print reminders as they fire, until Ctrl-C.
    Watch,
    /// Print `pong` to verify core linkage.
    Ping,
    /// Print the core library version.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = CoreConfig::from_env();

    match cli.command {
        Commands::Ping => {
            println!("{}", daylist_core::ping());
            return ExitCode::SUCCESS;
        }
        Commands::Version => {
            println!("daylist_core {}", daylist_core::core_version());
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("warning: logging disabled: {err}");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli.command, &config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &CoreConfig) -> CliResult {
    if let Commands::Watch = command {
        return watch(config).await;
    }

    let mut store = open_store(config, LogNotifier).await?;
    match command {
        Commands::List => {}
        Commands::Add { text } => {
            store.add(&text.join(" ")).await?;
        }
        Commands::Edit { id, text } => {
            let id = resolve_id(store.tasks(), &id)?;
            store.edit(&id, &text.join(" ")).await?;
        }
        Commands::Done { id } => {
            let id = resolve_id(store.tasks(), &id)?;
            store.toggle_complete(&id).await?;
        }
        Commands::Rm { id } => {
            let id = resolve_id(store.tasks(), &id)?;
            store.delete(&id).await?;
        }
        Commands::Remind { id, at } => {
            let id = resolve_id(store.tasks(), &id)?;
            let at = parse_reminder_time(&at, Local::now())?;
            store.schedule_reminder(&id, at).await?;
            println!("reminder saved; `daylist watch` delivers it (restart a running watch to pick it up)");
        }
        Commands::Clear => {
            store.clear_all().await?;
        }
        Commands::Watch | Commands::Ping | Commands::Version => {}
    }

    print_tasks(store.tasks(), Local::now());
    Ok(())
}

async fn open_store<N: Notifier>(
    config: &CoreConfig,
    notifier: N,
) -> CliResult<TaskStore<SqliteKeyValueStore, N>> {
    let kv = SqliteKeyValueStore::open(&config.db_path)?;
    let repo = TaskRepository::with_key(kv, config.storage_key.clone());
    let mut store = TaskStore::new(repo, notifier);
    store.load().await?;
    Ok(store)
}

async fn watch(config: &CoreConfig) -> CliResult {
    let (notifier, mut delivered) = ChannelNotifier::channel();
    let store = open_store(config, notifier.clone()).await?;

    // Reminders set by earlier invocations only live in storage; re-arm them here.
    let now = Utc::now();
    for task in store.tasks() {
        if let Some(at) = task.reminder_time() {
            if let Ok(delay) = delay_until(at, now) {
                notifier
                    .schedule_one_shot(delay, &NotificationPayload::reminder(&task.text))
                    .await?;
            }
        }
    }
    print_tasks(store.tasks(), Local::now());

    let store = store.into_shared();
    let timer = DailyResetTimer::local(Arc::new(SystemClock)).spawn(store);
    println!("watching; press Ctrl-C to stop");

    loop {
        tokio::select! {
            payload = delivered.recv() => match payload {
                Some(payload) => println!("{}: {}", payload.title, payload.body),
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!("event=watch_signal module=cli status=error error={err}");
                }
                break;
            }
        }
    }

    timer.abort();
    Ok(())
}

/// Accepts a full id or a unique prefix of one.
fn resolve_id(tasks: &[Task], raw: &str) -> CliResult<TaskId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("task id must not be empty".into());
    }

    let matches: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.id.as_str().starts_with(raw))
        .collect();
    match matches.as_slice() {
        [task] => Ok(task.id.clone()),
        [] => Err(format!("no task with id `{raw}`").into()),
        _ if matches.iter().any(|task| task.id.as_str() == raw) => Ok(TaskId::from(raw)),
        _ => Err(format!("id prefix `{raw}` matches {} tasks", matches.len()).into()),
    }
}

fn parse_reminder_time(raw: &str, now: DateTime<Local>) -> CliResult<ReminderTime> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }

    let time = NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| format!("expected HH:MM or an RFC 3339 timestamp, got `{raw}`"))?;
    Local
        .from_local_datetime(&now.date_naive().and_time(time))
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| format!("{raw} does not exist today in the local time zone").into())
}

fn print_tasks(tasks: &[Task], now: DateTime<Local>) {
    println!("To-Do {}", now.format("%m/%d"));
    if tasks.is_empty() {
        println!("  (nothing yet)");
        return;
    }

    let now_utc = now.with_timezone(&Utc);
    for task in tasks {
        println!("  {}", render_line(task, now_utc));
    }
}

fn render_line(task: &Task, now: DateTime<Utc>) -> String {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let mut line = format!("{check} {}  ({})", task.text, task.id);
    if let Some(at) = task.reminder_time() {
        line.push_str(&format!("  @ {}", at.with_timezone(&Local).format("%H:%M")));
        if daylist_core::is_past_due(Some(at), now) {
            line.push_str(" (past due)");
        }
    }
    line
}
