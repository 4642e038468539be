//! CLI binary for chronoken.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use chronoken::action::PlanParams;
use chronoken::config::ChronoConfig;
use chronoken::dispatcher::{format_plan, format_task_line, resolve_plan_inputs};
use chronoken::planner::{local_today, plan_from_store};
use chronoken::tasks::{JsonTaskStore, TaskStatus, TaskStore};
use chronoken::{ConversationTurn, PlannerAgent};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Chronoken: chat with a study planner that manages your tasks.
#[derive(Parser)]
#[command(name = "chronoken", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the JSON task file (overrides the config).
    #[arg(short, long)]
    tasks: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Start an interactive conversation (default).
    Chat {
        /// Print replies in chunks as they become available.
        #[arg(long)]
        stream: bool,
    },

    /// Print stored tasks without contacting the model.
    Tasks {
        /// Only show tasks with this status (pending, in_progress, done).
        #[arg(long)]
        status: Option<String>,
    },

    /// Print a study plan without contacting the model.
    Plan {
        /// Hours available per day.
        #[arg(long)]
        daily_hours: Option<f64>,

        /// Number of days to plan, starting today.
        #[arg(long)]
        days: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chronoken=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Command::Chat { stream: false }) {
        Command::Chat { stream } => run_chat(&config, stream).await,
        Command::Tasks { status } => list_tasks(&config, status.as_deref()),
        Command::Plan { daily_hours, days } => print_plan(&config, daily_hours, days),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ChronoConfig> {
    let mut config = match &cli.config {
        Some(path) => ChronoConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => {
            let path = ChronoConfig::default_config_path();
            if path.exists() {
                ChronoConfig::from_file(&path)?
            } else {
                ChronoConfig::default()
            }
        }
    };
    config.apply_env_overrides();
    if let Some(tasks) = &cli.tasks {
        config.store.tasks_path = tasks.clone();
    }
    Ok(config)
}

async fn run_chat(config: &ChronoConfig, stream: bool) -> anyhow::Result<()> {
    let agent = Arc::new(PlannerAgent::from_config(config));
    let chunk_chars = config.planner.stream_chunk_chars;

    println!("Chronoken v{}", env!("CARGO_PKG_VERSION"));
    println!("Tasks are stored in {}", config.store.tasks_path.display());
    if !agent.model_available() {
        println!("No language model configured; explicit commands still work (try \"list tasks\").");
    }
    println!("Type \"exit\" or \"quit\" to leave.\n");

    let mut history: Vec<ConversationTurn> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim().to_owned();
        if message.is_empty() {
            continue;
        }
        if matches!(message.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let reply = if stream {
            let agent = Arc::clone(&agent);
            let (msg, hist) = (message.clone(), history.clone());
            tokio::task::spawn_blocking(move || {
                print!("Assistant: ");
                let mut reply = String::new();
                for chunk in agent.stream_reply(&msg, &hist, chunk_chars) {
                    print!("{chunk}");
                    std::io::stdout().flush().ok();
                    reply.push_str(&chunk);
                }
                println!("\n");
                reply
            })
            .await?
        } else {
            let reply = Arc::clone(&agent).handle_async(message.clone(), history.clone()).await;
            println!("Assistant: {reply}\n");
            reply
        };

        history.push(ConversationTurn::new(message, reply));
    }

    info!("chat session ended after {} turns", history.len());
    println!("Goodbye!");
    Ok(())
}

fn list_tasks(config: &ChronoConfig, status: Option<&str>) -> anyhow::Result<()> {
    let filter = match status {
        Some(raw) => Some(TaskStatus::parse(raw).with_context(|| format!("unknown status {raw:?}"))?),
        None => None,
    };

    let store = JsonTaskStore::new(&config.store.tasks_path);
    let tasks = store.list(filter)?;
    if tasks.is_empty() {
        println!("No tasks.");
    }
    for task in &tasks {
        print!("{}", format_task_line(task));
    }
    Ok(())
}

fn print_plan(config: &ChronoConfig, daily_hours: Option<f64>, days: Option<u32>) -> anyhow::Result<()> {
    let params = PlanParams {
        daily_hours,
        num_days: days,
    };
    let (daily_hours, num_days) = resolve_plan_inputs(&config.planner, &params);

    let store = JsonTaskStore::new(&config.store.tasks_path);
    let plan = plan_from_store(&store, daily_hours, num_days, local_today())?;
    println!("{}", format_plan(&plan).trim_start());
    Ok(())
}
