//! Taskpilot CLI - chat with your todo list from the terminal
//!
//! Every message is one independent agent run against the configured
//! task store. The same binary also starts the REST server.

mod display;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use taskpilot_core::config::{Config, ConfigManager};
use taskpilot_core::orchestration::{create_agent, create_task_service, create_task_tool_registry};
use taskpilot_core::{AgentLoop, NewTask, TaskPatch, TaskService, TaskStatus};
use taskpilot_server::ServerState;

#[derive(Parser)]
#[command(name = "taskpilot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tool-calling todo assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Completion provider (openrouter, openai, anthropic, gemini, scripted, ...)
    #[arg(short, long)]
    provider: Option<String>,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the answer
    Ask {
        /// Message text
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Interactive chat mode
    Chat,

    /// Run the REST server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show available tools
    Tools,

    /// Show configuration
    Config,

    /// Manage tasks directly, without the assistant
    #[command(subcommand)]
    Tasks(TaskCommands),

    /// Delete every task and restart ids at 1
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List tasks
    List {
        /// Only tasks with this status (pending, completed)
        #[arg(long)]
        status: Option<TaskStatus>,
    },

    /// Add a task
    Add {
        title: String,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Mark a task completed
    Done { id: i64 },

    /// Delete a task
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Keep the terminal quiet by default; the server logs requests at info.
    let default_filter = match cli.command {
        Some(Commands::Serve { .. }) => "info",
        _ => "warn",
    };
    let filter = if cli.verbose {
        EnvFilter::new("info,taskpilot_core=debug,taskpilot_server=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
    .context("Failed to load configuration")?;

    let mut config = manager.effective()?;
    if let Some(provider) = &cli.provider {
        config.provider.provider_type = provider.clone();
    }
    if let Some(model) = &cli.model {
        config.provider.model = model.clone();
    }
    tracing::debug!(
        path = %manager.path().display(),
        provider = %config.provider.provider_type,
        model = %config.provider.model,
        "Loaded configuration"
    );

    match cli.command {
        Some(Commands::Ask { message }) => {
            let service = create_task_service(&config).await?;
            let agent = create_agent(&config, service.clone())?;
            let result = ask(&agent, &message.join(" ")).await;
            service.flush().await;
            result
        }
        Some(Commands::Chat) | None => {
            let service = create_task_service(&config).await?;
            let agent = create_agent(&config, service.clone())?;
            let result = run_chat(&agent).await;
            service.flush().await;
            result
        }
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let service = create_task_service(&config).await?;
            let agent = create_agent(&config, service.clone())?;
            let state = Arc::new(
                ServerState::new(service.clone(), Arc::new(agent)).with_events(config.events.clone()),
            );
            let result = taskpilot_server::serve(state, &config.server)
                .await
                .context("Server failed");
            service.flush().await;
            result
        }
        Some(Commands::Tools) => {
            let registry = create_task_tool_registry(TaskService::in_memory());
            display::print_tools(&registry.list_descriptors());
            Ok(())
        }
        Some(Commands::Config) => show_config(&manager, &config),
        Some(Commands::Tasks(cmd)) => {
            warn_if_ephemeral(&config);
            let service = create_task_service(&config).await?;
            let result = run_task_command(&service, cmd).await;
            service.flush().await;
            result
        }
        Some(Commands::Reset { yes }) => {
            let service = create_task_service(&config).await?;
            let result = reset(&service, yes).await;
            service.flush().await;
            result
        }
    }
}

/// Run the agent with a spinner while it works
async fn run_with_spinner(agent: &AgentLoop, message: &str) -> taskpilot_core::Result<String> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = agent.run(message).await;
    spinner.finish_and_clear();
    result.map(|outcome| outcome.response)
}

async fn ask(agent: &AgentLoop, message: &str) -> anyhow::Result<()> {
    let answer = run_with_spinner(agent, message).await?;
    display::print_answer(&answer);
    Ok(())
}

async fn run_chat(agent: &AgentLoop) -> anyhow::Result<()> {
    println!(
        "{} {}",
        style("Taskpilot").bold().cyan(),
        style(format!("({} / {})", agent.provider().name(), agent.provider().model())).dim()
    );
    println!("{}", style("Type a message, or 'exit' to quit.").dim());
    println!();

    let mut editor = DefaultEditor::new().context("Failed to initialize line editor")?;
    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit") {
            break;
        }
        let _ = editor.add_history_entry(input);

        // A failed run is reported and the session continues.
        match run_with_spinner(agent, input).await {
            Ok(answer) => display::print_answer(&answer),
            Err(e) => display::print_error(&e),
        }
        println!();
    }

    Ok(())
}

async fn run_task_command(service: &TaskService, cmd: TaskCommands) -> anyhow::Result<()> {
    match cmd {
        TaskCommands::List { status } => {
            let tasks = service.list(status).await?;
            display::print_tasks(&tasks);
        }
        TaskCommands::Add { title, description } => {
            if title.trim().is_empty() {
                anyhow::bail!("Title must not be empty");
            }
            let mut new = NewTask::new(title);
            new.description = description;
            let task = service.create(new).await?;
            println!("{}", style("Added:").green());
            display::print_task(&task);
        }
        TaskCommands::Done { id } => {
            let task = service
                .update(id, TaskPatch::status(TaskStatus::Completed))
                .await?
                .with_context(|| format!("Task not found: {}", id))?;
            println!("{}", style("Completed:").green());
            display::print_task(&task);
        }
        TaskCommands::Delete { id } => {
            if !service.delete(id).await? {
                anyhow::bail!("Task not found: {}", id);
            }
            println!("{}", style(format!("Deleted task #{}", id)).green());
        }
    }
    Ok(())
}

async fn reset(service: &TaskService, yes: bool) -> anyhow::Result<()> {
    let confirmed = yes
        || dialoguer::Confirm::new()
            .with_prompt("Delete every task?")
            .default(false)
            .interact()?;
    if !confirmed {
        println!("{}", style("Cancelled").dim());
        return Ok(());
    }

    let removed = service.clear().await?;
    println!("{}", style(format!("Removed {} task(s)", removed)).green());
    Ok(())
}

fn warn_if_ephemeral(config: &Config) {
    if config.storage.database_url.is_none() {
        eprintln!(
            "{}",
            style("Tasks are kept in memory for this process only; set DATABASE_URL to persist them.")
                .yellow()
        );
    }
}

fn show_config(manager: &ConfigManager, config: &Config) -> anyhow::Result<()> {
    println!("{}", style("Configuration:").bold());
    println!();
    println!("  Config file: {}", style(manager.path().display()).green());
    println!(
        "  API key: {}",
        if config.provider.get_api_key().is_some() {
            style("configured").green()
        } else {
            style("missing").red()
        }
    );
    println!();

    let rendered = config.redacted().to_toml()?;
    println!("{}", rendered);
    Ok(())
}
