use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use korvo::agent::{Agent, AgentConfig, DEFAULT_MAX_TURNS};
use korvo::cli::Console;
use korvo::context::{ProjectContext, CONTEXT_FILE};
use korvo::core::SessionOutcome;
use korvo::llm::{DeepSeekProvider, ModelProvider};
use korvo::permissions::OperatingMode;
use korvo::session::ConversationStore;
use korvo::tools::default_registry;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const CONTEXT_TEMPLATE: &str = "\
# Project instructions

Notes for the assistant working in this project. Describe build commands,
conventions, and anything it should know before making changes.
";

#[derive(Parser)]
#[command(name = "korvo", version, about = "An autonomous coding assistant for the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task, or start an interactive session if no task is given
    Run {
        /// Task description; omit to enter interactive mode
        task: Option<String>,

        /// Model to use (overrides DEEPSEEK_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Auto-approve file edits and commands
        #[arg(long)]
        trust: bool,

        /// Auto-approve everything that is not flagged dangerous
        #[arg(long, alias = "dangerously-skip-permissions")]
        yolo: bool,

        /// Maximum model turns per task
        #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
        max_turns: usize,

        /// Skip project context discovery
        #[arg(long)]
        no_context: bool,

        /// Continue a stored session by id (see `korvo history`)
        #[arg(long)]
        resume: Option<String>,
    },

    /// Create a KORVO.md instructions file in the current directory
    Init,

    /// List recent sessions
    History {
        /// Number of sessions to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Delete a stored session by id instead of listing
        #[arg(long, value_name = "ID")]
        delete: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _log_guard = match korvo::logging::init_logging() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: logging disabled: {}", e);
            None
        }
    };

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run {
        task: None,
        model: None,
        trust: false,
        yolo: false,
        max_turns: DEFAULT_MAX_TURNS,
        no_context: false,
        resume: None,
    });

    let result = match command {
        Commands::Run {
            task,
            model,
            trust,
            yolo,
            max_turns,
            no_context,
            resume,
        } => {
            let mode = if yolo {
                OperatingMode::Yolo
            } else if trust {
                OperatingMode::Trust
            } else {
                OperatingMode::Default
            };
            run(task, model, mode, max_turns, no_context, resume).await
        }
        Commands::Init => init().map(|_| ExitCode::SUCCESS),
        Commands::History { limit, delete } => history(limit, delete).map(|_| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("fatal: {:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(
    task: Option<String>,
    model: Option<String>,
    mode: OperatingMode,
    max_turns: usize,
    no_context: bool,
    resume: Option<String>,
) -> Result<ExitCode> {
    let console = Console::new();

    let mut provider = DeepSeekProvider::from_env()?;
    if let Some(model) = model {
        provider = provider.with_model(model);
    }

    let working_dir = std::env::current_dir().context("cannot determine working directory")?;
    let context = if no_context {
        ProjectContext::empty(&working_dir)
    } else {
        ProjectContext::discover(&working_dir)
    };
    let system_prompt = context.build_system_prompt();

    let registry = default_registry(&context.working_dir)
        .context("failed to set up tools")?;

    let config = AgentConfig::new().with_mode(mode).with_max_turns(max_turns);
    let model_name = provider.model().to_string();
    let mut agent = Agent::new(
        Arc::new(provider),
        registry,
        Arc::new(console.clone()),
        config,
        Some(system_prompt),
    )
    .with_observer(Arc::new(console.clone()));

    let store = ConversationStore::new()?;

    if let Some(resume_id) = resume {
        let messages = store
            .load_messages(&resume_id)
            .with_context(|| format!("cannot resume session {}", resume_id))?;
        console.print_system(&format!(
            "resumed session {} ({} messages)",
            &resume_id[..8.min(resume_id.len())],
            messages.len()
        ));
        agent.session_mut().load_history(resume_id, messages);
    }

    match task {
        Some(task) => {
            let outcome = run_one_task(&mut agent, task).await?;
            save_session(&store, &agent);
            report_outcome(&console, &outcome.outcome);
            Ok(ExitCode::from(outcome.outcome.exit_code() as u8))
        }
        None => run_interactive(agent, console, store, &model_name, mode).await,
    }
}

/// Run a task with Ctrl-C wired to interrupt it
///
/// The listener is registered per task: the agent re-arms its cancellation
/// token after an abort, so a stale listener would cancel the wrong token.
async fn run_one_task(agent: &mut Agent, task: String) -> Result<korvo::core::TaskOutcome> {
    let cancel = agent.cancellation_token();
    let listener = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let result = agent.run_task(task).await;
    listener.abort();
    Ok(result?)
}

async fn run_interactive(
    mut agent: Agent,
    console: Console,
    store: ConversationStore,
    model_name: &str,
    mode: OperatingMode,
) -> Result<ExitCode> {
    console.print_banner(model_name, mode, VERSION);

    loop {
        let line = match console.read_input(">")? {
            Some(line) => line,
            None => break,
        };

        match line.as_str() {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "clear" => {
                agent.session_mut().clear();
                console.print_system("conversation cleared");
                continue;
            }
            "help" => {
                console.print_help();
                continue;
            }
            "/status" => {
                console.print_status(
                    model_name,
                    mode,
                    agent.session().turn(),
                    agent.session().max_turns(),
                );
                continue;
            }
            _ => {}
        }

        match run_one_task(&mut agent, line).await {
            Ok(outcome) => {
                save_session(&store, &agent);
                if outcome.outcome != SessionOutcome::Done {
                    report_outcome(&console, &outcome.outcome);
                }
            }
            Err(e) => {
                console.print_error(&format!("{:#}", e));
            }
        }
    }

    console.print_goodbye();
    Ok(ExitCode::SUCCESS)
}

fn save_session(store: &ConversationStore, agent: &Agent) {
    if !agent.config().auto_save_history {
        return;
    }
    let session = agent.session();
    if let Err(e) = store.save(session.id(), session.messages()) {
        tracing::warn!("failed to save session: {:#}", e);
    }
}

fn report_outcome(console: &Console, outcome: &SessionOutcome) {
    match outcome {
        SessionOutcome::Done => {}
        other => console.print_system(&other.to_string()),
    }
}

fn init() -> Result<()> {
    let path = std::env::current_dir()?.join(CONTEXT_FILE);
    if path.exists() {
        anyhow::bail!("{} already exists", CONTEXT_FILE);
    }
    std::fs::write(&path, CONTEXT_TEMPLATE)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("created {}", CONTEXT_FILE);
    Ok(())
}

fn history(limit: usize, delete: Option<String>) -> Result<()> {
    let store = ConversationStore::new()?;

    if let Some(id) = delete {
        if !store.session_exists(&id) {
            anyhow::bail!("no session with id {}", id);
        }
        store.delete(&id)?;
        println!("deleted session {}", id);
        return Ok(());
    }

    let sessions = store.list_sessions()?;
    if sessions.is_empty() {
        println!("no sessions yet");
        return Ok(());
    }

    for session in sessions.iter().take(limit) {
        println!(
            "{}  {}  {:>3} messages  {}",
            session.updated_at.format("%Y-%m-%d %H:%M"),
            &session.id[..8.min(session.id.len())],
            session.message_count,
            session.first_task,
        );
    }
    Ok(())
}
