use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use job_assistant::agents::{ContentAgent, MockPage, Orchestrator, SidePanel};
use job_assistant::gateway::BackendGateway;
use job_assistant::messaging::{is_restricted_url, MessageHub, TabRegistry};
use job_assistant::models::ProfileField;
use job_assistant::store::select_store;
use job_assistant::{Config, PanelController};

#[derive(Parser, Debug)]
#[command(name = "job-assistant", version, about = "Job application assistant")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// View or edit the stored profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Manage the list of uploaded documents
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },
    /// Autofill the focused field of a page
    Autofill {
        #[arg(long, default_value = "https://jobs.example.com/apply")]
        url: String,
    },
    /// Draft a cover letter for a job description
    CoverLetter {
        /// File holding the job description text
        #[arg(long)]
        job: PathBuf,

        /// JSON file with relevance scores
        #[arg(long)]
        scores: Option<PathBuf>,
    },
    /// Click the toolbar icon on a page
    OpenPanel {
        #[arg(long)]
        url: String,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    Show,
    /// e.g. `profile set firstName Alice`
    Set { field: String, value: String },
}

#[derive(Subcommand, Debug)]
enum DocsAction {
    Add {
        #[arg(required = true)]
        names: Vec<String>,
    },
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("job_assistant={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting job assistant v{}", env!("CARGO_PKG_VERSION"));

    let gateway = BackendGateway::from_config(&config)?;
    info!("Backend gateway ready ({})", gateway.base_url());
    let orchestrator = Arc::new(Orchestrator::new(Arc::new(gateway)));
    let runtime = MessageHub::new()
        .with_shared_listener(orchestrator.clone())
        .spawn();

    let tabs = TabRegistry::new();
    let url = match &cli.command {
        Command::Autofill { url } | Command::OpenPanel { url } => url.clone(),
        _ => "https://jobs.example.com/apply".to_string(),
    };
    let content = (!is_restricted_url(&url)).then(|| {
        MessageHub::new()
            .with_listener(ContentAgent::new(Arc::new(MockPage::new())))
            .spawn()
    });
    let tab = tabs.open(url, content).await;

    let store = select_store(config.profile_store_path.as_deref()).await;
    let mut panel = PanelController::start(store, runtime, tabs).await;
    if let Some(path) = &config.resume_path {
        panel = panel.with_base_resume(read_json(path).await?);
    }

    match cli.command {
        Command::Profile { action } => match action {
            ProfileAction::Show => print_json(&panel.profile().await)?,
            ProfileAction::Set { field, value } => {
                let field: ProfileField = field.parse()?;
                let profile = panel.update_field(field, value).await;
                println!("{}: {}", field.label(), profile.personal_info.get(field));
            }
        },
        Command::Docs { action } => match action {
            DocsAction::Add { names } => {
                let added = panel.add_documents(names).await;
                println!("Added {added} document(s)");
                print_json(&panel.profile().await.documents)?;
            }
            DocsAction::Remove { name } => {
                if !panel.remove_document(&name).await {
                    bail!("No document named {name}");
                }
                print_json(&panel.profile().await.documents)?;
            }
        },
        Command::Autofill { .. } => {
            let message = panel.autofill().await?;
            println!("{message}");
        }
        Command::CoverLetter { job, scores } => {
            let job_description = tokio::fs::read_to_string(&job)
                .await
                .with_context(|| format!("Failed to read job description {}", job.display()))?;
            let scores = match scores {
                Some(path) => read_json(&path).await?,
                None => Value::Object(Default::default()),
            };
            let letter = panel.generate_cover_letter(&job_description, scores).await?;
            println!("{letter}");
        }
        Command::OpenPanel { .. } => match orchestrator.on_action_clicked(&tab) {
            SidePanel::Opened => println!("Side panel opened on {}", tab.url),
            SidePanel::Refused => bail!("Side panel cannot be opened on {}", tab.url),
        },
    }

    Ok(())
}

async fn read_json(path: &Path) -> Result<Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
