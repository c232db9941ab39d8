//! Leadline CLI entry point.
//!
//! Provides `start`, `models`, and `leads` subcommands for serving the chat
//! front-end, listing the Gemini models usable for chat, and printing the
//! most recently captured leads.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use leadline::chat::ChatService;
use leadline::config::Config;
use leadline::credentials::{load_credentials, Credentials};
use leadline::leads::pipeline::LeadCapturePipeline;
use leadline::notify::telegram::TelegramNotifier;
use leadline::notify::{LogNotifier, NotificationQueue, NotificationSink};
use leadline::providers::gemini::GeminiProvider;
use leadline::store::{LeadStore, SqliteLeadStore};
use leadline::{logging, persona, server};

/// Leadline: chat front-end that captures leads.
#[derive(Parser)]
#[command(name = "leadline", version, about)]
struct Cli {
    /// Config file (default: `$LEADLINE_CONFIG` or `./config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// `.env` file holding credentials.
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Serve the chat API and widget.
    Start,
    /// List models that support chat generation.
    Models,
    /// Print the most recently captured leads.
    Leads {
        /// Maximum number of leads to print.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Start => handle_start(config, &cli.env_file).await,
        Command::Models => handle_models(config, &cli.env_file).await,
        Command::Leads { limit } => handle_leads(config, limit).await,
    }
}

/// Run the HTTP server until Ctrl+C.
async fn handle_start(config: Config, env_file: &Path) -> anyhow::Result<()> {
    let _logging_guard = logging::init_production(&config.logging.logs_dir)?;

    let credentials = load_credentials(env_file, &config.credential_keys())?;
    let generator = Arc::new(build_provider(&config, &credentials)?);

    let store = SqliteLeadStore::open(&config.storage.database).await?;
    info!(path = %config.storage.database.display(), "lead database opened");

    let sink = build_notification_sink(&config, &credentials);
    let (queue, worker) = NotificationQueue::spawn(sink, config.notifications.queue_capacity);

    let store: Arc<dyn LeadStore> = Arc::new(store);
    let pipeline = LeadCapturePipeline::new(store, queue);

    let system_instruction =
        persona::load_system_instruction(config.persona.system_prompt_file.as_deref())?;
    let chat = Arc::new(ChatService::new(generator, pipeline, system_instruction));

    let app = server::router(chat, &config.server.static_dir);
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;

    info!(
        bind = %config.server.bind,
        model = %config.models.default,
        "leadline listening"
    );

    server::serve(listener, app, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for shutdown signal");
        }
        info!("received shutdown signal");
    })
    .await
    .context("http server failed")?;

    // The router (and with it every queue sender) is gone once serve returns.
    worker
        .shutdown(Duration::from_secs(config.notifications.drain_timeout_secs))
        .await;

    info!("leadline shut down cleanly");
    Ok(())
}

/// Print every model that supports `generateContent`.
async fn handle_models(config: Config, env_file: &Path) -> anyhow::Result<()> {
    logging::init_cli();

    let credentials = load_credentials(env_file, &config.credential_keys())?;
    let provider = build_provider(&config, &credentials)?;

    let models = provider
        .list_models()
        .await
        .context("failed to list models")?;

    let usable: Vec<_> = models
        .iter()
        .filter(|m| m.supports_generate_content())
        .collect();
    if usable.is_empty() {
        println!("No models supporting generateContent were found.");
        return Ok(());
    }

    println!("Models supporting generateContent:");
    for model in usable {
        match model.display_name {
            Some(ref display) => println!("  {} ({display})", model.name),
            None => println!("  {}", model.name),
        }
    }
    Ok(())
}

/// Print the most recent leads, newest first.
async fn handle_leads(config: Config, limit: usize) -> anyhow::Result<()> {
    logging::init_cli();

    let store = SqliteLeadStore::open(&config.storage.database).await?;
    let leads = store.recent(limit).await.context("failed to read leads")?;

    if leads.is_empty() {
        println!("No leads captured yet.");
        return Ok(());
    }
    for lead in leads {
        println!(
            "#{id}  {at}  {name}  <{contact}>",
            id = lead.id,
            at = lead.captured_at,
            name = lead.name,
            contact = lead.contact,
        );
    }
    Ok(())
}

fn build_provider(config: &Config, credentials: &Credentials) -> anyhow::Result<GeminiProvider> {
    let api_key = credentials.require(&config.models.api_key_env)?;
    GeminiProvider::new(
        &config.models.default,
        &api_key,
        &config.models.base_url,
        Duration::from_secs(config.models.request_timeout_secs),
    )
    .context("failed to build Gemini client")
}

/// Telegram when both token and chat id are usable, otherwise log-only.
fn build_notification_sink(
    config: &Config,
    credentials: &Credentials,
) -> Arc<dyn NotificationSink> {
    let token = credentials.get(&config.telegram.bot_token_env);
    let chat_id = credentials.get(&config.telegram.chat_id_env);

    match (token, chat_id) {
        (Some(token), Some(raw_chat_id)) => match raw_chat_id.parse::<i64>() {
            Ok(chat_id) => {
                info!(chat_id, "telegram lead alerts enabled");
                Arc::new(TelegramNotifier::new(token, chat_id))
            }
            Err(e) => {
                warn!(
                    var = %config.telegram.chat_id_env,
                    error = %e,
                    "invalid telegram chat id, lead alerts will only be logged"
                );
                Arc::new(LogNotifier)
            }
        },
        _ => {
            warn!("telegram credentials missing, lead alerts will only be logged");
            Arc::new(LogNotifier)
        }
    }
}
