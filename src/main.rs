//! Shoply Support - terminal customer-support assistant
//!
//! Answers order-status commands and FAQ questions locally and falls back to
//! a remote chat-completion model with a bounded conversation memory.

mod config;
mod knowledge;
mod llm;
mod repl;
mod router;
mod session;
mod session_log;

#[cfg(test)]
mod testing;

use chrono::Local;
use config::AppConfig;
use knowledge::KnowledgeBase;
use llm::{LlmService, LoggingService, OpenAIService};
use router::IntentRouter;
use session::{system_prompt, CompletionSettings, ConversationalSession, SessionMemory};
use session_log::{JsonlSessionLog, LogEvent, SessionLog};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the chat
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shoply_support=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run());
    // A pending stdin read cannot be cancelled; don't wait for it.
    runtime.shutdown_background();
    result
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();

    // Knowledge base failures are fatal: never enter the loop without it
    let knowledge = KnowledgeBase::load(&config.faq_path, &config.orders_path).map_err(|e| {
        tracing::error!(error = %e, "Failed to load knowledge base");
        e
    })?;

    if config.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; free-form questions will fail");
    }

    let service = OpenAIService::new(
        config.api_key.clone(),
        &config.api_base,
        config.model.clone(),
        config.timeout,
    )?;
    tracing::info!(endpoint = service.endpoint(), model = %config.model, "Completion service configured");
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(service)));

    let session = ConversationalSession::new(
        llm,
        SessionMemory::new(system_prompt(&config.brand_name), config.context_size),
        CompletionSettings {
            temperature: config.temperature,
            timeout: config.timeout,
            max_tokens: None,
        },
    );
    let mut router = IntentRouter::new(knowledge, session);

    let mut log = JsonlSessionLog::create(&config.logs_dir, Local::now())?;
    log.record(LogEvent::SessionStart {
        brand: config.brand_name.clone(),
        model: config.model.clone(),
    })?;
    tracing::info!(path = %log.path().display(), "Session log opened");

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    repl::run(
        &mut router,
        &mut log,
        stdin,
        &mut stdout,
        &config.brand_name,
        &cancel,
    )
    .await?;

    Ok(())
}
