//! Line-oriented chat loop
//!
//! Reads one line, routes it, logs and prints the outcome, and only then
//! reads the next line. Cancellation stops the loop between turns or
//! abandons an in-flight completion without printing or logging it.

use crate::llm::LlmError;
use crate::router::{Intent, IntentRouter, Reply};
use crate::session_log::{EndReason, LogEvent, SessionLog};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

pub const PROMPT: &str = "Enter your request: ";
pub const GOODBYE: &str = "Goodbye!";
pub const INTERRUPTED: &str = "[Interrupted by user]";

pub fn greeting(brand: &str) -> String {
    format!("Hi! I'm the {brand} support bot. Type \"exit\" to leave.")
}

fn record<L: SessionLog>(log: &mut L, event: LogEvent) {
    if let Err(e) = log.record(event) {
        tracing::warn!(error = %e, "Failed to write session log record");
    }
}

fn error_event(e: &LlmError) -> LogEvent {
    LogEvent::Error {
        message: e.message.clone(),
        kind: e.kind.as_str(),
        retryable: e.is_retryable(),
    }
}

/// Run the chat loop until exit, end of input, or cancellation.
///
/// `session_end` is recorded on every path, including a failed read or write.
pub async fn run<R, W, L>(
    router: &mut IntentRouter,
    log: &mut L,
    input: R,
    output: &mut W,
    brand: &str,
    cancel: &CancellationToken,
) -> std::io::Result<EndReason>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    L: SessionLog,
{
    let result = converse(router, log, input, output, brand, cancel).await;
    let reason = match &result {
        Ok(reason) => *reason,
        Err(e) => {
            tracing::error!(error = %e, "Chat terminal I/O failed");
            EndReason::IoError
        }
    };

    record(log, LogEvent::SessionEnd { reason });
    tracing::info!(?reason, "Chat session ended");
    result
}

async fn converse<R, W, L>(
    router: &mut IntentRouter,
    log: &mut L,
    mut input: R,
    output: &mut W,
    brand: &str,
    cancel: &CancellationToken,
) -> std::io::Result<EndReason>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    L: SessionLog,
{
    output
        .write_all(format!("{}\n\n", greeting(brand)).as_bytes())
        .await?;

    let mut buf = Vec::new();
    let reason = loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        // Invalid UTF-8 is replaced, not fatal
        buf.clear();
        let read = tokio::select! {
            read = input.read_until(b'\n', &mut buf) => read?,
            () = cancel.cancelled() => break EndReason::Interrupted,
        };
        if read == 0 {
            break EndReason::Eof;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);

        if matches!(router.classify(line), Intent::Order(_) | Intent::FreeText(_)) {
            record(
                log,
                LogEvent::User {
                    text: line.trim().to_string(),
                },
            );
        }

        let reply = tokio::select! {
            reply = router.route(line) => reply,
            () = cancel.cancelled() => {
                tracing::info!("Turn abandoned by interrupt");
                break EndReason::Interrupted;
            }
        };

        match reply {
            Reply::Ignored => {}
            Reply::Exit => {
                output
                    .write_all(format!("Bot: {GOODBYE}\n").as_bytes())
                    .await?;
                break EndReason::Exit;
            }
            Reply::Answer { text, source } => {
                let text = text.trim();
                record(
                    log,
                    LogEvent::Bot {
                        text: text.to_string(),
                        source: source.as_str(),
                    },
                );
                output.write_all(format!("Bot: {text}\n").as_bytes()).await?;
            }
            Reply::Failed(e) => {
                record(log, error_event(&e));
                output
                    .write_all(format!("Bot: [Error] {e}\n").as_bytes())
                    .await?;
            }
        }
    };

    match reason {
        EndReason::Interrupted => {
            output
                .write_all(format!("\n{INTERRUPTED}\n").as_bytes())
                .await?;
        }
        EndReason::Eof => output.write_all(b"\n").await?,
        EndReason::Exit | EndReason::IoError => {}
    }
    output.flush().await?;
    Ok(reason)
}
