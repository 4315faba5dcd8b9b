//! rill - terminal chat client for a streaming inference backend

mod commands;
mod config;
mod ui;
mod utils;

use anyhow::Context;
use clap::Parser;
use rill_ai::{Attachment, ChatRequest, EndpointConfig, EndpointKind, HttpEndpoint, ModelSelector};
use rill_session::{RejectReason, SessionConfig, SessionEvent, StreamingChatSession, SubmitOutcome};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

/// rill - chat with a local inference backend
#[derive(Parser, Debug)]
#[command(name = "rill")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend base URL (default: http://localhost:5088)
    #[arg(long)]
    base_url: Option<String>,

    /// Endpoint kind: chat (multipart) or analyze (JSON)
    #[arg(long)]
    endpoint: Option<String>,

    /// Model to use, by name or id (default: Ollama)
    #[arg(short, long)]
    model: Option<String>,

    /// File to send with the first prompt
    #[arg(short, long)]
    attach: Option<PathBuf>,

    /// Run in non-interactive mode with a single prompt
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable TUI mode (use simple stdin/stdout)
    #[arg(long)]
    no_tui: bool,

    /// List selectable models
    #[arg(long)]
    list_models: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Merge config with CLI args (CLI takes precedence)
    let cfg = config::Config::load();
    let settings = cfg.resolve(config::Overrides {
        base_url: args.base_url,
        endpoint: args.endpoint,
        model: args.model,
        no_tui: args.no_tui,
    })?;

    if args.list_models {
        println!("{}", commands::ModelCommand::list_models_text(settings.model));
        return Ok(());
    }

    let use_tui = settings.tui && args.command.is_none();
    init_tracing(args.verbose, use_tui)?;

    let endpoint = HttpEndpoint::new(EndpointConfig {
        base_url: settings.base_url.clone(),
        kind: settings.kind,
        analyze_model: settings.analyze_model.clone(),
    })?;
    tracing::info!("Using {} at {}", settings.kind.name(), endpoint.url());

    let session = StreamingChatSession::new(
        SessionConfig {
            error_text: settings.error_text.clone(),
        },
        Arc::new(endpoint),
    );

    let attachment = match args.attach {
        Some(ref path) => Some(load_attachment(path, settings.kind).await?),
        None => None,
    };

    // Non-interactive mode
    if let Some(command) = args.command {
        let mut request = ChatRequest::new(command, settings.model);
        request.attachment = attachment;
        return run_command(&session, request).await;
    }

    if use_tui {
        return ui::run_tui(&session, &settings, attachment).await;
    }

    run_interactive(&session, settings.model, attachment).await
}

/// Install the tracing subscriber when asked for with `-v` or `RUST_LOG`.
///
/// The TUI owns the terminal, so its logs go to a file instead of stderr.
fn init_tracing(verbose: bool, to_file: bool) -> anyhow::Result<()> {
    if !verbose && std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rill=debug"));

    if to_file {
        let path = config::Config::log_path();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

async fn load_attachment(path: &std::path::Path, kind: EndpointKind) -> anyhow::Result<Attachment> {
    let attachment = Attachment::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if !kind.supports_attachments() {
        eprintln!(
            "Note: the {} endpoint ignores attachments; {} will not be sent",
            kind.name(),
            attachment.file_name
        );
    }
    Ok(attachment)
}

async fn run_command(session: &StreamingChatSession, request: ChatRequest) -> anyhow::Result<()> {
    match send(session, request).await {
        SubmitOutcome::Rejected(_) => anyhow::bail!("Nothing to send"),
        SubmitOutcome::Failed { error } => anyhow::bail!("Request failed: {}", error),
        _ => Ok(()),
    }
}

/// Submit one prompt, echoing the reply to stdout as it streams in.
/// Ctrl+C cancels the reply instead of killing the process.
async fn send(session: &StreamingChatSession, request: ChatRequest) -> SubmitOutcome {
    let printer = tokio::spawn(print_reply(session.subscribe()));

    let submit = session.submit(request);
    tokio::pin!(submit);
    let outcome = tokio::select! {
        outcome = &mut submit => outcome,
        _ = tokio::signal::ctrl_c() => {
            session.cancel();
            submit.await
        }
    };

    if matches!(outcome, SubmitOutcome::Rejected(_)) {
        // nothing was emitted, the printer would wait forever
        printer.abort();
    } else {
        let _ = printer.await;
    }
    outcome
}

async fn print_reply(mut receiver: broadcast::Receiver<SessionEvent>) {
    let mut stdout = io::stdout();
    let mut printed = String::new();

    loop {
        match receiver.recv().await {
            Ok(SessionEvent::MessageReplaced { message, .. }) if message.is_assistant() => {
                match utils::reply_delta(&printed, &message.content) {
                    Some(delta) => print!("{}", delta),
                    None => {
                        if !printed.is_empty() {
                            println!();
                        }
                        print!("{}", message.content);
                    }
                }
                stdout.flush().ok();
                printed = message.content;
            }
            Ok(SessionEvent::SubmitEnd { .. }) => break,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                // the next replacement carries the full text anyway
                tracing::debug!("Printer skipped {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    println!();
}

async fn run_interactive(
    session: &StreamingChatSession,
    mut model: ModelSelector,
    mut pending: Option<Attachment>,
) -> anyhow::Result<()> {
    let kind = session.endpoint_kind();

    // Show minimal startup info (only if TTY)
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("rill ({}, {} endpoint)", model.display_name(), kind.name());
        eprintln!("Type /help for commands, Ctrl+C stops a reply.");
        eprintln!();
    }

    loop {
        match pending {
            Some(ref a) => print!("[{}]> ", utils::truncate_chars(&a.file_name, 24)),
            None => print!("> "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();

        // Handle slash commands
        if let Some(result) = commands::execute_command(input) {
            match result {
                commands::CommandResult::Clear => {
                    session.clear();
                    println!("Cleared conversation.");
                }
                commands::CommandResult::Exit => {
                    break;
                }
                commands::CommandResult::Message(msg) => {
                    println!("{}", msg);
                }
                commands::CommandResult::ChangeModel(selector) => {
                    println!("Switched to: {}", selector.display_name());
                    model = selector;
                }
                commands::CommandResult::Attach(path) => match load_attachment(&path, kind).await {
                    Ok(attachment) => {
                        println!(
                            "Attached {} ({})",
                            attachment.file_name,
                            utils::format_size(attachment.len())
                        );
                        pending = Some(attachment);
                    }
                    Err(e) => println!("{:#}", e),
                },
                commands::CommandResult::Detach => match pending.take() {
                    Some(attachment) => println!("Removed {}", attachment.file_name),
                    None => println!("No file attached."),
                },
                commands::CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
                commands::CommandResult::OpenModelSelector => {
                    // In CLI mode, just list the models
                    println!("{}", commands::ModelCommand::list_models_text(model));
                }
            }
            println!();
            continue;
        }

        // a lone attachment is only worth sending where it is sent
        if input.is_empty() && (pending.is_none() || !kind.supports_attachments()) {
            continue;
        }

        println!();
        let mut request = ChatRequest::new(input, model);
        request.attachment = pending.take();

        match send(session, request).await {
            SubmitOutcome::Failed { error } => {
                tracing::debug!("Reply failed: {}", error);
            }
            SubmitOutcome::Rejected(RejectReason::Busy) => {
                println!("Still waiting for the previous reply.");
            }
            _ => {}
        }
        println!();
    }

    Ok(())
}
