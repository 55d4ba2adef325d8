//! fasal - chat with Indian agriculture and climate data from the terminal

mod clipboard;
mod commands;
mod config;
mod content;
mod printer;
mod ui;

use clap::Parser;
use fasal_chat::{ChatEvent, ChatSession, HttpTransport, SubmitOutcome};
use fasal_stream::ChatClient;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::config::{CliOverrides, Config, ConfigError, Settings};
use crate::printer::LinePrinter;

/// fasal - Indian Agriculture & Climate Data Intelligence
#[derive(Parser, Debug)]
#[command(name = "fasal")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Chat endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Ask a single question and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable TUI mode (use simple stdin/stdout)
    #[arg(long)]
    no_tui: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Print the example questions and exit
    #[arg(long)]
    examples: bool,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fasal=debug"))
}

/// Install logging. The TUI owns the screen, so it logs to a file instead.
fn init_tracing(to_file: bool) {
    if !to_file {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
        return;
    }

    let path = Config::log_path();
    let file = path
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|_| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
        });
    match file {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init(),
        Err(e) => eprintln!("Warning: Failed to open log file {}: {}", path.display(), e),
    }
}

fn print_config_guidance(error: &ConfigError) {
    eprintln!("Error: {}", error);
    eprintln!();
    match error {
        ConfigError::MissingEndpoint => {
            eprintln!("Options:");
            eprintln!("  1. Pass it directly: fasal --endpoint https://.../functions/v1/data-chat");
            eprintln!("  2. Set it: export FASAL_ENDPOINT=https://...");
            eprintln!("  3. Use a hosted project: export SUPABASE_URL=https://<project>.supabase.co");
            eprintln!("  4. Add it to the config file: fasal --init-config");
        }
        ConfigError::MissingApiKey => {
            eprintln!("Options:");
            eprintln!("  1. Set it: export FASAL_API_KEY=your-key");
            eprintln!("  2. Use a hosted project key: export SUPABASE_PUBLISHABLE_KEY=your-key");
            eprintln!("  3. Add it to the config file: fasal --init-config");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = Config::load();

    // Initialize config and exit
    if args.init_config {
        match Config::init() {
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

    let cli = CliOverrides {
        endpoint: args.endpoint.clone(),
        no_tui: args.no_tui,
    };
    let settings = match cfg.resolve(&cli, |key| std::env::var(key).ok()) {
        Ok(settings) => settings,
        Err(_) if args.examples => {
            // Listing examples needs no endpoint
            let examples = cfg
                .examples
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(content::default_examples);
            print!("{}", content::examples_text(&examples));
            return Ok(());
        }
        Err(e) => {
            print_config_guidance(&e);
            std::process::exit(1);
        }
    };

    if args.examples {
        print!("{}", content::examples_text(&settings.examples));
        return Ok(());
    }

    let use_tui = settings.use_tui && args.command.is_none();
    if args.verbose {
        init_tracing(use_tui);
    }

    let client = match ChatClient::with_timeout(&settings.endpoint, &settings.api_key, settings.timeout)
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    tracing::debug!(endpoint = %client.endpoint(), "Using chat endpoint");
    let session = ChatSession::new(Arc::new(HttpTransport::new(client)));

    // Non-interactive mode
    if let Some(question) = args.command {
        return run_command(&session, &question).await;
    }

    if use_tui {
        return ui::run_tui(&session, &settings).await;
    }

    run_interactive(&session, &settings).await
}

/// Submit `question`, printing the reply as it streams. Ctrl+C stops the
/// reply and keeps what arrived.
async fn stream_reply(
    session: &ChatSession,
    events: &mut broadcast::Receiver<ChatEvent>,
    printer: &mut LinePrinter<std::io::Stdout, std::io::Stderr>,
    question: &str,
) -> anyhow::Result<fasal_chat::Result<SubmitOutcome>> {
    let handle = session.handle();
    let mut submit = std::pin::pin!(session.submit(question));

    let outcome = loop {
        tokio::select! {
            biased;

            event = events.recv() => {
                if let Ok(event) = event {
                    printer.handle(&event)?;
                }
            }

            _ = tokio::signal::ctrl_c() => handle.abort(),

            outcome = &mut submit => break outcome,
        }
    };

    drain_events(events, printer)?;
    Ok(outcome)
}

/// Print every queued event. Updates carry the full reply, so skipped
/// events lose nothing.
fn drain_events(
    events: &mut broadcast::Receiver<ChatEvent>,
    printer: &mut LinePrinter<std::io::Stdout, std::io::Stderr>,
) -> std::io::Result<()> {
    loop {
        match events.try_recv() {
            Ok(event) => printer.handle(&event)?,
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Printer fell behind session events");
            }
            Err(_) => return Ok(()),
        }
    }
}

async fn run_command(session: &ChatSession, question: &str) -> anyhow::Result<()> {
    let mut events = session.subscribe();
    let mut printer = LinePrinter::stdio();

    match stream_reply(session, &mut events, &mut printer, question).await? {
        Ok(SubmitOutcome::Completed { .. }) => Ok(()),
        Ok(SubmitOutcome::Empty) => {
            eprintln!("Error: question is empty");
            std::process::exit(2);
        }
        Ok(_) => std::process::exit(130),
        // The notice has already been printed
        Err(_) => std::process::exit(1),
    }
}

async fn run_interactive(session: &ChatSession, settings: &Settings) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let handle = session.handle();
    let mut events = session.subscribe();
    let mut printer = LinePrinter::stdio();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // Show minimal startup info (only if TTY)
    if io::IsTerminal::is_terminal(&io::stderr()) {
        eprintln!("{}", content::TITLE);
        eprintln!("Type a question, /examples for ideas, /help for commands.");
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        // EOF
        let Some(line) = line else {
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(result) = commands::execute_command(input) {
            match result {
                commands::CommandResult::Clear => {
                    handle.clear();
                    drain_events(&mut events, &mut printer)?;
                }
                commands::CommandResult::Copy(n) => {
                    let notice = clipboard::copy_reply(&handle, n);
                    printer.handle(&ChatEvent::Notice(notice))?;
                }
                commands::CommandResult::Examples => {
                    print!("{}", content::examples_text(&settings.examples));
                }
                commands::CommandResult::Message(msg) => println!("{}", msg),
                commands::CommandResult::Exit => break,
                commands::CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            continue;
        }

        // Picking an example by number
        let question = match input.parse::<usize>() {
            Ok(n) if (1..=settings.examples.len()).contains(&n) => {
                let example = settings.examples[n - 1].clone();
                println!("{}", example);
                example
            }
            _ => input.to_string(),
        };

        // Failures are reported through the printer
        if let Err(e) = stream_reply(session, &mut events, &mut printer, &question).await? {
            tracing::debug!("Request failed: {}", e);
        }
    }

    Ok(())
}
