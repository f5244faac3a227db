//! # API Guardian
//!
//! Timed API-security triage trainer.
//!
//! ```bash
//! # Live session against the scoring service
//! guardian live
//!
//! # Scripted walkthrough, no network
//! guardian demo
//!
//! # Why does this request look the way it does?
//! echo '{"id":1,"method":"GET","path":"/admin","ip":"1.2.3.4",
//!        "user_agent":"curl","freq":1,"anomaly":true}' | guardian explain
//! ```

use std::io::{BufRead, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use guardian::{parse_command, GuardianConfig, TerminalPresenter};
use guardian_core::{HeuristicExplainer, SessionController};
use guardian_networking::{LiveLinks, SessionDriver, UserCommand};
use guardian_shared::FeedMessage;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// API Guardian - block the attacks, pass the rest
#[derive(Parser)]
#[command(name = "guardian")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ./guardian.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a timed live session
    Live,

    /// Walk through the scripted training set
    Demo,

    /// Explain one feed message (JSON from a file or stdin)
    Explain {
        /// File holding the message; stdin when omitted
        file: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = GuardianConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let fallback = if cli.verbose { "debug".to_owned() } else { config.log_filter.clone() };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Live => play(config, UserCommand::StartLive).await,
        Commands::Demo => play(config, UserCommand::StartDemo).await,
        Commands::Explain { file } => explain(file),
    }
}

/// Runs the interactive session loop, starting with `first`.
async fn play(config: GuardianConfig, first: UserCommand) -> anyhow::Result<()> {
    let script = config.demo_script().context("loading demo script")?;
    tracing::info!(
        "Service {}, {}s sessions, {} demo items",
        config.server.base_url,
        config.session.duration_secs,
        script.len()
    );
    let explainer = HeuristicExplainer::new();
    let links = LiveLinks::new(config.server.clone(), explainer.clone());
    let controller = SessionController::new(config.session.clone(), script, TerminalPresenter::stdout(), links)
        .context("building session")?
        .with_explainer(explainer);

    let (tx, rx) = mpsc::channel(32);
    tx.send(first).await.context("queueing first command")?;

    // Blocking stdin lives on its own thread; the channel closing ends the driver.
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(command) => {
                    if tx.blocking_send(command).is_err() || command == UserCommand::Quit {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => eprintln!("unknown command {:?}", line.trim()),
            }
        }
    });

    let mut driver = SessionDriver::new(controller);
    driver.run(rx).await;
    Ok(())
}

/// Prints the rule-table rationale for one feed message.
fn explain(file: Option<PathBuf>) -> anyhow::Result<()> {
    let text = match &file {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).context("reading stdin")?;
            text
        }
    };

    let message: FeedMessage = serde_json::from_str(&text).context("parsing feed message")?;
    let (event, label, hint) = message.into_parts();
    let explanation = HeuristicExplainer::new().explain(&event);

    println!("#{} {} {}", event.id, event.method, event.path);
    match (explanation.rule, explanation.position) {
        (Some(rule), Some(position)) => println!("rule      {} (#{})", rule, position + 1),
        _ => println!("rule      default"),
    }
    println!("reads as  {:?}", explanation.indication);
    println!("rationale {}", explanation.text);
    println!("labelled  {}", if label.is_anomaly { "attack" } else { "benign" });
    if let Some(hint) = hint {
        println!("service   {hint}");
    }
    Ok(())
}
