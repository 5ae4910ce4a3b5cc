//! lcv - stream a document analysis from the command line

mod config;
mod ui;
mod upload;

use anyhow::Context;
use clap::Parser;
use lcv_session::{ChatSession, HttpTransport, SessionStatus};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// lcv - analyse documents against the streaming backend
#[derive(Parser, Debug)]
#[command(name = "lcv")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// PDF, JPG or PNG files to analyse
    #[arg(required_unless_present = "init_config")]
    files: Vec<PathBuf>,

    /// Base URL of the analysis backend (default: http://localhost:8000)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Full URL of the start-analysis endpoint (overrides base URL)
    #[arg(long)]
    analyse_url: Option<String>,

    /// Full URL of the resume endpoint (overrides base URL)
    #[arg(long)]
    resume_url: Option<String>,

    /// Answer yes to every interrupt
    #[arg(short, long, conflicts_with = "no")]
    yes: bool,

    /// Answer no to every interrupt
    #[arg(short, long)]
    no: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only the analysis
    let filter = if args.verbose {
        EnvFilter::new("lcv=debug,lcv_proto=debug,lcv_session=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if args.init_config {
        let path = config::Config::init().context("Error creating config")?;
        println!("Config file created at: {}", path.display());
        println!("\nExample config:\n{}", config::example_config());
        return Ok(());
    }

    // CLI flags take precedence over the config file
    let mut cfg = config::Config::load();
    if args.base_url.is_some() {
        cfg.base_url = args.base_url.clone();
    }
    if args.yes {
        cfg.auto_answer = Some(true);
    } else if args.no {
        cfg.auto_answer = Some(false);
    }

    let mut endpoints = cfg.endpoints()?;
    if let Some(url) = args.analyse_url {
        endpoints.analyse = url;
    }
    if let Some(url) = args.resume_url {
        endpoints.resume = url;
    }
    tracing::debug!(analyse = %endpoints.analyse, resume = %endpoints.resume, "Endpoints");

    let request = upload::build_request(&args.files)?;
    if request.is_empty() {
        anyhow::bail!("No PDF, JPG or PNG files to analyse");
    }

    let session = ChatSession::new(Arc::new(HttpTransport::new(endpoints)));
    let mut receiver = session.subscribe();

    // Ctrl-C aborts the stream in flight, or quits when nothing is running
    let handle = session.handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if handle.is_streaming() {
                handle.abort();
            } else {
                std::process::exit(130);
            }
        }
    });

    let task = tokio::spawn({
        let session = session.clone();
        async move { session.send(request).await }
    });
    ui::follow(&mut receiver, task).await?;

    while session.status() == SessionStatus::AwaitingAnswer {
        let Some(interrupt) = session.pending_interrupt() else {
            break;
        };
        let answer = match cfg.auto_answer {
            Some(answer) => {
                println!(
                    "\n{} [{}]",
                    interrupt.question,
                    if answer { "yes" } else { "no" }
                );
                answer
            }
            None => ui::ask(interrupt.question.clone()).await?,
        };

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.answer(answer).await }
        });
        ui::follow(&mut receiver, task).await?;
    }

    Ok(())
}
