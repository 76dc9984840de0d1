use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use signseq::cli::{Cli, Commands, ConfigAction};
use signseq::config::Config;
use signseq::daemon::run_daemon;
use signseq::ipc::client::{SessionClient, send_request};
use signseq::ipc::protocol::{Request, Response};
use signseq::ipc::server::IpcServer;
use signseq::output::{format_sequence, render_clip, render_event};
use signseq::replay::{aggregate_records, read_records, replay};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        Commands::Daemon { socket } => {
            let config = load_config(cli.config.as_deref())?;
            run_daemon(config, socket).await?;
        }
        Commands::Status { socket } => {
            let config = load_config(cli.config.as_deref())?;
            handle_status(resolve_socket(socket, &config)).await?;
        }
        Commands::Replay {
            file,
            transitions_only,
        } => {
            let config = load_config(cli.config.as_deref())?;
            handle_replay(&file, &config, transitions_only)?;
        }
        Commands::Aggregate { file } => {
            let config = load_config(cli.config.as_deref())?;
            let records = read_records(&file)?;
            render_clip(&aggregate_records(&records, &config.batch.to_batch_config()));
        }
        Commands::Send { file, socket } => {
            let config = load_config(cli.config.as_deref())?;
            handle_send(&file, resolve_socket(socket, &config)).await?;
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "signseq", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Initialize env_logger from -q/-v unless RUST_LOG is set.
fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Warn,
        (false, 1) => log::LevelFilter::Info,
        (false, _) => log::LevelFilter::Debug,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format_timestamp_millis().init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/signseq/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

/// CLI flag, then `[daemon] socket`, then the runtime-dir default.
fn resolve_socket(socket: Option<PathBuf>, config: &Config) -> PathBuf {
    socket
        .or_else(|| config.daemon.socket.clone())
        .unwrap_or_else(IpcServer::default_socket_path)
}

/// Handle configuration commands.
fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Dump => {
            print!("{}", Config::dump_template()?);
        }
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            let path = custom_path
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Replay a log through the live segmenter and print each event.
fn handle_replay(file: &Path, config: &Config, transitions_only: bool) -> Result<()> {
    let records = read_records(file)?;
    let events = replay(&records, &config.segmenter.to_segmenter_config());
    let color = std::io::stdout().is_terminal();

    for (record, event) in records.iter().zip(&events) {
        if transitions_only && event.transition.is_none() {
            continue;
        }
        render_event(event, Some(record.offset_ms), color);
    }

    if let Some(last) = events.last() {
        println!();
        println!(
            "{} {}",
            "Sequence:".dimmed(),
            format_sequence(&last.sequence).green()
        );
    }
    Ok(())
}

/// Stream a log to the daemon as one session.
async fn handle_send(file: &Path, socket_path: PathBuf) -> Result<()> {
    let records = read_records(file)?;
    let color = std::io::stdout().is_terminal();

    let mut client = match SessionClient::connect(&socket_path).await {
        Ok(client) => client,
        Err(e) => daemon_unreachable(e),
    };

    for record in records {
        let request = Request::Observation {
            label: record.label.clone(),
            confidence: record.confidence,
            offset_ms: Some(record.offset_ms),
        };
        match client.request(&request).await? {
            Response::Event(event) => render_event(&event, Some(record.offset_ms), color),
            Response::Error { message } => {
                eprintln!("{}", format!("Error: {}", message).red());
                std::process::exit(1);
            }
            other => {
                eprintln!("{}", format!("Unexpected response: {:?}", other).yellow());
            }
        }
    }
    Ok(())
}

/// Query daemon status and print it.
async fn handle_status(socket_path: PathBuf) -> Result<()> {
    match send_request(&socket_path, Request::Status).await {
        Ok(Response::Status {
            sessions,
            classifier,
            labels,
        }) => {
            println!("Status:");
            println!("  {}     {}", "Client:".dimmed(), signseq::version_string());
            println!("  {}      {}", "Model:".dimmed(), classifier);
            println!("  {}     {}", "Labels:".dimmed(), labels);
            // The status connection is itself a session.
            println!("  {}   {}", "Sessions:".dimmed(), sessions.saturating_sub(1));
        }
        Ok(Response::Error { message }) => {
            eprintln!("{}", format!("Error: {}", message).red());
            std::process::exit(1);
        }
        Ok(other) => {
            eprintln!("{}", format!("Unexpected response: {:?}", other).yellow());
            std::process::exit(1);
        }
        Err(e) => daemon_unreachable(e),
    }
    Ok(())
}

fn daemon_unreachable(e: signseq::SignseqError) -> ! {
    eprintln!(
        "{}",
        format!("Failed to communicate with daemon: {}", e).red()
    );
    eprintln!("Is the daemon running? Start it with: signseq daemon");
    std::process::exit(1);
}
