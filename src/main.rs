use actlog::export::{render_json, ExportOptions};
use actlog::{app, Config, Overrides};
use actlog_core::StartPosition;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "actlog", about = "Activity log ingestion and per-subscription summaries")]
struct Cli {
    /// Config file (default: ~/.config/actlog/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug-level logs on stderr (RUST_LOG still wins when set).
    #[arg(long)]
    debug: bool,

    /// Directory holding `<subscription>.jsonl` event files.
    #[arg(long)]
    events_dir: Option<PathBuf>,

    /// Directory holding `<subscription>.json` resource snapshots.
    #[arg(long)]
    directory_dir: Option<PathBuf>,

    /// Subscription to process; repeat for several. Default: every event file.
    #[arg(long = "subscription", value_name = "ID")]
    subscriptions: Vec<String>,

    /// Collection time budget per subscription, e.g. `30s`, `2m`.
    #[arg(long, value_parser = humantime::parse_duration)]
    duration: Option<Duration>,

    /// Item budget per subscription (0 = no limit).
    #[arg(long)]
    max_events: Option<usize>,

    /// `earliest`, `latest` or a numeric offset.
    #[arg(long)]
    start_position: Option<StartPosition>,

    /// Keep reading appended events until the time budget runs out.
    #[arg(long)]
    follow: bool,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Skip writing the report artifact.
    #[arg(long)]
    no_publish: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let mut cfg = Config::load(cli.config.as_deref())?;
    Overrides {
        events_dir: cli.events_dir,
        directory_dir: cli.directory_dir,
        subscriptions: cli.subscriptions,
        max_duration: cli.duration,
        max_events: cli.max_events,
        start_position: cli.start_position,
        follow: cli.follow,
        output_dir: cli.output_dir,
    }
    .apply(&mut cfg);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing with partial results");
            on_signal.cancel();
        }
    });

    let output = app::run(&cfg, cancel, !cli.no_publish).await?;

    match cli.format {
        Format::Text => print!("{}", actlog::export::render_text(&output.report)),
        Format::Json => println!(
            "{}",
            render_json(&output.report, &ExportOptions::from(&cfg.report))?
        ),
    }
    if let Some(location) = output.artifact {
        eprintln!("report written to {location}");
    }
    Ok(())
}
