use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use terminal_metronome::audio::CpalSink;
use terminal_metronome::config::AppConfig;
use terminal_metronome::engine::tempo::resolve_bpm_arg;
use terminal_metronome::engine::{Metronome, MetronomeSettings, Tempo, TokioScheduler};
use terminal_metronome::error::ErrorCode;
use terminal_metronome::tui::{run_event_loop, InputReader, TerminalSession};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "metronome", about = "Terminal metronome with an audible click")]
struct Cli {
    /// Tempo in beats per minute (20-300)
    #[arg(value_name = "BPM", allow_hyphen_values = true)]
    bpm: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file (no logging when absent)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Maximum log level
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref(), cli.log_level)?;

    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    let fallback = Tempo::clamped(config.metronome.default_bpm);
    let (tempo, warning) = resolve_bpm_arg(cli.bpm.as_deref(), fallback);
    let notice = warning.map(|err| {
        tracing::warn!(code = err.code(), "{}", err);
        let notice = format!("{}. Defaulting to {}.", err, fallback.bpm());
        println!("Usage: metronome [BPM]");
        println!("{}", notice);
        notice
    });

    let sink = CpalSink::from_config(&config.audio).context("initializing audio output")?;
    tracing::info!(
        device = sink.device_name(),
        bpm = tempo.bpm(),
        "audio output ready"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building event loop runtime")?;
    runtime.block_on(run_metronome(
        MetronomeSettings::from_config(&config, tempo),
        sink,
        notice,
    ))
}

async fn run_metronome(
    settings: MetronomeSettings,
    sink: CpalSink,
    notice: Option<String>,
) -> Result<()> {
    let (scheduler, mut timers) = TokioScheduler::new();
    let mut metronome = Metronome::new(settings, scheduler, sink);

    let mut session = TerminalSession::enter().context("setting up terminal")?;
    if let Some(notice) = notice {
        session.set_notice(notice);
    }
    let (input_tx, mut input) = mpsc::unbounded_channel();
    let mut reader = InputReader::spawn(input_tx).context("starting input reader")?;

    metronome.start();
    let result = run_event_loop(&mut metronome, &mut timers, &mut input, |snapshot| {
        session.draw(snapshot)
    })
    .await;

    reader.stop();
    let released = metronome.quit().context("releasing audio output");
    session.restore().context("restoring terminal")?;
    result.and(released)
}

fn init_logging(path: Option<&Path>, level: tracing::Level) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file =
        File::create(path).with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
    Ok(())
}
