use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use ytcorpus_core::{
    store, total_duration_hours, CorpusError, Dataset, DatasetLayout, Pipeline, PipelineConfig,
    WhisperCli, YtDlp,
};

#[derive(Parser)]
#[command(name = "ytcorpus")]
#[command(
    about = "Download playlist audio, transcribe with Whisper, and assemble a timestamped transcript corpus"
)]
struct Cli {
    /// Flat JSON list of playlist URLs. Playlists are keyed playlist_0,
    /// playlist_1, ... by position, so reordering this file re-keys them.
    #[arg(long, default_value = "raw_urls.json")]
    input: PathBuf,

    /// Dataset root directory
    #[arg(long, default_value = "dataset")]
    dataset: PathBuf,

    /// Delete and recreate the dataset root before running
    #[arg(long)]
    reset: bool,

    /// Skip the download phase
    #[arg(long)]
    skip_fetch: bool,

    /// Skip the transcription phase
    #[arg(long)]
    skip_transcribe: bool,

    /// Re-transcribe videos that already have a transcript
    #[arg(short, long)]
    force: bool,

    /// Whisper model
    #[arg(long, default_value = "small")]
    model: String,

    /// Decoding beam width
    #[arg(long, default_value_t = 5)]
    beam_size: u32,

    /// Disable voice-activity filtering
    #[arg(long)]
    no_vad: bool,

    /// Attempt budget for the fetch phase
    #[arg(long, default_value_t = 3)]
    max_fetch_attempts: u32,

    /// Per-video timeout in seconds (0 disables)
    #[arg(long, default_value_t = 0)]
    timeout_secs: u64,

    /// Print the total corpus duration and exit
    #[arg(long)]
    stats: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Distinct exit code per failure class.
fn exit_code(err: &CorpusError) -> i32 {
    match err {
        CorpusError::InvalidUrl { .. } => 2,
        CorpusError::ResolveFailed { .. } => 3,
        CorpusError::FetchFailed { .. } => 4,
        CorpusError::NotFound { .. } | CorpusError::Corrupted { .. } => 5,
        CorpusError::IrrecoverableFetch { .. } => 6,
        CorpusError::Transcription { .. } => 7,
        CorpusError::RetriesExhausted { .. } => 8,
        CorpusError::Io(_) => 9,
        CorpusError::Json(_) => 10,
    }
}

async fn print_stats(layout: &DatasetLayout) -> Result<()> {
    // Prefer the transcribed aggregate when it exists.
    let path = if layout.final_data_path().is_file() {
        layout.final_data_path()
    } else {
        layout.data_path()
    };
    let dataset: Dataset = store::load(&path).await?;
    let videos: usize = dataset.values().map(|v| v.len()).sum();
    println!(
        "{} playlists, {} videos, {:.2} hours of audio",
        dataset.len(),
        videos,
        total_duration_hours(&dataset)
    );
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let layout = DatasetLayout::new(&cli.dataset);

    if cli.stats {
        return print_stats(&layout).await;
    }

    let ytdlp = YtDlp::default();
    let whisper = WhisperCli {
        model: cli.model.clone(),
        beam_size: cli.beam_size,
        vad_filter: !cli.no_vad,
    };
    let config = PipelineConfig {
        reset: cli.reset,
        fetch: !cli.skip_fetch,
        transcribe: !cli.skip_transcribe,
        force_transcribe: cli.force,
        max_fetch_attempts: cli.max_fetch_attempts,
        video_timeout: (cli.timeout_secs > 0).then(|| Duration::from_secs(cli.timeout_secs)),
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(layout, &ytdlp, &ytdlp, &whisper, config);

    println!(
        "\n{}  {}\n",
        style("ytcorpus").cyan().bold(),
        style("Transcript Corpus Builder").dim()
    );

    let spinner = create_spinner("Running pipeline (set RUST_LOG=info for per-video progress)...");
    let report = pipeline.run(&cli.input).await?;
    spinner.finish_and_clear();

    if let Some(fetch) = report.fetch {
        println!(
            "{} Fetched {} video(s), {} already present, {} failed",
            style("✓").green().bold(),
            fetch.fetched,
            fetch.skipped,
            fetch.failed
        );
    }
    if let Some(transcribe) = report.transcribe {
        println!(
            "{} Transcribed {} video(s), {} already present, {} failed",
            style("✓").green().bold(),
            transcribe.transcribed,
            transcribe.skipped,
            transcribe.failed
        );
    }
    if !report.irrecoverable.is_empty() {
        println!(
            "{} {} video(s) omitted from the aggregate: {}",
            style("✗").red().bold(),
            report.irrecoverable.len(),
            report.irrecoverable.join(", ")
        );
    }

    let aggregate_path = if report.transcribe.is_some() {
        pipeline.layout().final_data_path()
    } else {
        pipeline.layout().data_path()
    };
    println!(
        "\n{} {}",
        style("Saved:").dim(),
        style(aggregate_path.display()).cyan()
    );
    println!(
        "{} {:.2} hours of audio in the corpus",
        style("Total:").dim(),
        total_duration_hours(&report.dataset)
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {e:#}", style("Error:").red().bold());
        let code = e
            .downcast_ref::<CorpusError>()
            .map(exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
