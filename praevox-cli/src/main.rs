//! Praevox command-line front-end — the "manual" processing mode.
//!
//! Reads a WAV recording, runs the conditioning pipeline, writes the
//! processed 16 kHz mono WAV, and optionally emits the stats report as
//! JSON. Queue- and HTTP-triggered ingestion live in separate services;
//! this binary is the local / debugging entry point.
//!
//! Undecodable input fails open: the original bytes are copied through
//! unmodified, because a transcript of unprocessed audio beats no audio
//! at all.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use praevox_core::audio::wav::{decode_wav, encode_wav};
use praevox_core::{Pipeline, PipelineConfig, PipelineError};
use tracing::{info, warn};

/// Input size bound (MiB) enforced before decode, like the ingestion layer
/// would. Overridable with `--max-size-mb`.
const DEFAULT_MAX_FILE_SIZE_MB: u64 = 500;

#[derive(Debug)]
struct Args {
    input: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    stats: Option<PathBuf>,
    max_file_size_mb: u64,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut stats: Option<PathBuf> = None;
    let mut max_file_size_mb = DEFAULT_MAX_FILE_SIZE_MB;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --config");
                };
                config = Some(PathBuf::from(v));
            }
            "--stats" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --stats");
                };
                stats = Some(PathBuf::from(v));
            }
            "--max-size-mb" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --max-size-mb");
                };
                max_file_size_mb = v
                    .parse::<u64>()
                    .context("invalid value for --max-size-mb")?;
            }
            "--help" | "-h" => {
                println!(
                    "Usage: praevox [--config <file.json>] [--stats <file.json>] \\\n\
                     \x20        [--max-size-mb <n>] <input.wav> <output.wav>"
                );
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("unknown argument: {other}"),
            other => {
                if input.is_none() {
                    input = Some(PathBuf::from(other));
                } else if output.is_none() {
                    output = Some(PathBuf::from(other));
                } else {
                    bail!("unexpected extra argument: {other}");
                }
            }
        }
    }

    Ok(Args {
        input: input.context("missing <input.wav>")?,
        output: output.context("missing <output.wav>")?,
        config,
        stats,
        max_file_size_mb,
    })
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PipelineConfig> {
    match path {
        None => Ok(PipelineConfig::default()),
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let config: PipelineConfig = serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?;
            Ok(config)
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    let pipeline = Pipeline::new(config)?;

    let size = fs::metadata(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?
        .len();
    if size > args.max_file_size_mb * 1024 * 1024 {
        bail!(
            "{} is {} bytes, over the {} MiB limit",
            args.input.display(),
            size,
            args.max_file_size_mb
        );
    }

    let bytes = fs::read(&args.input)?;

    let pcm = match decode_wav(&bytes) {
        Ok(pcm) => pcm,
        Err(PipelineError::Decode(reason)) => {
            // Fail open: pass the original bytes through untouched.
            warn!(
                input = %args.input.display(),
                reason,
                "input not decodable — copying through unprocessed"
            );
            fs::write(&args.output, &bytes)?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let processed = pipeline.process(pcm)?;
    let wav = encode_wav(&processed.samples, processed.sample_rate)?;
    fs::write(&args.output, wav)?;

    info!(
        output = %args.output.display(),
        original_ms = processed.stats.original_duration_ms,
        final_ms = processed.stats.final_duration_ms,
        segments = processed.stats.speech_segment_count,
        removed_ms = processed.stats.silence_removed_ms,
        "wrote processed recording"
    );

    let report = serde_json::to_string_pretty(&processed.stats)?;
    match &args.stats {
        Some(path) => fs::write(path, report)?,
        None => println!("{report}"),
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("praevox: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = run(args) {
        eprintln!("praevox: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
