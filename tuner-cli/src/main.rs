//! # Tuner - Headless Command-Line Front End
//!
//! Captures audio from the default input device and prints one line per
//! analysis frame.
//!
//! ## Architecture
//! - **Audio Thread**: CPAL callback re-blocks samples into fixed-size chunks
//! - **Analysis Thread**: `AnalysisWorker` runs the pitch pipeline
//! - **Main Thread**: drains results and prints them until Enter is pressed
//!
//! ## Usage
//! ```text
//! tuner-cli [--json] [--all] [CONFIG.json]
//! ```

mod output;

use std::fs::File;
use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result, bail};
use cpal::traits::StreamTrait;
use tracing::{info, warn};
use tuner_core::{AnalysisPipeline, AnalysisWorker, PipelineConfig, audio, result_channel};

use output::{OutputFormat, render};

/// Chunks buffered between the audio callback and the analysis thread.
const CHUNK_QUEUE_DEPTH: usize = 8;

/// Results buffered between the analysis thread and the printer.
const RESULT_QUEUE_DEPTH: usize = 4;

#[derive(Debug, Default, PartialEq)]
struct CliOptions {
    format: OutputFormat,
    /// Also print silent and out-of-range frames.
    all_frames: bool,
    config_path: Option<PathBuf>,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self::default();
        for arg in args {
            match arg.as_str() {
                "--json" => options.format = OutputFormat::Json,
                "--all" => options.all_frames = true,
                flag if flag.starts_with("--") => bail!("unknown option {flag}"),
                path => {
                    if options.config_path.is_some() {
                        bail!("only one configuration file may be given");
                    }
                    options.config_path = Some(PathBuf::from(path));
                }
            }
        }
        Ok(options)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let options = CliOptions::parse(std::env::args().skip(1))?;
    let mut config = match &options.config_path {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    config
        .validate()
        .context("invalid pipeline configuration")?;

    let (chunk_tx, chunk_rx) = crossbeam_channel::bounded(CHUNK_QUEUE_DEPTH);
    let (stream, sample_rate) = audio::start_audio_capture(&config, chunk_tx)?;
    if sample_rate != config.sample_rate {
        warn!(
            requested = config.sample_rate,
            actual = sample_rate,
            "device does not support the requested sample rate"
        );
        config.sample_rate = sample_rate;
    }

    let pipeline = AnalysisPipeline::new(config)?;
    let (publisher, subscriber) = result_channel(RESULT_QUEUE_DEPTH);
    let worker = AnalysisWorker::spawn(pipeline, chunk_rx, publisher);

    let (quit_tx, quit_rx) = crossbeam_channel::bounded::<()>(1);
    thread::spawn(move || {
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        let _ = quit_tx.send(());
    });

    info!("listening, press Enter to stop");
    loop {
        crossbeam_channel::select! {
            recv(subscriber.receiver()) -> msg => match msg {
                Ok(result) => {
                    if let Some(line) = render(&result, options.format, options.all_frames)? {
                        println!("{line}");
                    }
                }
                Err(_) => break,
            },
            recv(quit_rx) -> _ => break,
        }
    }

    // Stop chunk delivery before the pipeline is torn down.
    if let Err(e) = stream.pause() {
        warn!("error pausing stream: {}", e);
    }
    drop(stream);
    worker.shutdown();
    info!("stopped");
    Ok(())
}

/// Loads a pipeline configuration from a JSON file.
///
/// Fields missing from the file keep their default values.
fn load_config(path: &Path) -> Result<PipelineConfig> {
    let mut file = File::open(path)
        .with_context(|| format!("opening config {}", path.display()))?;
    let mut data = String::new();
    file.read_to_string(&mut data)?;
    let config: PipelineConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags_and_config_path() {
        let options = CliOptions::parse(args(&["--json", "tuner.json", "--all"])).unwrap();
        assert_eq!(options.format, OutputFormat::Json);
        assert!(options.all_frames);
        assert_eq!(options.config_path, Some(PathBuf::from("tuner.json")));
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(CliOptions::parse(args(&["--loud"])).is_err());
        assert!(CliOptions::parse(args(&["a.json", "b.json"])).is_err());
    }

    #[test]
    fn partial_config_files_keep_defaults() {
        let path = std::env::temp_dir().join(format!("tuner-cli-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "harmonics": 5, "interpolate": true }"#).unwrap();
        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.harmonics, 5);
        assert!(config.interpolate);
        assert_eq!(config.chunk_size, PipelineConfig::default().chunk_size);
    }
}
