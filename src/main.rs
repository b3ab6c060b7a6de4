//! tts-lite CLI - phoneme ids in, WAV file out

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use tts_lite::text::parse_ids;
use tts_lite::{
    PerformanceMode, SynthesisConfig, SynthesisPipeline, SynthesisRequest, TtsError, WavInfo,
    VERSION,
};

/// tts-lite - two-stage (acoustic model + vocoder) speech synthesis
#[derive(Parser, Debug)]
#[command(name = "tts-lite")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize a WAV file from phoneme ids
    Synth {
        /// Phoneme ids, comma separated
        #[arg(short, long)]
        phones: String,

        /// Tone ids, one per phoneme (defaults to all zeros)
        #[arg(short, long)]
        tones: Option<String>,

        /// Speaker id for multi-speaker models
        #[arg(short, long)]
        speaker: Option<i32>,

        /// Path to YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Acoustic model file
        #[arg(long)]
        acoustic_model: Option<PathBuf>,

        /// Vocoder model file
        #[arg(long)]
        vocoder: Option<PathBuf>,

        /// Output WAV path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// WAV bit depth (16 or 32)
        #[arg(long)]
        bit_depth: Option<u16>,

        /// WAV sample rate
        #[arg(long)]
        sample_rate: Option<u32>,

        /// Engine worker threads
        #[arg(long)]
        threads: Option<usize>,

        /// CPU scheduling hint (high, low, full, no-bind, rand-high, rand-low)
        #[arg(long)]
        performance_mode: Option<PerformanceMode>,

        /// Element type of the phoneme id input
        #[arg(long)]
        phone_id_type: Option<String>,

        /// Element type of the speaker id input
        #[arg(long)]
        speaker_id_type: Option<String>,

        /// Scale 16-bit output to the waveform peak
        #[arg(long)]
        normalize_peak: bool,
    },

    /// Show the header of a WAV file
    Inspect {
        /// WAV file to read
        wav: PathBuf,
    },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    info!("tts-lite v{}", VERSION);

    let result = match cli.command {
        Commands::Synth {
            phones,
            tones,
            speaker,
            config,
            acoustic_model,
            vocoder,
            output,
            bit_depth,
            sample_rate,
            threads,
            performance_mode,
            phone_id_type,
            speaker_id_type,
            normalize_peak,
        } => {
            let loaded = match &config {
                Some(path) => SynthesisConfig::load(path),
                None => Ok(SynthesisConfig::default()),
            };
            loaded.and_then(|mut cfg| {
                cfg.acoustic_model = acoustic_model.unwrap_or(cfg.acoustic_model);
                cfg.vocoder = vocoder.unwrap_or(cfg.vocoder);
                cfg.output = output.unwrap_or(cfg.output);
                cfg.bit_depth = bit_depth.unwrap_or(cfg.bit_depth);
                cfg.sample_rate = sample_rate.unwrap_or(cfg.sample_rate);
                cfg.threads = threads.unwrap_or(cfg.threads);
                cfg.performance_mode = performance_mode.unwrap_or(cfg.performance_mode);
                cfg.phone_id_type = phone_id_type.unwrap_or(cfg.phone_id_type);
                cfg.speaker_id_type = speaker_id_type.unwrap_or(cfg.speaker_id_type);
                cfg.speaker_id = speaker.or(cfg.speaker_id);
                cfg.normalize_peak |= normalize_peak;

                let request = build_request(&phones, tones.as_deref(), cfg.speaker_id)?;
                synth(&cfg, &request)
            })
        }

        Commands::Inspect { wav } => inspect(&wav),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<TtsError>() {
                Some(tts) => error!("{} error: {}", tts.kind(), tts),
                None => error!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn build_request(
    phones: &str,
    tones: Option<&str>,
    speaker_id: Option<i32>,
) -> Result<SynthesisRequest> {
    let phone_ids = parse_ids(phones).map_err(anyhow::Error::msg).context("Bad --phones")?;
    let tone_ids = match tones {
        Some(t) => parse_ids(t).map_err(anyhow::Error::msg).context("Bad --tones")?,
        None => vec![0; phone_ids.len()],
    };
    Ok(SynthesisRequest::new(phone_ids, tone_ids, speaker_id))
}

fn synth(cfg: &SynthesisConfig, request: &SynthesisRequest) -> Result<()> {
    cfg.validate()?;
    let encoding = cfg.encoding()?;

    let mut pipeline =
        SynthesisPipeline::new(encoding).with_peak_normalization(cfg.normalize_peak);

    let pb = create_progress_bar("Loading models...");
    let loaded = pipeline.initialize(&cfg.pipeline_config());
    pb.finish_and_clear();
    loaded?;
    info!("Acoustic model: {:?}", cfg.acoustic_model);
    info!("Vocoder: {:?}", cfg.vocoder);

    pipeline.bind_request(request, &cfg.phone_id_type, &cfg.speaker_id_type)?;

    let pb = create_progress_bar("Synthesizing...");
    let synthesized = pipeline.synthesize();
    pb.finish_and_clear();
    synthesized?;

    info!(
        "RTF: {:.4} ({:.1} ms audio in {:.1} ms)",
        pipeline.real_time_factor(),
        pipeline.audio_duration_ms(),
        pipeline.inference_duration_ms()
    );

    if let Some(parent) = cfg.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    pipeline.write_wav(&cfg.output)?;
    Ok(())
}

fn inspect(wav: &Path) -> Result<()> {
    let info = WavInfo::read(wav).with_context(|| format!("Failed to read {:?}", wav))?;
    println!("File:        {}", wav.display());
    println!("Channels:    {}", info.channels);
    println!("Sample rate: {} Hz", info.sample_rate);
    println!(
        "Format:      {}-bit {}",
        info.bits_per_sample,
        if info.is_float { "float" } else { "PCM" }
    );
    println!("Frames:      {}", info.frames);
    println!("Duration:    {:.1} ms", info.duration_ms());
    Ok(())
}
