use anyhow::{Context, Result};
use clap::Parser;
use cwave::save_wav;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate_wav")]
#[command(about = "Generate canonical 16-bit stereo tone WAV files for CWAVE conversion tests")]
struct Args {
    /// Output WAV file
    output: PathBuf,

    /// TOML tone configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tone frequencies in Hz: one for both channels or "left,right"
    #[arg(short, long, default_value = "1000")]
    frequency: String,

    /// Peak amplitude in 16-bit units
    #[arg(short, long, default_value_t = 16000.0)]
    amplitude: f64,

    /// Right channel phase offset in degrees
    #[arg(short, long, default_value_t = 0.0)]
    phase: f64,

    /// Duration in seconds
    #[arg(short, long, default_value_t = 2.0)]
    duration: f64,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Write a JSON description next to the WAV file
    #[arg(long)]
    manifest: bool,
}

/// Tone for one channel
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
struct Tone {
    frequency: f64,
    amplitude: f64,
    #[serde(default)]
    phase_deg: f64,
}

#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    left: Option<Tone>,
    right: Option<Tone>,
    duration: Option<f64>,
    sample_rate: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Manifest {
    file: String,
    sample_rate: u32,
    frames: usize,
    left: Tone,
    right: Tone,
}

fn parse_frequencies(s: &str) -> Result<(f64, f64)> {
    let values: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().context("Invalid frequency value"))
        .collect::<Result<_>>()?;
    match values.as_slice() {
        [f] => Ok((*f, *f)),
        [l, r] => Ok((*l, *r)),
        _ => anyhow::bail!("Expected one frequency or 'left,right'"),
    }
}

fn load_toml_config(path: &PathBuf) -> Result<TomlConfig> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn tone_sample(tone: &Tone, n: usize, sample_rate: u32) -> i16 {
    let t = n as f64 / sample_rate as f64;
    let v = tone.amplitude * (2.0 * PI * tone.frequency * t + tone.phase_deg.to_radians()).sin();
    v.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Interleaved [L, R, ...] samples
fn generate_tones(left: &Tone, right: &Tone, frames: usize, sample_rate: u32) -> Vec<i16> {
    let mut samples = Vec::with_capacity(frames * 2);
    for n in 0..frames {
        samples.push(tone_sample(left, n, sample_rate));
        samples.push(tone_sample(right, n, sample_rate));
    }
    samples
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::init();

    let toml_config = match &args.config {
        Some(path) => load_toml_config(path)?,
        None => TomlConfig::default(),
    };

    let (left_hz, right_hz) = parse_frequencies(&args.frequency)?;
    let left = toml_config.left.unwrap_or(Tone {
        frequency: left_hz,
        amplitude: args.amplitude,
        phase_deg: 0.0,
    });
    let right = toml_config.right.unwrap_or(Tone {
        frequency: right_hz,
        amplitude: args.amplitude,
        phase_deg: args.phase,
    });
    let sample_rate = toml_config.sample_rate.unwrap_or(args.sample_rate);
    let duration = toml_config.duration.unwrap_or(args.duration);
    if sample_rate == 0 || !(duration > 0.0) {
        anyhow::bail!("Sample rate and duration must be positive");
    }

    let frames = (duration * sample_rate as f64).round() as usize;
    let samples = generate_tones(&left, &right, frames, sample_rate);
    save_wav(&args.output, &samples, sample_rate).context("Failed to write WAV file")?;

    if args.manifest {
        let manifest = Manifest {
            file: args.output.display().to_string(),
            sample_rate,
            frames,
            left,
            right,
        };
        let manifest_path = args.output.with_extension("json");
        let manifest_json =
            serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
        fs::write(&manifest_path, manifest_json).context("Failed to write manifest")?;
        eprintln!("Manifest written to: {}", manifest_path.display());
    }

    eprintln!(
        "Generated {} frames at {} Hz in {}",
        frames,
        sample_rate,
        args.output.display()
    );
    Ok(())
}
