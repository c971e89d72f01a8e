use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};

use cwave::config::{Algorithm, ConvertConfig, FftParity};
use cwave::cwave::SampleFormat;
use cwave::output::{OutputFormat, create_formatter};
use cwave::signal_processing::{FilterSpec, FilterTaps, ScanOrder, normalize_order};

#[derive(Parser, Debug)]
#[command(name = "cwave")]
#[command(about = "Convert stereo WAV files into analytic (complex) CWAVE files", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Report format
    #[arg(short = 'r', long, value_enum, default_value = "text", global = true)]
    report: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a 16-bit stereo WAV file into a CWAVE file
    Convert(ConvertArgs),
    /// Check the payload CRC of a CWAVE file
    Verify {
        /// CWAVE file to check
        file: PathBuf,
    },
    /// Print the Hilbert FIR filter coefficients
    Taps {
        /// Filter order (even, with an odd half)
        #[arg(short = 'M', long)]
        order: Option<u32>,
        /// Kaiser window beta
        #[arg(short = 'b', long)]
        beta: Option<f64>,
    },
}

#[derive(ClapArgs, Debug)]
struct ConvertArgs {
    /// Input WAV file (canonical 16-bit stereo PCM)
    input: PathBuf,

    /// Output CWAVE file
    output: PathBuf,

    /// TOML configuration file; command-line flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Conversion algorithm
    #[arg(short = 'a', long, value_enum)]
    algorithm: Option<Algorithm>,

    /// Hilbert FIR filter order (even, with an odd half)
    #[arg(short = 'M', long)]
    order: Option<u32>,

    /// Kaiser window beta
    #[arg(short = 'b', long)]
    beta: Option<f64>,

    /// Input gain multiplier
    #[arg(short = 'g', long)]
    gain: Option<f64>,

    /// Output sample format
    #[arg(short = 'f', long, value_enum)]
    format: Option<SampleFormat>,

    /// Worker threads (1 forces single-threaded processing)
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// FIR delay line scan order
    #[arg(long, value_enum)]
    scan: Option<ScanOrder>,

    /// Keep the FIR group delay: emit the unsettled head and M/2 extra samples
    #[arg(long)]
    no_delay_compensation: bool,

    /// FFT length parity
    #[arg(long, value_enum)]
    parity: Option<FftParity>,

    /// Spill one channel to disk during FFT conversion to bound memory use
    #[arg(long)]
    safe: bool,

    /// Directory for the safe-mode scratch file
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Remove spectrum below this frequency (FFT only)
    #[arg(long)]
    low_band: Option<f64>,

    /// Remove spectrum above this frequency (FFT only)
    #[arg(long)]
    high_band: Option<f64>,

    /// Audio CD band: same as --low-band 21 --high-band 21000
    #[arg(long, conflicts_with_all = ["low_band", "high_band"])]
    cd_band: bool,
}

impl ConvertArgs {
    fn build_config(&self) -> anyhow::Result<ConvertConfig> {
        let mut config = match &self.config {
            Some(path) => ConvertConfig::load(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => ConvertConfig::default(),
        };

        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }
        if let Some(order) = self.order {
            config.fir.order = order;
        }
        if let Some(beta) = self.beta {
            config.fir.beta = beta;
        }
        if let Some(gain) = self.gain {
            config.gain = gain;
        }
        if let Some(format) = self.format {
            config.format = Some(format);
        }
        if let Some(threads) = self.threads {
            config.threads = Some(threads);
        }
        if let Some(scan) = self.scan {
            config.fir.scan = scan;
        }
        if self.no_delay_compensation {
            config.fir.compensate_delay = false;
        }
        if let Some(parity) = self.parity {
            config.fft.parity = parity;
        }
        if self.safe {
            config.fft.safe_mode = true;
        }
        if let Some(dir) = &self.scratch_dir {
            config.fft.scratch_dir = Some(dir.clone());
        }
        if self.cd_band {
            config.fft.low_band_hz = Some(21.0);
            config.fft.high_band_hz = Some(21_000.0);
        }
        if let Some(low) = self.low_band {
            config.fft.low_band_hz = Some(low);
        }
        if let Some(high) = self.high_band {
            config.fft.high_band_hz = Some(high);
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let formatter = create_formatter(cli.report, cli.verbose > 0);

    match cli.command {
        Command::Convert(args) => {
            let config = args.build_config()?.finalize()?;
            let report = cwave::convert(&config, &args.input, &args.output).with_context(|| {
                format!(
                    "Failed to convert {} into {}",
                    args.input.display(),
                    args.output.display()
                )
            })?;
            println!("{}", formatter.conversion(&report));
        }
        Command::Verify { file } => {
            let report = cwave::verify(&file)
                .with_context(|| format!("Failed to verify {}", file.display()))?;
            println!("{}", formatter.verification(&report));
            if !report.is_intact() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Taps { order, beta } => {
            let order = normalize_order(order.unwrap_or(cwave::constants::DEFAULT_FILTER_ORDER))?;
            let beta = beta.unwrap_or(cwave::constants::DEFAULT_KAISER_BETA);
            let taps = FilterTaps::design(FilterSpec::new(order as usize, beta)?);
            println!("Hilbert FIR filter coefficients, order {}, beta {} (odd indices are zero):", order, beta);
            for (k, tap) in taps.taps().iter().enumerate() {
                println!("h[{:4}] = {:24.16e}", 2 * k, tap);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
