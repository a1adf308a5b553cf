//! Command line front end for signing and verifying media.
//!
//! Any rejection exits non-zero, naming the artifact which caused it.

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use media_signer::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "media-signer")]
#[command(about = "Tamper-evident signing and verification of media", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of frames hashed and signed at once (default: available
    /// parallelism)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Timeout in seconds for any single external tool invocation
    #[arg(long, global = true, default_value_t = 300)]
    timeout: u64,

    /// Root directory for extracted frames, manifests and signed files
    #[arg(long, global = true, default_value = "output")]
    out: PathBuf,

    #[arg(long, global = true, env = "MEDIA_SIGNER_FFMPEG", default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    #[arg(long, global = true, env = "MEDIA_SIGNER_FFPROBE", default_value = "ffprobe")]
    ffprobe: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Extractor {
    /// Shell out to `ffmpeg`
    #[default]
    Ffmpeg,
    /// Decode in process with GStreamer (needs the `gstreamer` feature)
    Gstreamer,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the frames of a video and sign each one, writing a manifest
    /// and its certificate
    SignFrames {
        input: PathBuf,

        #[arg(long, env = "MEDIA_SIGNER_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,

        #[arg(long, value_enum, default_value_t)]
        extractor: Extractor,
    },

    /// Verify extracted frames against a manifest
    VerifyFrames {
        manifest: PathBuf,

        /// Directory holding the frames (default: the frames directory for
        /// the manifest within the output root)
        #[arg(long)]
        frames: Option<PathBuf>,

        /// Accept a manifest without its certificate, leaving fields no frame
        /// signature covers unchecked
        #[arg(long)]
        no_certificate: bool,
    },

    /// Sign a whole container, embedding the signature in its metadata
    SignFile {
        input: PathBuf,

        /// Where to write the signed container (default:
        /// `<out>/signed/<name>.signed.<ext>`)
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, env = "MEDIA_SIGNER_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },

    /// Verify a signed container
    VerifyFile {
        container: PathBuf,

        /// Reject unless the embedded timestamp is exactly this one
        expected_timestamp: Option<String>,
    },
}

impl Cli {
    fn config(&self) -> Config {
        let defaults = Config::default();
        Config {
            out_dir: self.out.clone(),
            workers: self.workers.unwrap_or(defaults.workers).max(1),
            tool_timeout: Duration::from_secs(self.timeout),
            ffmpeg: self.ffmpeg.clone(),
            ffprobe: self.ffprobe.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config();

    match cli.command {
        Commands::SignFrames {
            input,
            private_key,
            extractor,
        } => commands::sign_frames(&config, &input, &private_key, extractor).await,
        Commands::VerifyFrames {
            manifest,
            frames,
            no_certificate,
        } => commands::verify_frames(&config, &manifest, frames, no_certificate).await,
        Commands::SignFile {
            input,
            output,
            private_key,
        } => commands::sign_file(&config, &input, output, &private_key).await,
        Commands::VerifyFile {
            container,
            expected_timestamp,
        } => commands::verify_file(&config, &container, expected_timestamp.as_deref()).await,
    }
}
