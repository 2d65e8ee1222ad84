//! nsteg: seal files into protected carrier frames
//!
//! Commands:
//!   seal <input> <output>   - compress, encrypt, and write the carrier frame
//!                             (`--no-encrypt` writes a plain frame)
//!   open <input> <output>   - read a carrier frame, decrypt if needed, and decompress
//!   config show             - display the effective configuration
//!   capacity <bytes>        - carrier bits needed for a compressed payload size
//!
//! A frame is the exact bit stream an embedder hides in a carrier, packed
//! MSB-first into bytes.

mod password;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use nsteg_core::config::NstegConfig;
use nsteg_crypto::{
    frame_bit_len, BitSequence, CarrierFrame, FrameBody, FrameMode, KdfParams, PasswordPurpose,
    PasswordSource, Protector,
};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "nsteg",
    version,
    about = "Password-protected payloads for steganographic carriers",
    long_about = "nsteg: compress and encrypt a payload into a size-authenticated bit frame, \
                  and recover it again"
)]
struct Cli {
    /// Path to nsteg.toml configuration file
    #[arg(long, short = 'c', env = "NSTEG_CONFIG", default_value = "nsteg.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "NSTEG_LOG")]
    log: Option<String>,

    /// Log format (json, text); overrides the config file
    #[arg(long, env = "NSTEG_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Read the password from this environment variable instead of prompting
    #[arg(long, global = true)]
    password_env: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compress and encrypt a file into a carrier frame
    Seal {
        /// File to protect
        input: PathBuf,
        /// Where to write the frame
        output: PathBuf,
        /// Store the compressed payload without encryption
        #[arg(long)]
        no_encrypt: bool,
    },

    /// Decrypt and decompress a carrier frame
    ///
    /// Nothing is written unless the frame authenticates.
    Open {
        /// Frame extracted from a carrier (extra trailing bytes are ignored)
        input: PathBuf,
        /// Where to write the recovered file
        output: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Carrier bits needed to embed a payload of the given compressed size
    Capacity {
        /// Compressed payload size in bytes
        bytes: u32,
        /// Size an unencrypted frame instead
        #[arg(long)]
        no_encrypt: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn from_config(format: &str) -> Self {
        if format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = NstegConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;

    let level = cli.log.as_deref().unwrap_or(&config.log.level);
    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| LogFormat::from_config(&config.log.format));
    init_logging(level, &format);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "nsteg starting"
    );

    match cli.command {
        Commands::Seal {
            input,
            output,
            no_encrypt,
        } => {
            let protector = protector_for(&config)?;
            let source =
                (!no_encrypt).then(|| password::select_source(cli.password_env.as_deref()));
            cmd_seal(&config, &protector, source.as_deref(), &input, &output)
        }
        Commands::Open { input, output } => {
            let protector = protector_for(&config)?;
            let source = password::select_source(cli.password_env.as_deref());
            cmd_open(&protector, source.as_ref(), &input, &output)
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config),
        Commands::Capacity { bytes, no_encrypt } => {
            let mode = if no_encrypt {
                FrameMode::Plain
            } else {
                FrameMode::Protected
            };
            cmd_capacity(bytes, mode);
            Ok(())
        }
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn protector_for(config: &NstegConfig) -> Result<Protector> {
    let params = KdfParams::from(&config.crypto);
    params
        .validate()
        .context("invalid scrypt parameters in [crypto]")?;
    if !config.crypto.is_default() {
        tracing::warn!(
            log_n = config.crypto.scrypt_log_n,
            r = config.crypto.scrypt_r,
            p = config.crypto.scrypt_p,
            "non-default scrypt parameters: frames can only be opened with the same settings"
        );
    }
    Ok(Protector::new(params))
}

// ── Progress helpers ──────────────────────────────────────────────────────────

fn make_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn fmt_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    }
}

// ── `nsteg seal` ──────────────────────────────────────────────────────────────

/// Without a password `source` the frame is written unencrypted.
fn cmd_seal(
    config: &NstegConfig,
    protector: &Protector,
    source: Option<&dyn PasswordSource>,
    input: &Path,
    output: &Path,
) -> Result<()> {
    let data = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let packed = nsteg_payload::pack(&data, config.payload.compression_level)
        .with_context(|| format!("compressing {}", input.display()))?;

    let frame = match source {
        Some(source) => {
            // Ask before the spinner starts so the prompt stays readable
            let password = source.acquire(PasswordPurpose::Protect)?;

            let spinner = make_spinner("Encrypting data...");
            let sealed = protector.protect(&packed.compressed, &packed.sizes, password);
            spinner.finish_and_clear();
            let (salt, envelope) = sealed.context("encrypting payload")?;

            CarrierFrame::new(packed.sizes, salt, envelope)?
        }
        None => {
            tracing::warn!("sealing without encryption: anyone who extracts the frame can read it");
            CarrierFrame::plain(packed.sizes, packed.compressed)?
        }
    };
    let bytes = frame.to_bits().to_packed_bytes();
    std::fs::write(output, &bytes).with_context(|| format!("writing {}", output.display()))?;

    println!("Sealed: {} → {}", input.display(), output.display());
    println!(
        "  payload:  {} ({} compressed)",
        fmt_bytes(u64::from(packed.sizes.uncompressed)),
        fmt_bytes(u64::from(packed.sizes.compressed))
    );
    println!("  frame:    {} bits ({})", frame.bit_len(), mode_label(frame.mode()));
    Ok(())
}

// ── `nsteg open` ──────────────────────────────────────────────────────────────

fn cmd_open(
    protector: &Protector,
    source: &dyn PasswordSource,
    input: &Path,
    output: &Path,
) -> Result<()> {
    let raw = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let frame = CarrierFrame::from_bits(&BitSequence::from_bytes(&raw))
        .with_context(|| format!("parsing carrier frame from {}", input.display()))?;

    let compressed = match frame.body() {
        FrameBody::Protected { salt, envelope } => {
            let password = source.acquire(PasswordPurpose::Unprotect)?;

            let spinner = make_spinner("Decrypting data...");
            let opened = protector.unprotect(envelope, salt, frame.sizes(), password);
            spinner.finish_and_clear();
            opened.context("decrypting payload")?
        }
        FrameBody::Plain(payload) => {
            tracing::warn!(input = %input.display(), "frame is not encrypted");
            payload.clone()
        }
    };

    let data = nsteg_payload::unpack(&compressed, frame.sizes())?;
    std::fs::write(output, &data).with_context(|| format!("writing {}", output.display()))?;

    println!("Opened: {} → {}", input.display(), output.display());
    println!("  bytes:  {}", fmt_bytes(data.len() as u64));
    Ok(())
}

// ── `nsteg config show` ───────────────────────────────────────────────────────

fn cmd_config_show(config: &NstegConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = config.to_toml().context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── `nsteg capacity` ──────────────────────────────────────────────────────────

fn cmd_capacity(compressed: u32, mode: FrameMode) {
    let bits = frame_bit_len(compressed, mode);
    println!(
        "{bits} bits ({} bytes) for {compressed} compressed bytes, {}",
        bits / 8,
        mode_label(mode)
    );
}

fn mode_label(mode: FrameMode) -> &'static str {
    match mode {
        FrameMode::Protected => "encrypted",
        FrameMode::Plain => "unencrypted",
    }
}
