//! cipher-sleuth - Identify and peel encodings and weak ciphers off CTF artifacts
//!
//! This tool classifies an input blob, tries keyless decoders, classical
//! cipher attacks and RSA weak-key attacks, and keeps going on every layer
//! it manages to decode.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use sleuth_core::oracle::HttpClient;
use sleuth_core::{Engine, EngineConfig, FactorDb, KnowledgeBase, Nitrxgen, Termination, TextReporter};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

/// Identify and decode CTF artifacts layer by layer
#[derive(Parser, Debug)]
#[command(name = "cipher-sleuth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Enable online lookups (FactorDB, md5db)
    #[arg(long, env = "CIPHER_SLEUTH_ONLINE")]
    online: bool,

    /// Maximum number of decode layers
    #[arg(long, default_value_t = sleuth_core::engine::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Timeout for each online request, in seconds
    #[arg(long, default_value = "5")]
    timeout: u64,

    /// JSON file replacing the built-in signature tables
    #[arg(long, value_name = "JSON")]
    signatures: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
struct InputMode {
    /// Text to analyze
    #[arg(short, long)]
    text: Option<String>,

    /// File to analyze
    #[arg(short, long)]
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, the report owns stdout
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let input = read_input(&cli.input)?;
    let data = normalize_input(input);
    debug!("Analyzing {} bytes", data.len());

    let engine = build_engine(&cli)?;
    let mut reporter = TextReporter::new(io::stdout().lock());
    let analysis = engine.analyze(&data, &mut reporter);
    reporter.finish().context("Failed to write report")?;

    match analysis.termination {
        Termination::Success => info!("Solved after {} layer(s)", analysis.layers.len()),
        Termination::NoMatch => info!("No decoder or attack applied"),
        Termination::DepthLimit => info!("Stopped at depth {}", cli.max_depth),
    }

    Ok(())
}

/// Where the input comes from
#[derive(Debug, PartialEq, Eq)]
enum Source<'a> {
    Text(&'a str),
    File(&'a Path),
    Stdin,
}

impl InputMode {
    /// Empty `-t` or `-f` values count as absent
    fn source(&self) -> Source<'_> {
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            return Source::Text(text);
        }
        if let Some(file) = self.file.as_deref().filter(|f| !f.as_os_str().is_empty()) {
            return Source::File(file);
        }
        Source::Stdin
    }
}

/// Load the input from `-t`, `-f`, or piped stdin
fn read_input(mode: &InputMode) -> Result<Vec<u8>> {
    match mode.source() {
        Source::Text(text) => Ok(text.as_bytes().to_vec()),
        Source::File(path) => read_file(path),
        Source::Stdin => read_stdin(),
    }
}

fn read_stdin() -> Result<Vec<u8>> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("No input: use -t <text>, -f <file>, or pipe data on stdin");
    }
    let mut buffer = Vec::new();
    stdin
        .read_to_end(&mut buffer)
        .context("Failed to read stdin")?;
    Ok(buffer)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        bail!("Input path is not a file: {}", path.display());
    }
    fs::read(path).with_context(|| format!("Failed to read input file: {}", path.display()))
}

/// Strip surrounding whitespace from text input; binary input (any NUL
/// byte) is left untouched.
///
/// UTF-8 text is trimmed of Unicode whitespace, anything else of ASCII
/// whitespace including vertical tab.
fn normalize_input(data: Vec<u8>) -> Vec<u8> {
    if data.contains(&0) {
        return data;
    }
    if let Ok(text) = std::str::from_utf8(&data) {
        return text.trim().as_bytes().to_vec();
    }
    let start = data
        .iter()
        .position(|&b| !is_space(b))
        .unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|&b| !is_space(b))
        .map_or(start, |i| i + 1);
    data[start..end].to_vec()
}

fn is_space(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0B | 0x0C | b'\r' | b' ')
}

fn build_engine(cli: &Cli) -> Result<Engine> {
    let knowledge = match cli.signatures {
        Some(ref path) => KnowledgeBase::from_file(path)
            .with_context(|| format!("Failed to load signatures: {}", path.display()))?,
        None => KnowledgeBase::builtin(),
    };

    let config = EngineConfig::new()
        .max_depth(cli.max_depth)
        .online(cli.online);

    let client = HttpClient::new(Duration::from_secs(cli.timeout));
    Ok(Engine::new(knowledge, config)
        .with_factor_oracle(FactorDb::new(client.clone()))
        .with_hash_oracle(Nitrxgen::new(client)))
}
