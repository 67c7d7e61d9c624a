use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use mimeconv_core::logging::{init_logging, LogConfig};
use mimeconv_core::{
    detect_from_name, ConversionRequest, ConverterInventory, ConvertersDir, Dispatcher, MimeType,
    ProcessRunner, TypeDetector, STDIN_SENTINEL,
};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PROGRAM: &str = "mimeconv";

#[derive(Parser, Debug)]
#[command(name = "mimeconv")]
#[command(version, about = "Convert files from one MIME type to another.", long_about = None)]
struct Cli {
    /// File to convert, or `-` for standard input
    #[arg(value_name = "IN-FILE")]
    input: PathBuf,

    /// Where to write the result, or `-` for standard output
    #[arg(value_name = "OUT-FILE")]
    output: PathBuf,

    /// Destination type; guessed from OUT-FILE's name when omitted
    #[arg(value_name = "OUT-MIME-TYPE")]
    output_type: Option<String>,

    /// Source type; detected from IN-FILE when omitted
    #[arg(value_name = "IN-MIME-TYPE")]
    input_type: Option<String>,

    /// Directory holding the converter programs
    #[arg(long, value_name = "DIR")]
    converters_dir: Option<PathBuf>,

    /// Also write a rolling log file into this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {:#}", style(PROGRAM).for_stderr().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut log_config = LogConfig::new().with_verbosity(cli.verbose);
    if let Some(dir) = &cli.log_dir {
        log_config = log_config.with_log_dir(dir);
    }
    init_logging(PROGRAM, log_config)?;

    let converters_dir = ConvertersDir::resolve(cli.converters_dir);
    debug!(dir = ?converters_dir.path, source = ?converters_dir.source, "Converters directory");
    let inventory = ConverterInventory::load(&converters_dir.path)?;

    let src = match cli.input_type {
        Some(given) => MimeType::new(given),
        None => TypeDetector::default().detect(&cli.input)?,
    };
    let dest = match cli.output_type {
        Some(given) => MimeType::new(given),
        None => detect_from_name(&cli.output),
    };
    info!(input = ?cli.input, src = %src, output = ?cli.output, dest = %dest, "Resolved types");

    let request = ConversionRequest::new(&cli.input).from_type(src).to_type(dest);
    let converted = Dispatcher::new(&inventory, ProcessRunner).convert(&request)?;

    write_output(&cli.output, &converted)
}

/// The output file is only created once the conversion has succeeded.
fn write_output(output: &Path, bytes: &[u8]) -> Result<()> {
    if output == Path::new(STDIN_SENTINEL) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        out.write_all(bytes).context("Failed to write to standard output")?;
        out.flush().context("Failed to write to standard output")?;
        return Ok(());
    }

    let mut file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    debug!(output = ?output, bytes = bytes.len(), "Output written");
    Ok(())
}
