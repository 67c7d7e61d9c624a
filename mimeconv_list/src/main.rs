use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::style;
use mimeconv_core::logging::{init_logging, LogConfig};
use mimeconv_core::{encode, render_pair, ConverterInventory, ConvertersDir, MimeType};
use regex::Regex;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

const PROGRAM: &str = "mimeconv-list";

#[derive(Parser, Debug)]
#[command(name = "mimeconv-list")]
#[command(version, about = "List MIME converters.", long_about = None)]
struct Cli {
    /// Regex searched for in each converter's file name, e.g. `→text_html$`
    #[arg(short = 'm', long = "match", value_name = "REGEX", default_value = ".*")]
    pattern: String,

    #[arg(short, long, value_enum, default_value = "human")]
    output: OutputFormat,

    /// Directory holding the converter programs
    #[arg(long, value_name = "DIR")]
    converters_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Serialize)]
struct ConverterEntry {
    from: MimeType,
    to: MimeType,
    converter: String,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {:#}", style(PROGRAM).for_stderr().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(PROGRAM, LogConfig::new().with_verbosity(cli.verbose))?;

    let pattern = Regex::new(&cli.pattern)
        .with_context(|| format!("invalid --match pattern {:?}", cli.pattern))?;

    let converters_dir = ConvertersDir::resolve(cli.converters_dir);
    debug!(dir = ?converters_dir.path, source = ?converters_dir.source, "Converters directory");
    let inventory = ConverterInventory::load(&converters_dir.path)?;

    let entries = list_converters(&inventory, &pattern);
    let rendered = render(&entries, cli.output)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(rendered.as_bytes())
        .context("Failed to write to standard output")?;
    Ok(())
}

fn list_converters(inventory: &ConverterInventory, pattern: &Regex) -> Vec<ConverterEntry> {
    inventory
        .matching(pattern)
        .map(|(from, to)| ConverterEntry {
            converter: encode(&from, &to).to_string(),
            from,
            to,
        })
        .collect()
}

fn render(entries: &[ConverterEntry], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(entries
            .iter()
            .map(|entry| format!("{}\n", render_pair(&entry.from, &entry.to)))
            .collect()),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(entries)?;
            json.push('\n');
            Ok(json)
        }
    }
}
