//! docshift CLI - convert documents between PDF, DOCX, TXT, RTF and ODT
//!
//! Client mode extracts text locally and regenerates the target format;
//! server mode hands the file to a `docshift-server` instance.

#![allow(
    clippy::needless_pass_by_value, // clap hands over owned arguments
    clippy::unnecessary_wraps,      // consistent Result return for command handlers
)]

mod config;
mod prompt;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use config::Config;
use docshift_backend::{Converter, FixedPassword, ServerBridge};
use docshift_core::{
    adjust_target, available_targets, suggested_file_name, ConversionError, ConversionMode,
    ConvertOptions, Format, SourceDocument,
};
use indicatif::{ProgressBar, ProgressStyle};
use prompt::TerminalPrompt;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

/// Exit code for conversions refused by policy (server unavailable, blocked pair)
const EXIT_POLICY: u8 = 2;

/// Exit code for a missing input file
const EXIT_NOT_FOUND: u8 = 3;

#[derive(Parser)]
#[command(name = "docshift")]
#[command(version, about = "Convert documents between PDF, DOCX, TXT, RTF and ODT")]
struct Cli {
    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document to another format
    #[command(after_help = "Examples:\n  \
                      docshift convert report.pdf --to txt\n  \
                      docshift convert scan.pdf --to docx --preserve-layout\n  \
                      docshift convert letter.docx --to pdf --mode server --server http://localhost:8080\n\n\
                      Defaults can be set in .docshift.toml ([convert] server_url, mode, preserve_layout, output_dir).")]
    Convert(ConvertArgs),

    /// List the formats a document can be converted to
    Targets {
        /// Document (only its extension is used)
        input: PathBuf,
    },

    /// List supported formats
    Formats {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check whether the conversion server can convert documents
    Health {
        /// Conversion server base URL (defaults to convert.server_url)
        #[arg(long)]
        server: Option<String>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the merged configuration (~/.docshift.toml, then ./.docshift.toml)
    Show,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Document to convert
    input: PathBuf,

    /// Target format: pdf, docx, txt, rtf or odt
    #[arg(short, long)]
    to: Format,

    /// Output file (default: <stem>.<ext> next to the input, or in convert.output_dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Conversion server base URL
    #[arg(long)]
    server: Option<String>,

    /// Where the conversion runs
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// PDF to DOCX: keep each page's appearance as an image
    #[arg(long)]
    preserve_layout: bool,

    /// Overwrite the output file if it exists
    #[arg(short, long)]
    force: bool,

    /// Password for a protected PDF (prompted for when omitted)
    #[arg(long)]
    password: Option<String>,

    /// OCR scanned PDF pages (needs the `tesseract` feature)
    #[arg(long)]
    ocr: bool,

    /// Tesseract language for --ocr
    #[arg(long, default_value = "eng")]
    ocr_lang: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Local extraction and regeneration
    Client,
    /// Office-suite conversion on the server
    Server,
}

impl From<ModeArg> for ConversionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Client => Self::Client,
            ModeArg::Server => Self::Server,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Output file already exists: {} (use --force to overwrite)", .0.display())]
    OutputExists(PathBuf),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "Error:".red().bold());
            for hint in hints(&err) {
                eprintln!("  {} {hint}", "Hint:".cyan().bold());
            }
            ExitCode::from(exit_status(&err))
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn hints(err: &anyhow::Error) -> Vec<String> {
    match err.downcast_ref::<ConversionError>() {
        Some(ConversionError::ServerUnavailable(_)) => vec![
            "Start docshift-server and pass --server <URL>, or convert with --mode client".to_string(),
        ],
        Some(ConversionError::BlockedPair { .. }) => {
            vec!["Convert with --mode client (add --preserve-layout to keep page appearance)".to_string()]
        }
        Some(other) => other.hints().to_vec(),
        None => Vec::new(),
    }
}

fn exit_status(err: &anyhow::Error) -> u8 {
    if matches!(err.downcast_ref::<CliError>(), Some(CliError::InputNotFound(_))) {
        return EXIT_NOT_FOUND;
    }
    match err.downcast_ref::<ConversionError>() {
        Some(e) if e.is_policy() => EXIT_POLICY,
        _ => 1,
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::discover();
    match cli.command {
        Commands::Convert(args) => convert(args, &config).map(|()| ExitCode::SUCCESS),
        Commands::Targets { input } => targets(&input).map(|()| ExitCode::SUCCESS),
        Commands::Formats { json } => formats(json).map(|()| ExitCode::SUCCESS),
        Commands::Health { server } => health(server, &config),
        Commands::Config {
            action: ConfigAction::Show,
        } => show_config(&config).map(|()| ExitCode::SUCCESS),
    }
}

/// Format bytes as human-readable size (e.g., "1.5 KB")
#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} bytes")
    }
}

/// Explicit `-o`, else `<output_dir>/<stem>.<ext>`, else next to the input
fn output_path(
    input: &Path,
    explicit: Option<&Path>,
    output_dir: Option<&Path>,
    file_name: &str,
    target: Format,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let name = suggested_file_name(file_name, target);
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

fn spinner(message: String) -> ProgressBar {
    let s = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        s.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    s.set_message(message);
    s.enable_steady_tick(Duration::from_millis(80));
    s
}

#[cfg(feature = "tesseract")]
fn with_ocr(converter: Converter, args: &ConvertArgs) -> Result<Converter> {
    if !args.ocr {
        return Ok(converter);
    }
    let ocr = docshift_backend::TesseractOcr::new(args.ocr_lang.clone())?;
    Ok(converter.with_ocr(ocr))
}

#[cfg(not(feature = "tesseract"))]
fn with_ocr(converter: Converter, args: &ConvertArgs) -> Result<Converter> {
    if args.ocr {
        eprintln!(
            "{} Built without OCR support (--ocr ignored); rebuild with --features tesseract",
            "Warning:".yellow().bold()
        );
    }
    Ok(converter)
}

fn convert(args: ConvertArgs, config: &Config) -> Result<()> {
    if !args.input.is_file() {
        return Err(CliError::InputNotFound(args.input).into());
    }
    let document = SourceDocument::from_path(&args.input)?;
    let source = document.format().ok_or_else(|| {
        anyhow!(
            "Cannot determine the format of {}; supported extensions: pdf, docx, txt, rtf, odt",
            args.input.display()
        )
    })?;

    let target = adjust_target(source, args.to);
    if target != args.to {
        eprintln!(
            "{} {} is already {source}; converting to {target} instead",
            "Warning:".yellow().bold(),
            document.file_name
        );
    }

    let defaults = &config.convert;
    let mode = args
        .mode
        .map(ConversionMode::from)
        .or(defaults.mode)
        .unwrap_or_default();
    let preserve_layout = args.preserve_layout || defaults.preserve_layout.unwrap_or(false);
    let server_url = args.server.clone().or_else(|| defaults.server_url.clone());

    let output = output_path(
        &args.input,
        args.output.as_deref(),
        defaults.output_dir.as_deref(),
        &document.file_name,
        target,
    );
    if output.exists() && !args.force {
        return Err(CliError::OutputExists(output).into());
    }

    let spinner = spinner(format!(
        "Converting {} to {target} ({mode} mode)...",
        document.file_name
    ));

    let mut converter = Converter::new();
    if let Some(password) = args.password.clone() {
        converter = converter.with_password_prompt(FixedPassword::new(password));
    } else if std::io::stdin().is_terminal() {
        converter = converter.with_password_prompt(TerminalPrompt::new(Some(spinner.clone())));
    }
    if let Some(url) = server_url {
        converter = converter.with_bridge(ServerBridge::new(url)?);
    }
    converter = with_ocr(converter, &args)?;

    if mode == ConversionMode::Server {
        spinner.set_message("Checking conversion server...");
        let available = converter.refresh_health().available;
        tracing::debug!("Server available: {available}");
        spinner.set_message(format!("Converting {} to {target} on the server...", document.file_name));
    }

    let options = ConvertOptions::default()
        .with_mode(mode)
        .with_preserve_layout(preserve_layout);
    let result = converter.convert(&document, source, target, &options);
    spinner.finish_and_clear();
    let artifact = result?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    fs::write(&output, &artifact.bytes)
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    println!(
        "{} {} → {} ({})",
        "✓".green().bold(),
        args.input.display(),
        output.display(),
        format_bytes(artifact.len())
    );
    Ok(())
}

fn targets(input: &Path) -> Result<()> {
    let source = Format::from_path(input).ok_or_else(|| {
        anyhow!(
            "Unsupported file type: {} (expected pdf, docx, txt, rtf or odt)",
            input.display()
        )
    })?;
    println!("{} ({source}) can be converted to:", input.display());
    for target in available_targets(source) {
        println!("  {:<5} {}", target.extension(), target.to_string().dimmed());
    }
    Ok(())
}

fn formats(json: bool) -> Result<()> {
    if json {
        let catalog: Vec<serde_json::Value> = Format::ALL
            .into_iter()
            .map(|format| {
                serde_json::json!({
                    "label": format.to_string(),
                    "extension": format.extension(),
                    "mime_type": format.mime_type(),
                    "targets": available_targets(format)
                        .into_iter()
                        .map(|t| t.extension())
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    println!("{}", "Supported formats:".bold());
    for format in Format::ALL {
        println!(
            "  {:<5} .{:<5} {}",
            format.to_string(),
            format.extension(),
            format.mime_type().dimmed()
        );
    }
    Ok(())
}

fn health(server: Option<String>, config: &Config) -> Result<ExitCode> {
    let url = server
        .or_else(|| config.convert.server_url.clone())
        .ok_or_else(|| {
            anyhow!("No conversion server configured; pass --server or set convert.server_url in .docshift.toml")
        })?;

    let status = ServerBridge::new(url.clone())?.health();
    if status.available {
        println!("{} Conversion server at {url} is available", "✓".green().bold());
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} Conversion server at {url} is unavailable", "✗".red().bold());
    if let Some(message) = &status.message {
        println!("  {message}");
    }
    Ok(ExitCode::FAILURE)
}

fn show_config(config: &Config) -> Result<()> {
    let text = toml::to_string_pretty(config).context("Failed to render configuration")?;
    print!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_output_path_precedence() {
        let input = Path::new("docs/report.pdf");
        assert_eq!(
            output_path(input, Some(Path::new("x.txt")), Some(Path::new("out")), "report.pdf", Format::Txt),
            PathBuf::from("x.txt")
        );
        assert_eq!(
            output_path(input, None, Some(Path::new("out")), "report.pdf", Format::Txt),
            PathBuf::from("out/report.txt")
        );
        assert_eq!(
            output_path(input, None, None, "report.pdf", Format::Docx),
            PathBuf::from("docs/report.docx")
        );
    }

    #[test]
    fn test_exit_codes() {
        let not_found = anyhow::Error::from(CliError::InputNotFound(PathBuf::from("a.pdf")));
        assert_eq!(exit_status(&not_found), EXIT_NOT_FOUND);

        let blocked = anyhow::Error::from(ConversionError::BlockedPair {
            source_format: Format::Pdf,
            target: Format::Docx,
        });
        assert_eq!(exit_status(&blocked), EXIT_POLICY);
        assert!(hints(&blocked)[0].contains("--mode client"));

        let other = anyhow::Error::from(ConversionError::FormatError("bad".to_string()));
        assert_eq!(exit_status(&other), 1);
    }

    #[test]
    fn test_cli_parses_convert() {
        let cli = Cli::try_parse_from([
            "docshift", "convert", "a.pdf", "--to", "DOCX", "--mode", "server", "--preserve-layout",
        ])
        .unwrap();
        let Commands::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.to, Format::Docx);
        assert_eq!(args.mode, Some(ModeArg::Server));
        assert!(args.preserve_layout);
        assert_eq!(args.ocr_lang, "eng");
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["docshift", "convert", "a.pdf", "--to", "xls"]).is_err());
    }
}
