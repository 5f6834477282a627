//! folio - paged HTML from tag-mapped manuscript transcriptions.
//!
//! Usage:
//!   folio convert text.xml -a records.json     Paginate, annotate and write text.html
//!   folio convert text.xml --flex export.xml   Annotate straight from a FLEx export
//!   folio convert text.xml --preview           Write a standalone text_preview.html
//!   folio import-flex export.xml               Write export.json for later runs
//!   folio outline text.xml --text-name arte    Write text_outline.html

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use folio_core::{
    AnnotationRecord, ConvertOptions, Diagnostic, MatchReport, convert, import_flex, outline,
    paginate, read_events, serialize,
};
use folio_renderer::{Renderer, Theme};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "folio", version, about = "Paginate and annotate tag-mapped transcriptions")]
struct Cli {
    /// Log pipeline progress to stderr (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a tag-mapped document into paged HTML
    Convert(ConvertArgs),
    /// Turn a FLEx interlinear export into an annotation record list
    ImportFlex {
        /// FLEx XML export
        input: PathBuf,
        /// Output path ("-" for stdout); defaults to the input with a .json extension
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build a linked table of contents from numbered section divisions
    Outline(OutlineArgs),
}

#[derive(Args)]
struct OutlineArgs {
    /// Tag-mapped source document ("-" reads stdin)
    input: PathBuf,

    /// Output path ("-" for stdout); defaults to <input>_outline.html
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON options file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Prefix of section ids, also used in the entry links
    #[arg(long)]
    text_name: Option<String>,
}

#[derive(Args)]
struct ConvertArgs {
    /// Tag-mapped source document ("-" reads stdin)
    input: PathBuf,

    /// Output path ("-" for stdout); inferred from the input when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON annotation records, paired with spans in order
    #[arg(short, long, conflicts_with = "flex")]
    annotations: Option<PathBuf>,

    /// FLEx interlinear export to take annotation records from
    #[arg(long)]
    flex: Option<PathBuf>,

    /// JSON options file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra class put on every page container
    #[arg(long)]
    text_name: Option<String>,

    /// Wrap the result in a standalone preview page
    #[arg(long)]
    preview: bool,

    /// Only regroup pages and columns; no annotation
    #[arg(long, conflicts_with_all = ["annotations", "flex", "preview"])]
    paginate_only: bool,

    #[arg(long, value_enum, default_value_t = ThemeArg::Auto)]
    theme: ThemeArg,

    /// Clean every annotation payload with the HTML sanitizer
    #[arg(long)]
    sanitize: bool,

    /// Print the match report to stderr
    #[arg(long, value_enum)]
    report: Option<ReportFormat>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Auto,
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Auto => Theme::Auto,
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Pretty,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Convert(args) => cmd_convert(&args),
        Commands::ImportFlex { input, output } => cmd_import_flex(&input, output.as_deref()),
        Commands::Outline(args) => cmd_outline(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn cmd_convert(args: &ConvertArgs) -> Result<()> {
    let source = read_input(&args.input)?;
    let mut options = load_options(args.config.as_deref(), args.text_name.as_deref())?;
    if args.sanitize {
        options.serialize.sanitize_payloads = true;
    }

    if args.paginate_only {
        let events = read_events(&source, &options.recognizer)?;
        let paginated = paginate(events, &options.pagination)?;
        let html = serialize(&paginated, &options.serialize)?;
        let output = output_path(&args.input, args.output.as_deref(), "_paginated", "xml");
        return write_output(output.as_deref(), &html);
    }

    let records = load_records(args)?;
    let conversion = convert(&source, &records, &options)
        .with_context(|| format!("failed to convert {}", args.input.display()))?;
    info!(
        spans = conversion.report.spans_consumed,
        records = conversion.report.records_consumed,
        "conversion finished"
    );

    if let Some(format) = args.report {
        print_report(&conversion.report, format)?;
    }

    let (html, suffix) = if args.preview {
        let renderer = Renderer::new(args.theme.into());
        (renderer.embed_html(&conversion.html, true), "_preview")
    } else {
        (conversion.html, "")
    };
    let output = output_path(&args.input, args.output.as_deref(), suffix, "html");
    write_output(output.as_deref(), &html)
}

fn cmd_import_flex(input: &Path, output: Option<&Path>) -> Result<()> {
    let source = read_input(input)?;
    let records = import_flex(&source)
        .with_context(|| format!("failed to import FLEx export {}", input.display()))?;
    info!(records = records.len(), "imported FLEx export");
    let mut json = serde_json::to_string_pretty(&records)?;
    json.push('\n');
    let output = output_path(input, output, "", "json");
    write_output(output.as_deref(), &json)
}

fn cmd_outline(args: &OutlineArgs) -> Result<()> {
    let source = read_input(&args.input)?;
    let options = load_options(args.config.as_deref(), args.text_name.as_deref())?;
    let html = outline(&source, &options)
        .with_context(|| format!("failed to build outline of {}", args.input.display()))?;
    let output = output_path(&args.input, args.output.as_deref(), "_outline", "html");
    write_output(output.as_deref(), &html)
}

fn load_options(config: Option<&Path>, text_name: Option<&str>) -> Result<ConvertOptions> {
    let mut options = match config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read options file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid options file {}", path.display()))?
        }
        None => ConvertOptions::default(),
    };
    if let Some(text_name) = text_name {
        options.pagination.text_name = text_name.to_string();
    }
    Ok(options)
}

fn load_records(args: &ConvertArgs) -> Result<Vec<AnnotationRecord>> {
    if let Some(path) = &args.annotations {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read annotations {}", path.display()))?;
        let records: Vec<AnnotationRecord> = serde_json::from_str(&text)
            .with_context(|| format!("invalid annotation records in {}", path.display()))?;
        debug!(records = records.len(), "loaded annotation records");
        return Ok(records);
    }
    if let Some(path) = &args.flex {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read FLEx export {}", path.display()))?;
        return import_flex(&text)
            .with_context(|| format!("failed to import FLEx export {}", path.display()));
    }
    Ok(Vec::new())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// `None` means stdout.
fn output_path(
    input: &Path,
    explicit: Option<&Path>,
    suffix: &str,
    extension: &str,
) -> Option<PathBuf> {
    match explicit {
        Some(path) if path == Path::new("-") => None,
        Some(path) => Some(path.to_path_buf()),
        None if input == Path::new("-") => None,
        None => {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            Some(input.with_file_name(format!("{}{}.{}", stem, suffix, extension)))
        }
    }
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            debug!(path = %path.display(), bytes = contents.len(), "wrote output");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn print_report(report: &MatchReport, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Json => {
            eprintln!("{}", serde_json::to_string_pretty(report)?);
        }
        ReportFormat::Pretty => {
            eprintln!(
                "spans: {} ({} unmatched), records: {} ({} unused)",
                report.spans_consumed,
                report.unmatched_spans,
                report.records_consumed + report.unmatched_records,
                report.unmatched_records
            );
            for diagnostic in &report.diagnostics {
                eprintln!("{}", diagnostic_to_pretty(diagnostic));
            }
        }
    }
    Ok(())
}

fn diagnostic_to_pretty(diagnostic: &Diagnostic) -> String {
    let mut location = String::new();
    if let Some(span) = diagnostic.span_index {
        location.push_str(&format!("span {} ", span + 1));
    }
    if let Some(record) = diagnostic.record_index {
        location.push_str(&format!("record {} ", record + 1));
    }
    format!("{}warning {} {}", location, diagnostic.code, diagnostic.message)
}
