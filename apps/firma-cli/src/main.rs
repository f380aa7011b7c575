//! firma command line
//!
//! `firma sign` signs a batch of PDFs from a roster; `firma verify-roster`
//! checks a roster without touching any document. Diagnostics go to stderr
//! through `tracing`; the report goes to stdout.

mod inputs;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use firma_core::{
    Diagnostic, DiagnosticSink, DocumentProcessor, IdentityIndex, PlacementConfig, Roster,
    RunConfig, ScanConfig, TracingSink,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit status when the run completed but no document was signed.
const EXIT_NOTHING_SIGNED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "firma")]
#[command(version, about = "Place roster signatures above names in PDF documents")]
struct Cli {
    /// Log every matching decision (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign PDF documents
    Sign(SignArgs),
    /// List the roster and check that every signature file exists
    VerifyRoster {
        /// Roster spreadsheet (.xlsx, .xls, .xlsb, .ods)
        roster: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SignArgs {
    /// PDF files or directories containing PDFs
    inputs: Vec<PathBuf>,

    /// Roster spreadsheet (.xlsx, .xls, .xlsb, .ods)
    #[arg(short, long)]
    roster: Option<PathBuf>,

    /// Directory for signed copies (default: beside each source)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// TOML run file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Signature width in points (recommended 50-300)
    #[arg(long)]
    width: Option<u32>,

    /// Signature height in points (recommended 30-200)
    #[arg(long)]
    height: Option<u32>,

    /// Gap between signature and text in points (recommended -50 to 50)
    #[arg(long, allow_hyphen_values = true)]
    top_margin: Option<i32>,

    /// Also scan the first page of multi-page documents
    #[arg(long)]
    include_cover_page: bool,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Sign(args) => sign(args),
        Command::VerifyRoster { roster } => verify_roster(roster),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // stdout carries the report, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Run file values with command-line flags applied on top.
fn resolve_run(args: &SignArgs) -> anyhow::Result<RunConfig> {
    let mut run = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    if args.roster.is_some() {
        run.roster = args.roster.clone();
    }
    if !args.inputs.is_empty() {
        run.inputs = args.inputs.clone();
    }
    if args.output_dir.is_some() {
        run.output_dir = args.output_dir.clone();
    }
    run.placement = PlacementConfig::new(
        args.width.unwrap_or(run.placement.width_px),
        args.height.unwrap_or(run.placement.height_px),
        args.top_margin.unwrap_or(run.placement.top_margin_px),
    );
    if args.include_cover_page {
        run.scan = ScanConfig {
            skip_cover_page: false,
        };
    }
    Ok(run)
}

fn load_index(
    roster_path: &Path,
    sink: &mut dyn DiagnosticSink,
) -> anyhow::Result<IdentityIndex> {
    let roster = Roster::load(roster_path)?;
    tracing::info!("{} person(s) in {}", roster.rows.len(), roster_path.display());
    let entries = roster.entries(sink);
    Ok(IdentityIndex::build_reported(&entries, sink))
}

fn sign(args: SignArgs) -> anyhow::Result<ExitCode> {
    let run = resolve_run(&args)?;
    let roster_path = match &run.roster {
        Some(path) => path.clone(),
        None => bail!("no roster given (use --roster or set `roster` in the config file)"),
    };
    let documents = inputs::collect_pdfs(&run.inputs)?;
    if documents.is_empty() {
        bail!("no PDF documents to process");
    }

    let mut sink = TracingSink;
    let index = load_index(&roster_path, &mut sink)
        .with_context(|| format!("cannot use roster {}", roster_path.display()))?;

    let mut processor = DocumentProcessor::new(index, run.placement)?
        .with_scan(run.scan)
        .with_output_dir(run.output_dir.clone());
    let report = processor.process_batch(&documents, &mut sink);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Processed: {}", report.processed);
        println!("Signed:    {}", report.succeeded);
        println!("Unchanged: {}", report.unmodified);
        println!("Failed:    {}", report.failed);
        if !report.outputs.is_empty() {
            println!("Generated files:");
            for output in &report.outputs {
                println!("  {}", output.display());
            }
        }
    }

    if report.any_signed() {
        println!("Completed");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("No document was signed");
        Ok(ExitCode::from(EXIT_NOTHING_SIGNED))
    }
}

fn verify_roster(roster_path: PathBuf) -> anyhow::Result<ExitCode> {
    let roster = Roster::load(&roster_path)?;
    let mut events: Vec<Diagnostic> = Vec::new();
    let entries = roster.entries(&mut events);
    let index = IdentityIndex::build(&entries);

    for event in &events {
        println!("{}", event);
    }
    let with_phone = entries.iter().filter(|e| e.phone_digits.is_some()).count();
    let missing = entries.iter().filter(|e| !e.path_exists).count();
    println!();
    println!("People:            {}", roster.rows.len());
    println!("With signature:    {}", entries.len());
    println!("With phone:        {}", with_phone);
    println!("Phones indexed:    {}", index.phone_count());
    println!("Names registered:  {}", index.name_count());
    println!("Signature files:   {}", index.signature_count());
    println!("Missing files:     {}", missing);

    if missing > 0 {
        Ok(ExitCode::from(EXIT_NOTHING_SIGNED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
