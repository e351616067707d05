// RosterKit CLI - headless cleaning sessions over student-record files

mod generate;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::error;
use rosterkit_classify::FieldClassifier;
use rosterkit_guard::{GuardConfig, MemoryGuard};
use rosterkit_io::export::export_table;
use rosterkit_io::SafeIngestor;
use rosterkit_session::{CleaningSession, SessionConfig};

use generate::{generate_roster, GeneratorConfig};

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_USAGE: u8 = 2;

#[derive(Parser)]
#[command(name = "rosterkit")]
#[command(about = "Crash-resistant duplicate detection for student-record files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full cleaning session: ingest, classify, detect, export
    #[command(after_help = "\
Examples:
  rosterkit clean roster.xlsx
  rosterkit clean roster.csv -o clean.csv -d dupes.xlsx --fuzzy --threshold 85
  rosterkit clean roster.csv --config session.toml --stats-json")]
    Clean(CleanArgs),

    /// Classify a file's columns and print the field mapping as JSON
    Map {
        /// Source file (csv, tsv, txt, xlsx, xls)
        input: PathBuf,
    },

    /// Generate a synthetic roster with injected duplicates
    Generate {
        /// Destination file (extension selects csv/tsv/xlsx)
        output: PathBuf,

        /// Base records before duplicate injection
        #[arg(long, default_value_t = 1000)]
        rows: usize,

        /// Fraction of base records duplicated and appended
        #[arg(long, default_value_t = 0.15)]
        duplicate_rate: f64,

        /// RNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(Args)]
struct CleanArgs {
    /// Source file (csv, tsv, txt, xlsx, xls)
    input: PathBuf,

    /// Destination for the clean partition
    #[arg(long, short = 'o', default_value = "clean.csv")]
    clean: PathBuf,

    /// Destination for the duplicate partition
    #[arg(long, short = 'd', default_value = "duplicates.csv")]
    duplicates: PathBuf,

    /// Session config TOML (flags below override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use fuzzy name matching within (dob, year) groups
    #[arg(long)]
    fuzzy: bool,

    /// Fuzzy similarity threshold (50-100)
    #[arg(long)]
    threshold: Option<u8>,

    /// Records per processing chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Skip header classification; identity columns must match the source
    /// header verbatim
    #[arg(long)]
    no_classify: bool,

    /// Run the background memory guard for the session
    #[arg(long)]
    guard: bool,

    /// Print the run stats as JSON on stdout
    #[arg(long)]
    stats_json: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Clean(args) => run_clean(&args),
        Commands::Map { input } => run_map(&input),
        Commands::Generate { output, rows, duplicate_rate, seed } => {
            run_generate(&output, rows, duplicate_rate, seed)
        }
    };
    ExitCode::from(code)
}

fn load_session_config(args: &CleanArgs) -> Result<SessionConfig, u8> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                eprintln!("error: cannot read config {}: {e}", path.display());
                EXIT_USAGE
            })?;
            SessionConfig::from_toml(&raw).map_err(|e| {
                eprintln!("error: {e}");
                EXIT_USAGE
            })?
        }
        None => SessionConfig::default(),
    };

    if args.fuzzy {
        config.dedupe.fuzzy_match = true;
    }
    if let Some(threshold) = args.threshold {
        config.dedupe.fuzzy_threshold = threshold;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.dedupe.chunk_size = chunk_size;
    }
    if args.no_classify {
        config.auto_classify = false;
    }
    Ok(config)
}

fn run_clean(args: &CleanArgs) -> u8 {
    let config = match load_session_config(args) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let memory_guard = args.guard.then(|| MemoryGuard::start(GuardConfig::default()));
    let code = run_clean_session(args, config);
    if let Some(guard) = memory_guard {
        guard.stop();
    }
    code
}

fn run_clean_session(args: &CleanArgs, config: SessionConfig) -> u8 {
    let mut session = match CleaningSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_USAGE;
        }
    };

    let run = session.run(&args.input, &mut |percent, message| {
        if percent >= 0 {
            eprintln!("[{percent:>3}%] {message}");
        } else {
            eprintln!("[ ...] {message}");
        }
    });
    if let Err(e) = run {
        let (message, detail) = e.split();
        eprintln!("error: {message}");
        if let Some(detail) = detail {
            error!("detail: {detail}");
        }
        return EXIT_ERROR;
    }

    if let Err(e) = session.export(&args.clean, &args.duplicates) {
        eprintln!("error: {e}");
        return EXIT_ERROR;
    }

    if let Some(stats) = session.stats() {
        if args.stats_json {
            match serde_json::to_string_pretty(stats) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("error: cannot serialize stats: {e}"),
            }
        } else {
            eprintln!(
                "done: {} records, {} clean, {} duplicate ({}%)",
                stats.total, stats.clean, stats.duplicate, stats.duplicate_percentage
            );
        }
    }

    session.clear();
    EXIT_SUCCESS
}

fn run_map(input: &Path) -> u8 {
    let ingestor = SafeIngestor::new(10_000);
    let outcome = match ingestor.ingest(input, &mut |_, _| {}) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_ERROR;
        }
    };

    let mapping = FieldClassifier::new().classify(&outcome.preview);
    let mut mapped = serde_json::Map::new();
    let mut unmapped = Vec::new();
    for header in &outcome.preview.header {
        match mapping.get(header) {
            Some(field) => {
                mapped.insert(header.clone(), serde_json::Value::String(field.to_string()));
            }
            None => unmapped.push(serde_json::Value::String(header.clone())),
        }
    }
    let report = serde_json::json!({
        "mapped": serde_json::Value::Object(mapped),
        "unmapped": serde_json::Value::Array(unmapped),
    });
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: cannot serialize mapping: {e}"),
    }

    // The mapping pass has no further use for the conversion artifact.
    if let Some(stream) = outcome.stream {
        stream.release();
    }
    EXIT_SUCCESS
}

fn run_generate(output: &Path, rows: usize, duplicate_rate: f64, seed: u64) -> u8 {
    if !(0.0..=1.0).contains(&duplicate_rate) {
        eprintln!("error: duplicate-rate must be in 0.0..=1.0");
        return EXIT_USAGE;
    }

    let table = generate_roster(&GeneratorConfig { rows, duplicate_rate, seed });
    match export_table(&table, output) {
        Ok(()) => {
            eprintln!("wrote {} records to {}", table.len(), output.display());
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            EXIT_ERROR
        }
    }
}
