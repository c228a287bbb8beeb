use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gcode_reorder::config::Config;
use gcode_reorder::convert::{BackupOutcome, ConvertOptions, Converter};
use gcode_reorder::reports::InspectReport;

#[derive(Parser)]
#[command(name = "gcode-reorder")]
#[command(
    about = "Reorder OrcaSlicer G-code into the Orca-FlashForge layout",
    long_about = None
)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// G-code file to convert in place (post-processing script mode)
    file: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Summary,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a G-code file in place
    Convert {
        /// Path to the G-code file
        file: PathBuf,

        /// Do not write a backup copy before overwriting
        #[arg(long)]
        no_backup: bool,

        /// Print the restructured document instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show how a G-code file would be classified without changing it
    Inspect {
        /// Path to the G-code file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },
}

impl Cli {
    /// Parse the command line. A lone argument naming an existing file is
    /// always the file to convert, even when it is called `convert` or
    /// `inspect`.
    fn from_args(args: Vec<OsString>) -> Self {
        if let [_, only] = args.as_slice() {
            let path = Path::new(only);
            if path.is_file() {
                return Self {
                    file: Some(path.to_path_buf()),
                    config: None,
                    command: None,
                };
            }
        }
        Self::parse_from(args)
    }
}

fn main() -> ExitCode {
    let cli = Cli::from_args(std::env::args_os().collect());

    let (config, config_warnings) = Config::load(cli.config.as_deref());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    for warning in &config_warnings {
        tracing::warn!("{warning}");
    }

    match cli.command {
        Some(Commands::Convert {
            file,
            no_backup,
            dry_run,
        }) => {
            let mut options = ConvertOptions::from(&config);
            options.backup &= !no_backup;
            options.dry_run = dry_run;
            run_convert(&file, options)
        }
        Some(Commands::Inspect { file, output }) => run_inspect(&file, output),
        None => match cli.file {
            Some(file) => run_convert(&file, ConvertOptions::from(&config)),
            None => {
                eprintln!("Usage: gcode-reorder <gcode_file>");
                ExitCode::FAILURE
            }
        },
    }
}

fn run_convert(file: &Path, options: ConvertOptions) -> ExitCode {
    let dry_run = options.dry_run;
    if !dry_run {
        println!("Converting G-code format: {}", file.display());
    }

    let converter = Converter::new(options);
    let report = match converter.convert(file) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match &report.backup {
        BackupOutcome::Created(path) => println!("Backup created: {}", path.display()),
        BackupOutcome::Failed { reason, .. } => {
            eprintln!("Warning: Could not create backup: {reason}")
        }
        BackupOutcome::Skipped => {}
    }

    if report.stats.discarded_metadata > 0 {
        tracing::info!(
            "Dropped {} trailing lines that were not metadata",
            report.stats.discarded_metadata
        );
    }

    if dry_run {
        print!("{}", report.output);
    } else {
        println!(
            "Successfully converted {} to Orca-FlashForge format",
            file.display()
        );
        println!("ETA and metadata should now be properly displayed on FlashForge printer and API");
    }

    ExitCode::SUCCESS
}

fn run_inspect(file: &Path, output: OutputFormat) -> ExitCode {
    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file {}: {e}", file.display());
            return ExitCode::FAILURE;
        }
    };

    let report = InspectReport::build(file, &content);

    match output {
        OutputFormat::Json => match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize report: {e}");
                return ExitCode::FAILURE;
            }
        },
        OutputFormat::Markdown => println!("{}", report.to_markdown()),
        OutputFormat::Summary => println!("{}", report.to_summary()),
    }

    ExitCode::SUCCESS
}
