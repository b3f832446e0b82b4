mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "office2pdf",
    version,
    about = "Batch-convert Excel, Word and PowerPoint documents to PDF"
)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every document under a folder
    Convert {
        /// Folder containing Office files
        #[arg(short, long, default_value = "./input")]
        input: PathBuf,

        /// Folder the PDFs are written to
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// YAML configuration (defaults apply when omitted)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// all, or a comma list of excel, word, powerpoint
        #[arg(long, default_value = "all")]
        file_types: String,

        /// Write the batch result as JSON
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },
    /// Convert the folder groups of a scenario file
    Scenario {
        /// Scenario YAML file
        #[arg(short, long, value_name = "FILE")]
        scenario: PathBuf,

        /// List what would be converted without converting
        #[arg(long)]
        dry_run: bool,

        /// all, or a comma list of excel, word, powerpoint
        #[arg(long, default_value = "all")]
        file_types: String,

        /// Write the merged batch result as JSON
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },
    /// Show the layout each sheet of a workbook would get, without exporting
    Plan {
        /// .xlsx or .xlsm workbook
        workbook: PathBuf,

        /// YAML configuration (defaults apply when omitted)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            config,
            file_types,
            json,
        } => {
            commands::convert::run(
                &input,
                &output,
                config.as_deref(),
                &file_types,
                json.as_deref(),
            )
            .await
        }
        Commands::Scenario {
            scenario,
            dry_run,
            file_types,
            json,
        } => commands::scenario::run(&scenario, dry_run, &file_types, json.as_deref()).await,
        Commands::Plan {
            workbook,
            config,
            json,
        } => commands::plan::run(&workbook, config.as_deref(), json),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
