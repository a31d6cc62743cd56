mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use blankform_core::config::EngineConfig;
use blankform_core::error::FormError;
use blankform_core::reconcile::Strategy;

#[derive(Parser)]
#[command(
    name = "blankform",
    version,
    about = "Find the blanks in a static document, fill them in, and write them back"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file merged over the built-in configuration
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize a document (JSON model or plain text) into text and fields
    Extract {
        /// Path to a .json document model or a .txt file
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the extraction as JSON to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Print each line with its fields marked inline
        #[arg(long)]
        annotated: bool,
    },
    /// Locate fields and their boxes on the pages of a PDF (or JSON model with pages)
    Locate {
        /// Path to a PDF or a .json document model with glyph pages
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Process pages one after another instead of in parallel
        #[arg(long)]
        sequential: bool,
    },
    /// Write edited values back into a copy of the document
    Fill {
        /// Path to a .json document model or a .txt file
        input_file: PathBuf,

        /// JSON file with the edited values
        #[arg(long, value_name = "FILE")]
        values: PathBuf,

        /// How values are matched to fields (default from configuration)
        #[arg(short, long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Folder for the filled copy (default: "filled" beside the input)
        #[arg(long = "out-dir", value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Write a copy of the document with every field emptied
    Clear {
        /// Path to a .json document model or a .txt file
        input_file: PathBuf,

        /// Folder for the cleared copy (default: "filled" beside the input)
        #[arg(long = "out-dir", value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Positional,
    Marker,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Positional => Strategy::Positional,
            StrategyArg::Marker => Strategy::MarkerToken,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), FormError> {
    let config = EngineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            input_file,
            output,
            out,
            annotated,
        } => commands::extract::run(input_file, &config, &output, out, annotated),
        Commands::Locate {
            input_file,
            output,
            sequential,
        } => commands::locate::run(input_file, &config, &output, sequential),
        Commands::Fill {
            input_file,
            values,
            strategy,
            out_dir,
        } => {
            let strategy = strategy.map(Strategy::from).unwrap_or(config.reconcile.strategy);
            commands::fill::run(input_file, &values, strategy, out_dir, &config)
        }
        Commands::Clear {
            input_file,
            out_dir,
        } => commands::clear::run(input_file, out_dir, &config),
        Commands::Config => commands::config::print(&config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
