//! gapscope CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gapscope", version, about = "Learner gap analytics engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every analysis over a dataset
    Analyze {
        /// Path to a .toml or .json dataset
        #[arg(long)]
        dataset: PathBuf,

        /// Write the JSON report to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Cluster learners by shared weak topics
    Cluster {
        /// Path to a .toml or .json dataset
        #[arg(long)]
        dataset: PathBuf,

        /// Minimum shared topics (overrides config)
        #[arg(long)]
        min_shared: Option<usize>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Fit least-squares trends to the dataset's series
    Trend {
        /// Path to a .toml or .json dataset
        #[arg(long)]
        dataset: PathBuf,

        /// Only fit the series with this id
        #[arg(long)]
        series: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score progress synchronization between learners
    Sync {
        /// Path to a .toml or .json dataset
        #[arg(long)]
        dataset: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compute a force-directed layout of the gap-overlap graph
    Layout {
        /// Path to a .toml or .json dataset
        #[arg(long)]
        dataset: PathBuf,

        /// Step budget (overrides config)
        #[arg(long)]
        steps: Option<usize>,

        /// Random seed for initial placement (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Print every intermediate step to stderr
        #[arg(long)]
        trace: bool,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate dataset files
    Validate {
        /// Path to dataset file or directory
        #[arg(long)]
        dataset: PathBuf,
    },

    /// Create starter config and example dataset
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gapscope=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            dataset,
            output,
            format,
            config,
        } => commands::analyze::execute(dataset, output, format, config),
        Commands::Cluster {
            dataset,
            min_shared,
            format,
            config,
        } => commands::cluster::execute(dataset, min_shared, format, config),
        Commands::Trend {
            dataset,
            series,
            format,
            config,
        } => commands::trend::execute(dataset, series, format, config),
        Commands::Sync {
            dataset,
            format,
            config,
        } => commands::sync::execute(dataset, format, config),
        Commands::Layout {
            dataset,
            steps,
            seed,
            trace,
            format,
            config,
        } => commands::layout::execute(dataset, steps, seed, trace, format, config),
        Commands::Validate { dataset } => commands::validate::execute(dataset),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
