use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "porydex-db")]
#[command(version, about = "Load the Pokémon reference dataset into SQLite and query it")]
pub struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true, env = "PORYDEX_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Table filters shared by `load` and `sync`
#[derive(Args, Debug, Clone, Default)]
pub struct TableFilter {
    /// Only include these tables and their parents (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub include: Option<Vec<String>>,

    /// Exclude these tables and everything depending on them (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Show a full-screen progress display instead of log lines
    #[arg(long)]
    pub tui: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a dataset directory or .zip archive into a new SQLite database
    Load {
        /// Directory of JSONL files, or a .zip archive of them
        input: PathBuf,

        /// Output SQLite database path
        output_db: PathBuf,

        #[command(flatten)]
        filter: TableFilter,
    },

    /// Download and extract a dataset archive into the cache
    Fetch {
        /// Archive URL
        #[arg(long)]
        url: String,

        /// Cache directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force re-download even if cached
        #[arg(short, long)]
        force: bool,
    },

    /// Fetch (if needed) and load into SQLite
    Sync {
        /// Archive URL
        #[arg(long)]
        url: String,

        /// Output SQLite database path
        output_db: PathBuf,

        #[command(flatten)]
        filter: TableFilter,

        /// Force re-download even if cached
        #[arg(short, long)]
        force: bool,

        /// Cache directory (overrides config)
        #[arg(short, long)]
        cache_dir: Option<PathBuf>,
    },

    /// List all table names in load order
    ListTables,

    /// Print the generated DDL
    Schema {
        /// Only this table
        table: Option<String>,
    },

    /// Check load-time invariants of an existing database
    Validate {
        db: PathBuf,
    },

    /// Show the types of a form
    Types {
        db: PathBuf,

        /// Form identifier, e.g. "rotom-heat"
        form: String,

        /// Resolve in this generation instead of the form's latest
        #[arg(short, long)]
        generation: Option<i64>,

        /// Print the types of every generation the form appeared in
        #[arg(long)]
        history: bool,
    },

    /// List forms with their current types and names
    Forms {
        db: PathBuf,

        /// Resolve types in this generation
        #[arg(short, long)]
        generation: Option<i64>,

        /// Language identifier for names, e.g. "ja"
        #[arg(short, long)]
        language: Option<String>,

        /// Only forms of this species id
        #[arg(short, long)]
        pokemon: Option<i64>,

        /// Skip forms absent from the resolved generation
        #[arg(long)]
        existing_only: bool,

        /// Print JSON lines instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
