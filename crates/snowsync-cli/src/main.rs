//! `snowsync` - plan warehouse schemas from entity descriptions

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use snowsync_cli::logging::{self, LogFormat, LoggingConfig};
use snowsync_cli::{
    CliConfig, describe_connection, load_entities, normalize_identifiers, plan_statements,
};

#[derive(Parser)]
#[command(name = "snowsync")]
#[command(about = "Schema synchronization for the Snowflake warehouse")]
#[command(version)]
struct Cli {
    /// Path to the configuration file [default: snowsync.toml if present]
    #[arg(short, long, env = "SNOWSYNC_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the CREATE TABLE statements a sync would issue against an
    /// empty database
    Plan {
        /// Entity descriptions (.toml or .json)
        schema_file: PathBuf,
    },

    /// Print warehouse names for source identifiers
    Name {
        /// Normalize as column names instead of table names
        #[arg(long)]
        column: bool,

        #[arg(required = true)]
        identifiers: Vec<String>,
    },

    /// Validate the configured connection settings without connecting
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&LoggingConfig::from_verbosity(cli.verbose, cli.log_format)) {
        eprintln!("warning: failed to initialize logging: {:#}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Plan { schema_file } => {
            let entities = load_entities(&schema_file)?;
            for statement in plan_statements(&entities, &config.migrator)? {
                println!("{};", statement);
            }
        }
        Commands::Name {
            column,
            identifiers,
        } => {
            for name in normalize_identifiers(&identifiers, column) {
                println!("{}", name);
            }
        }
        Commands::Check => {
            let check = config.connection.check()?;
            println!("{}", describe_connection(&check));
        }
    }
    Ok(())
}
