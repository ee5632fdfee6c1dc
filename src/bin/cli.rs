//! nvscell CLI
//!
//! Inspect and modify a file-backed partition image.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use nvscell::init::initialize_with;
use nvscell::log::{self, LogLevel, TracingSink};
use nvscell::store::{FilePartition, Partition};
use nvscell::{Config, NvsError, NvsStringValue, UpdateResult};
use tracing_subscriber::{fmt, EnvFilter};

/// nvscell CLI
#[derive(Parser, Debug)]
#[command(name = "nvscell-cli")]
#[command(about = "Inspect and modify an nvscell partition image")]
#[command(version)]
struct Args {
    /// Partition image file
    #[arg(short, long, default_value = "./nvs.img")]
    image: String,

    /// Namespace to operate on
    #[arg(short, long, default_value = "storage")]
    namespace: String,

    /// Partition capacity in bytes
    #[arg(short, long, default_value = "24576")]
    capacity: usize,

    /// Shim log level (critical, error, warning, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Fail instead of erasing a corrupted image
    #[arg(long)]
    no_reinit: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the value stored under a key
    Get {
        /// The key to read
        key: String,
    },

    /// Store a text value under a key
    Set {
        /// The key to write
        key: String,

        /// The value to write
        value: String,
    },

    /// Remove a key
    Erase {
        /// The key to remove
        key: String,
    },

    /// List keys and blob sizes of the namespace
    List,

    /// Print namespaces and space usage
    Info,

    /// Erase the whole partition
    EraseAll,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nvscell=trace"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode, NvsError> {
    let level: LogLevel = args.log_level.parse()?;

    let config = Config::builder()
        .image_path(&args.image)
        .capacity(args.capacity)
        .allow_reinit(!args.no_reinit)
        .log_level(level)
        .build();

    config.apply_log_level();
    log::set_sink(Arc::new(TracingSink));

    let partition = FilePartition::open(&config);
    let open = || initialize_with(&partition, &config, &args.namespace);

    let result = match args.command {
        Commands::Get { key } => {
            let cell = NvsStringValue::new(open()?, key);
            if cell.exists() {
                println!("{}", cell.to_string_lossy());
            } else {
                println!("(not set)");
            }
            UpdateResult::Unchanged
        }
        Commands::Set { key, value } => {
            let mut cell = NvsStringValue::new(open()?, key);
            let result = cell.set(&value);
            println!("{}", result);
            result
        }
        Commands::Erase { key } => {
            let mut cell = NvsStringValue::new(open()?, key);
            let result = cell.erase();
            println!("{}", result);
            result
        }
        Commands::List => {
            open()?;
            let entries = partition
                .entries(&args.namespace)
                .map_err(|e| NvsError::OpenNamespace {
                    namespace: args.namespace.clone(),
                    source: e,
                })?;
            for (key, size) in entries {
                println!("{:<16} {:>6} bytes", key, size);
            }
            UpdateResult::Unchanged
        }
        Commands::Info => {
            open()?;
            let namespaces = partition.namespaces().map_err(|e| NvsError::Init { source: e })?;
            let used = partition.used().map_err(|e| NvsError::Init { source: e })?;
            println!("image:      {}", partition.path().display());
            println!("namespaces: {}", namespaces.join(", "));
            println!("used:       {} / {} bytes", used, partition.capacity());
            UpdateResult::Unchanged
        }
        Commands::EraseAll => {
            partition
                .erase_all()
                .map_err(|e| NvsError::Init { source: e })?;
            println!("Erased {}", partition.path().display());
            UpdateResult::Updated
        }
    };

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
