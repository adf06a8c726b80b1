// ResortDesk CLI - bulk import of supplier price lists into the product catalog

mod catalog;
mod exit_codes;
mod import;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use resortdesk_config::{ConfigError, Settings};
use resortdesk_recon::ImportError;
use resortdesk_store::{SqliteCatalog, StoreError};

use catalog::CatalogCommands;
use exit_codes::{
    EXIT_CATALOG, EXIT_CONFIG, EXIT_ERROR, EXIT_FILE_PARSE, EXIT_MAPPING, EXIT_SUCCESS, EXIT_USAGE,
};
use import::ImportCommands;

/// Log filter variable; overrides `-v`.
const LOG_ENV: &str = "RDESK_LOG";

#[derive(Parser)]
#[command(name = "rdesk")]
#[command(about = "Import product price lists into the ResortDesk catalog")]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/resortdesk/settings.toml, or $RDESK_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Catalog database, overriding the settings file
    #[arg(long, global = true, env = "RDESK_DB", value_name = "PATH")]
    db: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map, preview and apply a supplier price list
    #[command(subcommand)]
    Import(ImportCommands),

    /// Inspect and maintain the product catalog
    #[command(subcommand)]
    Catalog(CatalogCommands),
}

/// Resolved settings shared by every command.
pub struct Context {
    pub settings: Settings,
}

impl Context {
    pub fn open_catalog(&self) -> Result<SqliteCatalog, CliError> {
        tracing::debug!(path = %self.settings.database.display(), "opening catalog");
        SqliteCatalog::open(&self.settings.database).map_err(|e| {
            CliError::store(e).with_hint(format!(
                "catalog database: {} (set with --db or RDESK_DB)",
                self.settings.database.display()
            ))
        })
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    // stdout is reserved for command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = Settings::load(cli.config.as_deref())
        .map_err(CliError::config)
        .and_then(|settings| {
            let ctx = Context { settings: settings.with_database(cli.db) };
            match cli.command {
                Commands::Import(cmd) => import::cmd_import(cmd, &ctx),
                Commands::Catalog(cmd) => catalog::cmd_catalog(cmd, &ctx),
            }
        });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn config(err: ConfigError) -> Self {
        Self::new(EXIT_CONFIG, err.to_string())
            .with_hint("pass --config <path> or fix the settings file")
    }

    pub fn store(err: StoreError) -> Self {
        Self::new(EXIT_CATALOG, err.to_string())
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ImportError> for CliError {
    fn from(err: ImportError) -> Self {
        match &err {
            ImportError::FileParse(_) => Self::new(EXIT_FILE_PARSE, err.to_string()),
            ImportError::Mapping(_) => Self::new(EXIT_MAPPING, err.to_string())
                .with_hint("choose columns with --name-col, --purchase-col, --sale-col"),
            ImportError::Catalog(_) => Self::new(EXIT_CATALOG, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use resortdesk_recon::MappingError;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn import_errors_map_to_registry_codes() {
        let parse: CliError = ImportError::FileParse("empty".into()).into();
        assert_eq!(parse.code, EXIT_FILE_PARSE);

        let mapping: CliError = ImportError::Mapping(MappingError::MissingNameColumn).into();
        assert_eq!(mapping.code, EXIT_MAPPING);
        assert!(mapping.hint.is_some());
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["rdesk", "-vv", "catalog", "list"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
