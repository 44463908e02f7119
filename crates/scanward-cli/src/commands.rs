use clap::{Parser, Subcommand, ValueEnum};
use scanward_core::{FileStatus, OwnerRef};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "scanward")]
#[command(about = "Tracks uploaded files and their antivirus scan status", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./Scanward.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured tracking database path
    #[arg(long, global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Html,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Register a file (no scan); prints its tracking record
    Track {
        path: String,
        /// Owning entity as TYPE:ID, e.g. attachment:42
        #[arg(long, value_parser = parse_owner)]
        owner: Option<OwnerRef>,
        /// Public download URL cached with the record
        #[arg(long)]
        url: Option<String>,
    },
    /// Register every file below a directory, honouring ignore_patterns
    TrackDir {
        dir: PathBuf,
        #[arg(long, value_parser = parse_owner)]
        owner: Option<OwnerRef>,
        /// Download URLs become <PREFIX>/<relative path>
        #[arg(long)]
        url_prefix: Option<String>,
    },
    /// Scan a tracked file by id and print the refreshed outcome
    Check {
        id: i64,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show the scan job state of a tracked file without scanning
    Status {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Resolve what to show for an owner's attached file
    Render {
        path: String,
        url: String,
        #[arg(long, value_parser = parse_owner)]
        owner: OwnerRef,
        #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
        format: OutputFormat,
    },
    /// List tracked files
    List {
        /// Only files in this status (name or code)
        #[arg(long, value_parser = parse_status)]
        status: Option<FileStatus>,
        /// Only files attached to TYPE:ID
        #[arg(long, value_parser = parse_owner)]
        owner: Option<OwnerRef>,
        #[arg(long, conflicts_with = "json")]
        csv: bool,
        #[arg(long)]
        json: bool,
    },
    /// Print configuration values
    PrintConfig,
    /// Delete all tracking records
    TruncateDb,
}

fn parse_owner(value: &str) -> Result<OwnerRef, String> {
    let (entity_type, entity_id) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected TYPE:ID, got '{}'", value))?;
    if entity_type.is_empty() {
        return Err(format!("missing entity type in '{}'", value));
    }
    let entity_id = entity_id
        .parse::<i64>()
        .map_err(|e| format!("invalid entity id '{}': {}", entity_id, e))?;
    Ok(OwnerRef::new(entity_type, entity_id))
}

fn parse_status(value: &str) -> Result<FileStatus, String> {
    value.parse::<FileStatus>().map_err(|e| e.to_string())
}
