use config::{Config, ConfigError, Environment, File as ConfigFile, Source};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which scanning backend the tracker is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// ClamAV command line client (`clamdscan` or `clamscan`).
    #[default]
    Clamscan,
    /// Built-in EICAR and BLAKE3 blocklist matcher.
    Signature,
    /// Reports every file as clean.
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub backend: BackendKind,
    pub clamscan_binary: String,
    pub clamscan_args: Vec<String>,
    /// BLAKE3 hex digests of known-bad files, used by the signature backend.
    pub blocklist: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            clamscan_binary: "clamdscan".to_string(),
            clamscan_args: vec!["--no-summary".to_string()],
            blocklist: Vec::new(),
        }
    }
}

/// User-facing texts emitted by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub virus_found: String,
    pub not_exists: String,
    pub waiting: String,
    pub download: String,
    pub scan_failed: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            virus_found: "A virus was found in this file. Download is not available.".to_string(),
            not_exists: "File not found.".to_string(),
            waiting: "Checking file for viruses...".to_string(),
            download: "Download".to_string(),
            scan_failed: "The virus scan for this file could not be completed.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: String,
    pub scanner: ScannerConfig,
    pub messages: Messages,
    /// Status-check endpoint clients re-poll; `{id}` is replaced by the record id.
    pub check_url_template: String,
    pub ignore_patterns: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "scanward.db".to_string(),
            scanner: ScannerConfig::default(),
            messages: Messages::default(),
            check_url_template: "/antivirus/files/{id}/check/".to_string(),
            ignore_patterns: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn check_url(&self, file_id: i64) -> String {
        check_url_for(&self.check_url_template, file_id)
    }
}

pub fn check_url_for(template: &str, file_id: i64) -> String {
    template.replace("{id}", &file_id.to_string())
}

/// Loads `Scanward.toml` from the working directory when present, then
/// `SCANWARD__*` environment overrides (`SCANWARD__SCANNER__BACKEND=signature`).
/// List settings take comma separated values in the environment.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    build_configuration(ConfigFile::with_name("Scanward").required(false))
}

/// Same as [`load_configuration`] but with an explicit, required file.
pub fn load_configuration_from(path: &Path) -> Result<AppConfig, ConfigError> {
    build_configuration(ConfigFile::from(path).required(true))
}

fn build_configuration<S>(file: S) -> Result<AppConfig, ConfigError>
where
    S: Source + Send + Sync + 'static,
{
    let builder = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("SCANWARD")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("scanner.clamscan_args")
                .with_list_parse_key("scanner.blocklist")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
