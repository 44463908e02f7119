mod clamscan;
mod signature;

pub use clamscan::ClamScanner;
pub use signature::{SignatureScanner, EICAR_SIGNATURE};

use crate::config::{BackendKind, ScannerConfig};
use crate::error::Result;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// What a scanning backend reports for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanVerdict {
    pub found: bool,
    /// Names of the detected threats; empty when nothing was found.
    pub description: String,
}

impl ScanVerdict {
    pub fn clean() -> Self {
        Self {
            found: false,
            description: String::new(),
        }
    }

    pub fn infected(description: impl Into<String>) -> Self {
        Self {
            found: true,
            description: description.into(),
        }
    }
}

/// An antivirus engine the tracker can hand a file path to.
///
/// Implementations return `Err` only when the engine could not produce a
/// verdict at all.
pub trait VirusScanner {
    fn name(&self) -> &str;

    fn scan_file(&self, path: &Path) -> Result<ScanVerdict>;
}

/// Backend that reports every file as clean.
#[derive(Debug, Default)]
pub struct NullScanner;

impl VirusScanner for NullScanner {
    fn name(&self) -> &str {
        "none"
    }

    fn scan_file(&self, _path: &Path) -> Result<ScanVerdict> {
        Ok(ScanVerdict::clean())
    }
}

/// Builds the backend selected by `config.backend`.
pub fn from_config(config: &ScannerConfig) -> Box<dyn VirusScanner> {
    debug!("Using '{:?}' scanner backend", config.backend);
    match config.backend {
        BackendKind::Clamscan => Box::new(ClamScanner::new(
            &config.clamscan_binary,
            config.clamscan_args.clone(),
        )),
        BackendKind::Signature => Box::new(SignatureScanner::new(&config.blocklist)),
        BackendKind::None => Box::new(NullScanner),
    }
}
