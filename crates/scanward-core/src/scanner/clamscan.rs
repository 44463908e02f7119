use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::{ScanVerdict, VirusScanner};
use crate::error::{Error, Result};

/// Runs a ClamAV command line client against a single file.
///
/// Exit status 0 means clean, 1 means a signature matched; anything else
/// is an engine error.
#[derive(Debug, Clone)]
pub struct ClamScanner {
    binary: String,
    args: Vec<String>,
}

impl ClamScanner {
    pub fn new(binary: &str, args: Vec<String>) -> Self {
        Self {
            binary: binary.to_string(),
            args,
        }
    }

    fn failure(&self, path: &Path, message: impl Into<String>) -> Error {
        Error::Scanner {
            backend: self.name().to_string(),
            path: path.display().to_string(),
            message: message.into(),
        }
    }
}

impl VirusScanner for ClamScanner {
    fn name(&self) -> &str {
        "clamscan"
    }

    fn scan_file(&self, path: &Path) -> Result<ScanVerdict> {
        debug!("Running {} {:?} on {}", self.binary, self.args, path.display());
        let output = Command::new(&self.binary)
            .args(&self.args)
            .arg(scan_target(path))
            .output()
            .map_err(|e| self.failure(path, format!("could not run {}: {}", self.binary, e)))?;

        match output.status.code() {
            Some(0) => Ok(ScanVerdict::clean()),
            Some(1) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let signatures = parse_found_signatures(&stdout);
                if signatures.is_empty() {
                    Ok(ScanVerdict::infected("Unknown threat"))
                } else {
                    Ok(ScanVerdict::infected(signatures.join(", ")))
                }
            }
            code => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let reason = match code {
                    Some(code) => format!("exit status {}", code),
                    None => "terminated by signal".to_string(),
                };
                Err(self.failure(path, format!("{}: {}", reason, stderr.trim())))
            }
        }
    }
}

/// Relative paths are anchored at `./` so a leading `-` is never read as an option.
fn scan_target(path: &Path) -> PathBuf {
    if path.is_relative() {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

/// Extracts signature names from `<path>: <signature> FOUND` lines.
fn parse_found_signatures(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim_end().strip_suffix(" FOUND"))
        .filter_map(|line| line.rsplit_once(": ").map(|(_, sig)| sig.trim().to_string()))
        .filter(|sig| !sig.is_empty())
        .collect()
}
