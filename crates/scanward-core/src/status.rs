use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scan status of a tracked file.
///
/// The integer codes are what the store persists and must stay stable:
/// non-negative codes mean the file may be offered for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Known but not scanned yet.
    Standing,
    VirusNotFound,
    VirusFound,
    /// The file was missing from storage at the last existence check.
    NotExists,
    /// The scanner itself errored on the last attempt.
    ScanFailed,
}

impl FileStatus {
    pub const ALL: [FileStatus; 5] = [
        FileStatus::Standing,
        FileStatus::VirusNotFound,
        FileStatus::VirusFound,
        FileStatus::NotExists,
        FileStatus::ScanFailed,
    ];

    pub fn code(self) -> i64 {
        match self {
            FileStatus::Standing => 0,
            FileStatus::VirusNotFound => 1,
            FileStatus::VirusFound => -1,
            FileStatus::NotExists => -2,
            FileStatus::ScanFailed => -3,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, Error> {
        match code {
            0 => Ok(FileStatus::Standing),
            1 => Ok(FileStatus::VirusNotFound),
            -1 => Ok(FileStatus::VirusFound),
            -2 => Ok(FileStatus::NotExists),
            -3 => Ok(FileStatus::ScanFailed),
            other => Err(Error::InvalidStatus(other)),
        }
    }

    /// Human readable label, as shown in listings.
    pub fn label(self) -> &'static str {
        match self {
            FileStatus::Standing => "Standing",
            FileStatus::VirusNotFound => "Virus not found",
            FileStatus::VirusFound => "Virus found",
            FileStatus::NotExists => "Not exists",
            FileStatus::ScanFailed => "Scan failed",
        }
    }

    /// True while a scan is still owed for the file.
    pub fn is_pending(self) -> bool {
        self == FileStatus::Standing
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FileStatus {
    type Err = Error;

    /// Accepts the snake_case name or the integer code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "standing" => Ok(FileStatus::Standing),
            "virus_not_found" | "clean" => Ok(FileStatus::VirusNotFound),
            "virus_found" | "infected" => Ok(FileStatus::VirusFound),
            "not_exists" | "missing" => Ok(FileStatus::NotExists),
            "scan_failed" | "failed" => Ok(FileStatus::ScanFailed),
            _ => s
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::Other(format!("Unknown file status '{}'", s)))
                .and_then(FileStatus::from_code),
        }
    }
}
