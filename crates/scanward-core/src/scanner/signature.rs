use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

use super::{ScanVerdict, VirusScanner};
use crate::error::{Error, Result};

/// The standard antivirus test string.
pub const EICAR_SIGNATURE: &[u8] =
    b"X5O!P%@AP[4\\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

/// EICAR files may carry trailing whitespace up to this length.
const EICAR_MAX_LEN: usize = 128;

/// Detects the EICAR test file and files whose BLAKE3 digest is blocklisted.
#[derive(Debug, Clone, Default)]
pub struct SignatureScanner {
    blocklist: HashSet<String>,
}

impl SignatureScanner {
    pub fn new(blocklist: &[String]) -> Self {
        Self {
            blocklist: blocklist.iter().map(|h| h.trim().to_lowercase()).collect(),
        }
    }

    fn failure(&self, path: &Path, err: io::Error) -> Error {
        Error::Scanner {
            backend: self.name().to_string(),
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

fn is_eicar(head: &[u8]) -> bool {
    head.starts_with(EICAR_SIGNATURE)
        && head[EICAR_SIGNATURE.len()..]
            .iter()
            .all(|b| b.is_ascii_whitespace())
}

impl VirusScanner for SignatureScanner {
    fn name(&self) -> &str {
        "signature"
    }

    fn scan_file(&self, path: &Path) -> Result<ScanVerdict> {
        let mut file = File::open(path).map_err(|e| self.failure(path, e))?;

        let mut head = Vec::with_capacity(EICAR_MAX_LEN + 1);
        (&mut file)
            .take(EICAR_MAX_LEN as u64 + 1)
            .read_to_end(&mut head)
            .map_err(|e| self.failure(path, e))?;
        if head.len() <= EICAR_MAX_LEN && is_eicar(&head) {
            return Ok(ScanVerdict::infected("Eicar-Test-Signature"));
        }

        if self.blocklist.is_empty() {
            return Ok(ScanVerdict::clean());
        }

        let mut hasher = blake3::Hasher::new();
        hasher.update(&head);
        io::copy(&mut file, &mut hasher).map_err(|e| self.failure(path, e))?;
        let digest = hasher.finalize().to_hex().to_string();
        debug!("BLAKE3 {} for {}", digest, path.display());

        if self.blocklist.contains(&digest) {
            Ok(ScanVerdict::infected(format!("Blocklisted.{}", &digest[..16])))
        } else {
            Ok(ScanVerdict::clean())
        }
    }
}
