//! Maps a file's scan status to what the end user gets to see.

use serde::Serialize;
use std::fmt;

use crate::config::AppConfig;
use crate::status::FileStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    VirusFound {
        message: String,
    },
    NotExists {
        message: String,
    },
    /// Not scanned yet. Clients re-query `check_url` until the status settles.
    Waiting {
        message: String,
        file_id: i64,
        check_url: String,
    },
    Download {
        url: String,
        label: String,
    },
    ScanFailed {
        message: String,
    },
}

/// Resolves `status` to an outcome. Never scans.
pub fn resolve(status: FileStatus, file_id: i64, file_url: &str, config: &AppConfig) -> Outcome {
    let messages = &config.messages;
    match status {
        FileStatus::VirusFound => Outcome::VirusFound {
            message: messages.virus_found.clone(),
        },
        FileStatus::NotExists => Outcome::NotExists {
            message: messages.not_exists.clone(),
        },
        FileStatus::ScanFailed => Outcome::ScanFailed {
            message: messages.scan_failed.clone(),
        },
        FileStatus::Standing => Outcome::Waiting {
            message: messages.waiting.clone(),
            file_id,
            check_url: config.check_url(file_id),
        },
        FileStatus::VirusNotFound => Outcome::Download {
            url: file_url.to_string(),
            label: messages.download.clone(),
        },
    }
}

impl Outcome {
    pub fn allows_download(&self) -> bool {
        matches!(self, Outcome::Download { .. })
    }

    /// Markup fragment for embedding next to the file reference.
    pub fn to_html(&self) -> String {
        match self {
            Outcome::VirusFound { message }
            | Outcome::NotExists { message }
            | Outcome::ScanFailed { message } => escape_html(message),
            Outcome::Waiting {
                message,
                file_id,
                check_url,
            } => format!(
                r#"<span class="scanward-waiting" data-file-id="{}" data-check-url="{}">{}</span>"#,
                file_id,
                escape_html(check_url),
                escape_html(message)
            ),
            Outcome::Download { url, label } => {
                format!(r#"<a href="{}">{}</a>"#, escape_html(url), escape_html(label))
            }
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::VirusFound { message }
            | Outcome::NotExists { message }
            | Outcome::ScanFailed { message } => f.write_str(message),
            Outcome::Waiting {
                message, check_url, ..
            } => write!(f, "{} (poll {})", message, check_url),
            Outcome::Download { url, label } => write!(f, "{}: {}", label, url),
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
