pub mod config;
pub mod error;
pub mod fs;
pub mod progress;
pub mod resolver;
pub mod scanner;
pub mod status;
pub mod storage;
pub mod tracker;

pub use config::{AppConfig, Messages};
pub use error::{Error, Result};
pub use progress::{ProgressReporter, SilentReporter};
pub use resolver::{resolve, Outcome};
pub use scanner::{ScanVerdict, VirusScanner};
pub use status::FileStatus;
pub use storage::models::{OwnerRef, TrackedFile};
pub use storage::FileStore;
pub use tracker::{AttachedFile, ScanJob, Tracker};
