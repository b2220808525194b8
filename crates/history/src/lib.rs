// quire-history: file-backed version history for text documents

pub mod config;
pub mod error;
pub mod history;
pub mod lock;
pub mod store;

pub use config::{ConfigFile, HistoryConfig, PartialHistoryConfig};
pub use error::{ErrorCode, HistoryError};
pub use history::{DocumentRef, RestoreOptions, RestoreOutcome, SaveOptions, VersionHistory};
pub use lock::{LockError, LockManager, LockOptions};
pub use store::prune::PruneReport;
