//! Core services for scanning, metadata resolution, and conflict handling

pub mod conflicts;
pub mod filename_parser;
pub mod progress;
pub mod rate_limiter;
pub mod scanner;
pub mod tmdb;
pub mod walker;

pub use conflicts::ConflictService;
pub use progress::{BroadcastSink, NullSink, ProgressSink, ScanProgress, ScanStatus, ScanSummary};
pub use scanner::{CatalogStore, MetadataResolver, ScannerService};
pub use tmdb::TmdbClient;
