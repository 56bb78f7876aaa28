// Downloader module - metadata normalization, format selection, fallback download, relay

pub mod backends;
pub mod emitter;
pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod traits;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{RelayError, UpstreamError};
pub use models::{FormatCatalog, FormatDescriptor, MediaKind, MediaReference, NetworkConfig, QualityPolicy};
pub use orchestrator::Orchestrator;
pub use traits::UpstreamBackend;
