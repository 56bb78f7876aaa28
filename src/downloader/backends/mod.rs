// Upstream backends

pub mod any4k;

pub use any4k::{Any4kBackend, ClientIdentity};
