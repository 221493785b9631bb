//! docscout-common: Shared types, errors, HTTP client, and settings used
//! across the docscout crates.

pub mod error;
pub mod http;
pub mod settings;
pub mod types;

// Re-export commonly used types
pub use error::{DocscoutError, Result};
pub use types::{BackendId, BackendResult};
