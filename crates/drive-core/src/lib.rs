//! Drive Core Library
//!
//! The content gateway: operation dispatch, MIME type classification and
//! response normalization over an injected remote store transport.

// Re-export pure types from drive-types
pub use drive_types::*;

pub mod classifier;
pub mod config;
pub mod cursor;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod normalizer;
pub mod ports;
pub mod query;

pub use classifier::{classify, ContentStrategy, ExportTarget};
pub use config::GatewayConfig;
pub use error::{ErrorKind, GatewayError, Result};
pub use gateway::Gateway;
pub use memory::{MemoryDrive, MemoryFile};
pub use ports::{DriveTransport, TransportError};
