//! Uniform byte-stream access over a local directory or a cloud object container.

pub mod cloud;
pub mod local;

use std::io::Read;

pub use cloud::CloudBlobSource;
pub use local::LocalBlobSource;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("blob transport failure: {0}")]
    Transport(String),
}

/// One read-only entry point over a flat bag of named files. Implementations
/// never retry; that decision belongs to the caller.
pub trait BlobSource: Send + Sync {
    fn exists(&self, name: &str) -> bool;

    fn open(&self, name: &str) -> Result<Box<dyn Read + Send>, BlobError>;
}

/// The runtime-selected source, built once at startup from `Config`.
pub enum AnyBlobSource {
    Local(LocalBlobSource),
    Cloud(CloudBlobSource),
}

impl BlobSource for AnyBlobSource {
    fn exists(&self, name: &str) -> bool {
        match self {
            AnyBlobSource::Local(s) => s.exists(name),
            AnyBlobSource::Cloud(s) => s.exists(name),
        }
    }

    fn open(&self, name: &str) -> Result<Box<dyn Read + Send>, BlobError> {
        match self {
            AnyBlobSource::Local(s) => s.open(name),
            AnyBlobSource::Cloud(s) => s.open(name),
        }
    }
}
