//! Environment-driven configuration.

use std::path::PathBuf;

use crate::blob::cloud::ChainedCredential;
use crate::blob::{AnyBlobSource, CloudBlobSource, LocalBlobSource};

pub struct Config {
    pub port: u16,
    pub blob_source: BlobSourceConfig,
}

pub enum BlobSourceConfig {
    Local { root: PathBuf },
    Cloud { account: String, container: String },
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let cloud_requested = std::env::var("GTFS_CLOUD")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let blob_source = if cloud_requested {
            let account = std::env::var("GTFS_CLOUD_ACCOUNT")
                .map_err(|_| anyhow::anyhow!("GTFS_CLOUD_ACCOUNT is required in cloud mode"))?;
            let container = std::env::var("GTFS_CLOUD_CONTAINER")
                .map_err(|_| anyhow::anyhow!("GTFS_CLOUD_CONTAINER is required in cloud mode"))?;
            BlobSourceConfig::Cloud { account, container }
        } else {
            let root = std::env::var("GTFS_DATA_ROOT").unwrap_or_else(|_| "data".to_string());
            let subdir = std::env::var("GTFS_DATA_SUBDIR").unwrap_or_default();
            let root = if subdir.is_empty() {
                PathBuf::from(root)
            } else {
                PathBuf::from(root).join(subdir)
            };
            BlobSourceConfig::Local { root }
        };

        Ok(Self { port, blob_source })
    }

    /// Build the blob source. This is the one load-time operation that can
    /// fail fast: missing cloud credentials are a load-time failure, not a
    /// per-request error.
    pub fn build_blob_source(&self) -> anyhow::Result<AnyBlobSource> {
        match &self.blob_source {
            BlobSourceConfig::Local { root } => {
                Ok(AnyBlobSource::Local(LocalBlobSource::new(root.clone())))
            }
            BlobSourceConfig::Cloud { account, container } => {
                let credential = ChainedCredential::resolve()
                    .ok_or_else(|| anyhow::anyhow!("no usable cloud credential in the chain"))?;
                Ok(AnyBlobSource::Cloud(CloudBlobSource::new(
                    account.clone(),
                    container.clone(),
                    credential,
                )))
            }
        }
    }
}
