//! Fetching remote media into local staging.

use {async_trait::async_trait, thiserror::Error};

use mediarelay_media::StagedFile;

use crate::MediaReference;

/// Retrieves the bytes behind a media reference into a staged file.
///
/// Implemented by the messaging layer; pipeline tests substitute their own.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Resolve the reference and stream the file into local staging.
    ///
    /// Exactly one staged file exists on success; none survives a failure.
    /// A single attempt, no retry.
    async fn fetch(&self, reference: &MediaReference) -> Result<StagedFile, FetchError>;
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("remote returned status {0}")]
    RemoteStatus(u16),

    #[error("network failure: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FetchError {
    #[must_use]
    pub fn network(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Network(Box::new(source))
    }
}
