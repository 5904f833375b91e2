//! The relay orchestrator: extension pre-check → fetch → validate → upload.

use {
    thiserror::Error,
    tracing::{info, warn},
};

use {
    mediarelay_media::{Rejection, Verdict, validate},
    mediarelay_telegraph::TelegraphUploader,
};

use crate::{
    MediaReference,
    fetch::{FetchError, MediaFetcher},
};

/// Extensions worth downloading at all. Advisory only: the authoritative
/// decision is the signature check after download.
pub const ALLOWED_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".mp4"];

/// A successfully relayed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedMedia {
    /// Shareable absolute URL on the public host.
    pub url: String,
}

/// Why a relay run stopped short of a link.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("declared extension {extension:?} is not allowed")]
    UnsupportedExtension { extension: String },

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("media rejected: {0:?}")]
    Rejected(Rejection),

    #[error("upload failed: {0}")]
    Upload(#[from] mediarelay_telegraph::Error),

    #[error(transparent)]
    Staging(#[from] mediarelay_media::Error),
}

impl RelayError {
    /// The one user-facing line for this failure. Internal detail (paths,
    /// status codes, response bodies) stays in the operational log.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedExtension { extension } => {
                format!("Sorry, {extension} is not supported. Please use JPG, PNG, GIF, or MP4.")
            },
            Self::Fetch(_) => "Failed to download the file. Try again!".into(),
            Self::Rejected(Rejection::TooLarge { size }) => format!(
                "File is too large for Telegraph (max 5MB). Got {:.2}MB.",
                *size as f64 / 1024.0 / 1024.0
            ),
            Self::Rejected(Rejection::UnsupportedType { detected }) => {
                format!("Unsupported file type: {detected}. Please use JPG, PNG, GIF, or MP4.")
            },
            Self::Upload(_) => "Failed to upload to Telegraph. Please try again.".into(),
            Self::Staging(_) => "Something went wrong! Please try again.".into(),
        }
    }
}

/// Sequences one media message from reference to shareable link.
pub struct RelayPipeline {
    uploader: TelegraphUploader,
}

impl RelayPipeline {
    #[must_use]
    pub fn new(uploader: TelegraphUploader) -> Self {
        Self { uploader }
    }

    /// Run the full relay for one reference. Terminal on the first failure.
    ///
    /// The staged file is owned by this call and removed on every exit path,
    /// unwinds included.
    pub async fn run(
        &self,
        fetcher: &dyn MediaFetcher,
        reference: &MediaReference,
    ) -> Result<RelayedMedia, RelayError> {
        let extension = reference.extension();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            info!(
                kind = reference.kind.as_str(),
                extension, "skipping download: extension not allowed"
            );
            return Err(RelayError::UnsupportedExtension { extension });
        }

        let staged = fetcher.fetch(reference).await?;
        info!(
            kind = reference.kind.as_str(),
            file = staged.file_name(),
            size = staged.len(),
            "processing media file"
        );

        if let Verdict::Rejected(rejection) = validate::validate(&staged).await? {
            warn!(?rejection, "media failed validation");
            return Err(RelayError::Rejected(rejection));
        }

        let src = self.uploader.upload(&staged).await?;
        Ok(RelayedMedia {
            url: self.uploader.file_url(&src),
        })
    }
}
