//! Size and content-type policy for relayed media.

use tracing::{debug, info};

use crate::{Result, StagedFile, sniff};

/// Telegraph rejects anything above 5 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Content types Telegraph will host.
pub const ALLOWED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "video/mp4"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted { mime: &'static str },
    Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    TooLarge { size: u64 },
    UnsupportedType { detected: String },
}

/// Judge a staged file against the size cap and the MIME allow-list.
///
/// The size check runs first and short-circuits. Both checks look only at
/// the staged bytes; the filename the sender declared plays no part.
pub async fn validate(file: &StagedFile) -> Result<Verdict> {
    if file.len() > MAX_UPLOAD_BYTES {
        info!(size = file.len(), "media rejected: over the size cap");
        return Ok(Verdict::Rejected(Rejection::TooLarge { size: file.len() }));
    }

    match sniff::sniff_path(file.path()).await? {
        Some(mime) if ALLOWED_MIME_TYPES.contains(&mime) => {
            debug!(mime, size = file.len(), "media accepted");
            Ok(Verdict::Accepted { mime })
        },
        other => {
            let detected = other.unwrap_or(sniff::UNKNOWN_MIME).to_string();
            info!(%detected, "media rejected: unsupported content type");
            Ok(Verdict::Rejected(Rejection::UnsupportedType { detected }))
        },
    }
}
