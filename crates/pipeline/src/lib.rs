//! The per-message relay pipeline: reference → fetch → validate → upload → link.

pub mod fetch;
pub mod reference;
pub mod relay;

pub use {
    fetch::{FetchError, MediaFetcher},
    reference::{AttachmentKind, MediaReference},
    relay::{RelayError, RelayPipeline, RelayedMedia},
};
