//! Media staging and validation: scratch files, MIME sniffing, size/type policy.

pub mod error;
pub mod sniff;
pub mod staging;
pub mod validate;

pub use {
    error::{Error, Result},
    staging::{StagedFile, StagedWriter},
    validate::{Rejection, Verdict},
};
