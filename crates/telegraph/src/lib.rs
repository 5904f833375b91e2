//! Telegraph (telegra.ph) upload gateway and one-time account provisioning.

pub mod account;
pub mod error;
pub mod upload;

pub use {
    error::{Error, Result},
    upload::TelegraphUploader,
};
