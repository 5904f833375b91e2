//! Telegram front end for the media relay.
//!
//! Receives messages via the Bot API (teloxide), extracts media references,
//! runs them through the relay pipeline, and replies with the resulting link.

pub mod bot;
pub mod config;
pub mod error;
pub mod fetch;
pub mod handlers;
pub mod outbound;

pub use {
    bot::start_polling,
    config::BotConfig,
    error::{Error, Result},
    fetch::TelegramFetcher,
};
