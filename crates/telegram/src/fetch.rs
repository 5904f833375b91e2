//! Telegram-backed media fetcher.

use {
    async_trait::async_trait,
    teloxide::{RequestError, prelude::*},
    tracing::debug,
};

use {
    mediarelay_media::{StagedFile, StagedWriter},
    mediarelay_pipeline::{FetchError, MediaFetcher, MediaReference},
};

/// Default origin for Telegram file downloads.
pub const FILE_API_BASE: &str = "https://api.telegram.org";

/// Fetches referenced files through the Telegram Bot API.
pub struct TelegramFetcher {
    bot: Bot,
    http: reqwest::Client,
    file_base: String,
}

impl TelegramFetcher {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self::with_file_base(bot, FILE_API_BASE)
    }

    /// Point downloads at a different origin (tests).
    #[must_use]
    pub fn with_file_base(bot: Bot, file_base: impl Into<String>) -> Self {
        Self {
            bot,
            http: reqwest::Client::new(),
            file_base: file_base.into(),
        }
    }
}

#[async_trait]
impl MediaFetcher for TelegramFetcher {
    async fn fetch(&self, reference: &MediaReference) -> Result<StagedFile, FetchError> {
        let file = self
            .bot
            .get_file(reference.file_id.as_str())
            .await
            .map_err(map_request_error)?;

        // Telegram file URL shape: {base}/file/bot{token}/{path}
        let url = format!(
            "{}/file/bot{}/{}",
            self.file_base,
            self.bot.token(),
            file.path
        );

        let mut response = self.http.get(&url).send().await.map_err(FetchError::network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::RemoteStatus(status.as_u16()));
        }

        let mut writer = StagedWriter::create(&reference.extension()).map_err(FetchError::network)?;
        while let Some(chunk) = response.chunk().await.map_err(FetchError::network)? {
            writer.write_chunk(&chunk).await.map_err(FetchError::network)?;
        }
        let staged = writer.finish().await.map_err(FetchError::network)?;

        debug!(file_id = %reference.file_id, size = staged.len(), "downloaded telegram file");
        Ok(staged)
    }
}

fn map_request_error(err: RequestError) -> FetchError {
    match err {
        RequestError::Network(e) => FetchError::network(e),
        // getFile rejections (bad or expired file ids) surface as client errors.
        RequestError::Api(_) => FetchError::RemoteStatus(400),
        RequestError::RetryAfter(_) => FetchError::RemoteStatus(429),
        other => FetchError::network(other),
    }
}
