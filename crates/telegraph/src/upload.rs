//! Upload gateway for telegra.ph.

use std::time::Duration;

use {
    reqwest::{
        Client,
        header::{AUTHORIZATION, USER_AGENT},
        multipart::{Form, Part},
    },
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::{debug, info, warn},
};

use mediarelay_media::{StagedFile, sniff};

use crate::{Error, Result};

/// Public origin that hosts uploaded files.
pub const PUBLIC_BASE: &str = "https://telegra.ph";

/// Upload endpoint.
pub const UPLOAD_URL: &str = "https://telegra.ph/upload";

/// Client identification sent with every request.
pub const CLIENT_USER_AGENT: &str = concat!("mediarelay/", env!("CARGO_PKG_VERSION"));

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Uploads staged media to Telegraph.
///
/// Holds the access credential for the process lifetime. Without one,
/// every upload is refused before any network traffic — there is no
/// anonymous upload path.
#[derive(Clone)]
pub struct TelegraphUploader {
    client: Client,
    access_token: Option<Secret<String>>,
    upload_url: String,
    public_base: String,
}

impl std::fmt::Debug for TelegraphUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegraphUploader")
            .field("access_token", &"[REDACTED]")
            .field("upload_url", &self.upload_url)
            .finish_non_exhaustive()
    }
}

impl TelegraphUploader {
    #[must_use]
    pub fn new(access_token: Option<Secret<String>>) -> Self {
        Self::with_endpoints(access_token, UPLOAD_URL, PUBLIC_BASE)
    }

    /// Point the uploader at a different host (tests).
    #[must_use]
    pub fn with_endpoints(
        access_token: Option<Secret<String>>,
        upload_url: impl Into<String>,
        public_base: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            access_token,
            upload_url: upload_url.into(),
            public_base: public_base.into(),
        }
    }

    /// Push a staged file to Telegraph and return its resource path.
    ///
    /// The MIME type is re-derived from the staged bytes here, independent of
    /// any earlier validation verdict.
    pub async fn upload(&self, file: &StagedFile) -> Result<String> {
        let Some(token) = self.access_token.as_ref() else {
            warn!("telegraph upload refused: no access token configured");
            return Err(Error::NoCredential);
        };

        let mime = sniff::sniff_path(file.path())
            .await
            .map_err(Error::Media)?
            .unwrap_or(sniff::UNKNOWN_MIME);
        let bytes = file.read().await.map_err(Error::Media)?;

        debug!(
            file = file.file_name(),
            mime,
            len = file.len(),
            "uploading to telegraph"
        );

        let part = Part::bytes(bytes)
            .file_name(file.file_name().to_string())
            .mime_str(mime)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()))
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body, "telegraph rejected the upload");
            return Err(Error::RemoteRejected(status));
        }

        let body = response.text().await?;
        let src = parse_upload_response(&body)
            .inspect_err(|_| warn!(body, "unrecognised telegraph response"))?;
        info!(src, "telegraph upload complete");
        Ok(src)
    }

    /// Join a resource path with the public origin. Absolute URLs pass
    /// through unchanged.
    #[must_use]
    pub fn file_url(&self, src: &str) -> String {
        if src.starts_with("http") {
            src.to_string()
        } else {
            format!("{}{}", self.public_base, src)
        }
    }
}

// ── Response decoding ───────────────────────────────────────────────────────

/// The two response shapes Telegraph legitimately produces: an array of
/// uploaded-file objects, or a bare path string.
#[derive(Deserialize)]
#[serde(untagged)]
enum UploadResponse {
    Files(Vec<UploadedFile>),
    Path(String),
}

#[derive(Deserialize)]
struct UploadedFile {
    src: String,
}

fn parse_upload_response(body: &str) -> Result<String> {
    match serde_json::from_str::<UploadResponse>(body) {
        Ok(UploadResponse::Files(files)) => files
            .into_iter()
            .next()
            .map(|file| file.src)
            .ok_or(Error::MalformedResponse),
        Ok(UploadResponse::Path(path))
            if path.starts_with("/file/") || path.starts_with("http") =>
        {
            Ok(path)
        },
        Ok(UploadResponse::Path(_)) | Err(_) => Err(Error::MalformedResponse),
    }
}
