use {reqwest::StatusCode, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    #[error("no Telegraph access token configured")]
    NoCredential,

    #[error("Telegraph rejected the request: HTTP {0}")]
    RemoteRejected(StatusCode),

    #[error("unrecognised Telegraph response shape")]
    MalformedResponse,

    #[error("Telegraph API error: {0}")]
    Api(String),

    #[error(transparent)]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Media(#[from] mediarelay_media::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
