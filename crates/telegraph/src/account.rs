//! One-time Telegraph account provisioning.
//!
//! Runs at startup when no access token is configured; the returned token is
//! immutable for the process lifetime.

use {
    reqwest::{Client, header::USER_AGENT},
    secrecy::Secret,
    serde::Deserialize,
    tracing::info,
};

use crate::{Error, Result, upload::CLIENT_USER_AGENT};

/// Telegraph API origin.
pub const API_BASE: &str = "https://api.telegra.ph";

/// Envelope every Telegraph API method responds with.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Account {
    #[serde(default)]
    access_token: Option<String>,
}

/// Create a Telegraph account and return its access token.
pub async fn create_account(
    api_base: &str,
    short_name: &str,
    author_name: &str,
) -> Result<Secret<String>> {
    let client = Client::new();
    let response = client
        .post(format!("{api_base}/createAccount"))
        .header(USER_AGENT, CLIENT_USER_AGENT)
        .form(&[("short_name", short_name), ("author_name", author_name)])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::RemoteRejected(status));
    }

    let envelope: ApiResponse<Account> = response
        .json()
        .await
        .map_err(|_| Error::MalformedResponse)?;
    if !envelope.ok {
        return Err(Error::Api(
            envelope.error.unwrap_or_else(|| "unknown error".into()),
        ));
    }

    let token = envelope
        .result
        .and_then(|account| account.access_token)
        .ok_or(Error::MalformedResponse)?;
    info!(short_name, "telegraph account created");
    Ok(Secret::new(token))
}
