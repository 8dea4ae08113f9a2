//! Fetching remote CSV files over HTTP(S).

use std::io::Read;
use std::time::Duration;

use log::debug;
use thiserror::Error;

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur during HTTP fetching.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP error {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Response exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for HttpError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => HttpError::HttpStatus {
                status: code,
                message: format!("Server returned status {code}"),
            },
            _ => HttpError::Network(err.to_string()),
        }
    }
}

/// Download the full body of `url`.
///
/// With `max_bytes` set, a body longer than the limit is an error: a CSV
/// cut short mid-row would silently lose or corrupt data.
pub fn fetch_url(url: &str, max_bytes: Option<usize>) -> Result<Vec<u8>, HttpError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(HttpError::InvalidUrl(format!(
            "URL must start with http:// or https://: {url}"
        )));
    }

    let config = ureq::Agent::config_builder()
        .timeout_global(Some(DEFAULT_TIMEOUT))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let response = agent.get(url).call()?;

    let content_length = response
        .headers()
        .get("Content-Length")
        .and_then(|h| h.to_str().ok()?.parse::<u64>().ok());
    if let (Some(limit), Some(length)) = (max_bytes, content_length)
        && length > limit as u64
    {
        return Err(HttpError::TooLarge { limit });
    }

    let mut reader = response.into_body().into_reader();
    let mut data = Vec::new();
    match max_bytes {
        Some(limit) => {
            // One byte past the limit tells a full body from an oversized one
            reader.take(limit as u64 + 1).read_to_end(&mut data)?;
            if data.len() > limit {
                return Err(HttpError::TooLarge { limit });
            }
        }
        None => {
            reader.read_to_end(&mut data)?;
        }
    }

    debug!("fetched {} bytes from {url}", data.len());
    Ok(data)
}
