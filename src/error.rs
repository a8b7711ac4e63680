//! Error types for talking to the generation endpoint.
//!
//! None of these reach the screen; the view swallows them and they only show
//! up in the log.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Response body is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response body is JSON null")]
    NullPayload,
}

pub type Result<T> = std::result::Result<T, Error>;
