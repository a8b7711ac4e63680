//! Wire types for the generation endpoint.
//!
//! The request is `{"prompt": "..."}`. The response is read loosely: any JSON
//! value is accepted and only its `imageUrl` string field is kept.

use serde::{Deserialize, Serialize};

/// Body POSTed to the generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The prompt exactly as typed.
    pub prompt: String,
}

/// What the view takes from a decoded response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateResponse {
    /// The image reference, absent when the field is missing, empty or not a
    /// string.
    pub image_url: Option<String>,
}

impl GenerateResponse {
    /// Pull the image reference out of an arbitrary JSON payload.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let image_url = value
            .get("imageUrl")
            .and_then(|v| v.as_str())
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        Self { image_url }
    }
}
