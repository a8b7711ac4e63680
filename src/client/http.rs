//! HTTP client for the external generation endpoint.

use crate::error::{Error, Result};
use crate::protocol::{GenerateRequest, GenerateResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Something that can turn a prompt into an image reference.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Perform one exchange for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<GenerateResponse>;
}

/// Generator backed by a JSON-over-HTTP endpoint.
pub struct HttpGenerator {
    client: Client,
    endpoint: String,
}

impl HttpGenerator {
    /// Create a generator for `endpoint`. Without a timeout, requests wait
    /// for as long as the endpoint takes.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageGenerator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<GenerateResponse> {
        let request = GenerateRequest {
            prompt: prompt.to_string(),
        };

        debug!("POST {} ({} chars)", self.endpoint, prompt.chars().count());
        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        // Error statuses are not special: a JSON error body still decodes
        // into a response without an image.
        let status = response.status();
        if !status.is_success() {
            warn!("Generation endpoint returned status {}", status);
        }

        let body = response.bytes().await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        if value.is_null() {
            return Err(Error::NullPayload);
        }

        Ok(GenerateResponse::from_value(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(server: &MockServer) -> HttpGenerator {
        HttpGenerator::new(format!("{}/api/generate", server.uri()), None).unwrap()
    }

    #[tokio::test]
    async fn test_generate_posts_prompt_and_reads_image_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "prompt": "a robot samurai" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "imageUrl": "https://example.test/a.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = generator(&server).generate("a robot samurai").await.unwrap();
        assert_eq!(resp.image_url.as_deref(), Some("https://example.test/a.png"));
    }

    #[tokio::test]
    async fn test_generate_sends_empty_prompt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_json(json!({ "prompt": "" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let resp = generator(&server).generate("").await.unwrap();
        assert!(resp.image_url.is_none());
    }

    #[tokio::test]
    async fn test_generate_missing_field() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url": "x" })))
            .mount(&server)
            .await;

        let resp = generator(&server).generate("prompt").await.unwrap();
        assert!(resp.image_url.is_none());
    }

    #[tokio::test]
    async fn test_generate_empty_image_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "imageUrl": "" })))
            .mount(&server)
            .await;

        let resp = generator(&server).generate("prompt").await.unwrap();
        assert!(resp.image_url.is_none());
    }

    #[tokio::test]
    async fn test_generate_error_status_with_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "error": "model offline" })),
            )
            .mount(&server)
            .await;

        let resp = generator(&server).generate("prompt").await.unwrap();
        assert!(resp.image_url.is_none());
    }

    #[tokio::test]
    async fn test_generate_non_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = generator(&server).generate("prompt").await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn test_generate_null_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let err = generator(&server).generate("prompt").await.unwrap_err();
        assert!(matches!(err, Error::NullPayload));
    }

    #[tokio::test]
    async fn test_generate_connection_refused() {
        // Nothing listens on the discard port.
        let generator = HttpGenerator::new("http://127.0.0.1:9/api/generate", None).unwrap();
        let err = generator.generate("prompt").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[tokio::test]
    async fn test_generate_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "imageUrl": "https://example.test/late.png" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let generator = HttpGenerator::new(
            format!("{}/api/generate", server.uri()),
            Some(Duration::from_millis(100)),
        )
        .unwrap();
        let err = generator.generate("prompt").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
