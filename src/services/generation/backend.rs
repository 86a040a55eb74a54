//! Black-box prompt to text backends.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::{GenerationConfig, SamplingOptions};

/// Convenient result alias returning [`GenerationError`] failures.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Failures of a single generation call. Never leaves the content generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Request could not be sent or the connection dropped.
    #[error("generation backend unreachable at `{url}`")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Backend answered with a non-success status.
    #[error("generation backend returned status {status} for `{url}`")]
    Status { url: String, status: StatusCode },
    /// Call did not complete before its deadline.
    #[error("generation call timed out")]
    Timeout,
    /// Response body was not the expected JSON.
    #[error("failed to decode generation response from `{url}`")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Backend produced only whitespace.
    #[error("generation backend returned an empty response")]
    EmptyResponse,
    /// No model could be selected.
    #[error("no generation model available")]
    NoModel,
}

/// Anything that turns a prompt into text.
pub trait TextBackend: Send + Sync {
    /// Generate text for `prompt` using `options`.
    fn generate(
        &self,
        prompt: String,
        options: SamplingOptions,
    ) -> BoxFuture<'static, GenerationResult<String>>;

    /// Cheap reachability check.
    fn health_check(&self) -> BoxFuture<'static, GenerationResult<()>>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

impl From<SamplingOptions> for GenerateOptions {
    fn from(value: SamplingOptions) -> Self {
        Self {
            temperature: value.temperature,
            top_p: value.top_p,
            max_tokens: value.max_tokens,
        }
    }
}

/// Ollama HTTP backend (`/api/generate`, `/api/tags`).
#[derive(Clone)]
pub struct OllamaBackend {
    client: Client,
    base_url: Arc<str>,
    preferred_models: Arc<[String]>,
    default_model: Arc<str>,
    model: Arc<OnceCell<String>>,
}

impl OllamaBackend {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            preferred_models: config.preferred_models.clone().into(),
            default_model: Arc::from(config.default_model.as_str()),
            model: Arc::new(OnceCell::new()),
        }
    }

    async fn tags(&self) -> GenerationResult<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| classify_send_error(&url, source))?;

        if !response.status().is_success() {
            return Err(GenerationError::Status {
                url,
                status: response.status(),
            });
        }

        let tags = response
            .json::<TagsResponse>()
            .await
            .map_err(|source| GenerationError::Decode { url, source })?;
        Ok(tags.models.into_iter().map(|tag| tag.name).collect())
    }

    /// Model used for every call, resolved once against the installed catalogue.
    async fn model(&self) -> GenerationResult<String> {
        let model = self
            .model
            .get_or_try_init(|| async {
                let installed = self.tags().await?;
                let selected = select_model(&self.preferred_models, &installed)
                    .unwrap_or_else(|| self.default_model.to_string());
                if selected.is_empty() {
                    return Err(GenerationError::NoModel);
                }
                info!(model = %selected, installed = installed.len(), "selected generation model");
                Ok(selected)
            })
            .await?;
        Ok(model.clone())
    }

    async fn generate(&self, prompt: String, options: SamplingOptions) -> GenerationResult<String> {
        let model = self.model().await?;
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &model,
            prompt: &prompt,
            stream: false,
            options: options.into(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| classify_send_error(&url, source))?;

        if !response.status().is_success() {
            return Err(GenerationError::Status {
                url,
                status: response.status(),
            });
        }

        let decoded = response
            .json::<GenerateResponse>()
            .await
            .map_err(|source| GenerationError::Decode { url, source })?;

        let text = decoded.response.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        debug!(model = %model, chars = text.chars().count(), "generation succeeded");
        Ok(text.to_owned())
    }
}

impl TextBackend for OllamaBackend {
    fn generate(
        &self,
        prompt: String,
        options: SamplingOptions,
    ) -> BoxFuture<'static, GenerationResult<String>> {
        let backend = self.clone();
        Box::pin(async move { backend.generate(prompt, options).await })
    }

    fn health_check(&self) -> BoxFuture<'static, GenerationResult<()>> {
        let backend = self.clone();
        Box::pin(async move { backend.tags().await.map(|_| ()) })
    }
}

/// First preferred model that is installed, otherwise the first installed one.
fn select_model(preferred: &[String], installed: &[String]) -> Option<String> {
    preferred
        .iter()
        .find(|model| installed.contains(model))
        .or_else(|| installed.first())
        .cloned()
}

fn classify_send_error(url: &str, source: reqwest::Error) -> GenerationError {
    if source.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Transport {
            url: url.to_owned(),
            source,
        }
    }
}
