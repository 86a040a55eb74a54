//! Content generator: persona prompts in, non-empty text out.
//!
//! Every call goes to the [`TextBackend`] once, bounded by the configured deadline. Any
//! failure is logged and replaced by a canned line, so callers never see a generation error.

pub mod backend;
pub mod persona;

use std::{sync::Arc, time::Duration};

use futures::{StreamExt, stream};
use rand::seq::IndexedRandom;
use tokio::time::timeout;
use tracing::warn;

use crate::{
    config::{GenerationConfig, SamplingOptions},
    state::session::GeneratedMessage,
};

use self::{
    backend::{GenerationError, GenerationResult, TextBackend},
    persona::Persona,
};

/// Which sampling preset a request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Conversational answers.
    Chat,
    /// Game content: attacks, lyrics, spirals.
    Creative,
}

/// One line to generate.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRequest {
    /// Agent speaking the line.
    pub agent: String,
    /// Emotion tag attached to the resulting message.
    pub emotion: String,
    pub prompt: String,
    pub sampling: Sampling,
    /// Canned lines, one is picked at random when the backend fails.
    pub fallbacks: Vec<String>,
    /// Label used in logs (mode or chat flavour).
    pub context: &'static str,
}

impl ContentRequest {
    pub fn new(agent: impl Into<String>, emotion: impl Into<String>, prompt: String) -> Self {
        Self {
            agent: agent.into(),
            emotion: emotion.into(),
            prompt,
            sampling: Sampling::Creative,
            fallbacks: Vec::new(),
            context: "game",
        }
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_fallbacks(mut self, fallbacks: Vec<String>) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    pub fn with_fallback(mut self, fallback: String) -> Self {
        self.fallbacks.push(fallback);
        self
    }

    pub fn with_context(mut self, context: &'static str) -> Self {
        self.context = context;
        self
    }
}

/// Wrapper around the generation backend that always produces text.
#[derive(Clone)]
pub struct ContentGenerator {
    backend: Arc<dyn TextBackend>,
    chat: SamplingOptions,
    creative: SamplingOptions,
    timeout: Duration,
    fan_out: usize,
}

impl ContentGenerator {
    pub fn new(backend: Arc<dyn TextBackend>, config: &GenerationConfig) -> Self {
        Self {
            backend,
            chat: config.chat,
            creative: config.creative,
            timeout: config.timeout,
            fan_out: config.fan_out.max(1),
        }
    }

    fn options(&self, sampling: Sampling) -> SamplingOptions {
        match sampling {
            Sampling::Chat => self.chat,
            Sampling::Creative => self.creative,
        }
    }

    /// Single backend call bounded by the per-call deadline. No retries.
    async fn call(&self, prompt: String, sampling: Sampling) -> GenerationResult<String> {
        let call = self.backend.generate(prompt, self.options(sampling));
        match timeout(self.timeout, call).await {
            Ok(Ok(text)) if text.trim().is_empty() => Err(GenerationError::EmptyResponse),
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout),
        }
    }

    /// Generate one line, substituting a fallback on any failure.
    pub async fn generate(&self, request: ContentRequest) -> GeneratedMessage {
        let ContentRequest {
            agent,
            emotion,
            prompt,
            sampling,
            fallbacks,
            context,
        } = request;

        match self.call(prompt, sampling).await {
            Ok(text) => GeneratedMessage {
                agent,
                message: text.trim().to_owned(),
                emotion,
                fallback: false,
            },
            Err(err) => {
                warn!(agent = %agent, context, error = %err, "generation failed; using fallback line");
                let message = pick_fallback(&agent, &fallbacks);
                GeneratedMessage {
                    agent,
                    message,
                    emotion,
                    fallback: true,
                }
            }
        }
    }

    /// Generate several lines concurrently, bounded by the configured fan-out. The output
    /// keeps the request order.
    pub async fn generate_many(&self, requests: Vec<ContentRequest>) -> Vec<GeneratedMessage> {
        stream::iter(requests.into_iter().map(|request| self.generate(request)))
            .buffered(self.fan_out)
            .collect()
            .await
    }

    /// Whether the backend answers its health check before the deadline.
    pub async fn backend_healthy(&self) -> bool {
        matches!(
            timeout(self.timeout, self.backend.health_check()).await,
            Ok(Ok(()))
        )
    }
}

fn pick_fallback(agent: &str, fallbacks: &[String]) -> String {
    let candidates: Vec<&String> = fallbacks
        .iter()
        .filter(|line| !line.trim().is_empty())
        .collect();
    candidates
        .choose(&mut rand::rng())
        .map(|line| (*line).clone())
        .unwrap_or_else(|| Persona::from_name(agent).generic_fallback(agent))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted backends shared by the service tests.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::BoxFuture;

    use super::*;

    /// Always fails.
    pub struct FailingBackend;

    impl TextBackend for FailingBackend {
        fn generate(
            &self,
            _prompt: String,
            _options: SamplingOptions,
        ) -> BoxFuture<'static, GenerationResult<String>> {
            Box::pin(async { Err(GenerationError::NoModel) })
        }

        fn health_check(&self) -> BoxFuture<'static, GenerationResult<()>> {
            Box::pin(async { Err(GenerationError::NoModel) })
        }
    }

    /// Answers with the last line of the prompt and counts calls.
    #[derive(Default)]
    pub struct EchoBackend {
        pub calls: Arc<AtomicUsize>,
    }

    impl TextBackend for EchoBackend {
        fn generate(
            &self,
            prompt: String,
            _options: SamplingOptions,
        ) -> BoxFuture<'static, GenerationResult<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                Ok(format!("echo: {}", prompt.lines().last().unwrap_or_default()))
            })
        }

        fn health_check(&self) -> BoxFuture<'static, GenerationResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    /// Sleeps longer than any test deadline.
    pub struct SlowBackend;

    impl TextBackend for SlowBackend {
        fn generate(
            &self,
            _prompt: String,
            _options: SamplingOptions,
        ) -> BoxFuture<'static, GenerationResult<String>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok("too late".to_owned())
            })
        }

        fn health_check(&self) -> BoxFuture<'static, GenerationResult<()>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })
        }
    }

    pub fn generator(backend: impl TextBackend + 'static) -> ContentGenerator {
        let mut config = crate::config::AppConfig::default().generation;
        config.timeout = Duration::from_millis(50);
        ContentGenerator::new(Arc::new(backend), &config)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::testing::*;
    use super::*;

    fn request(agent: &str, fallbacks: &[&str]) -> ContentRequest {
        ContentRequest::new(agent, "excited", format!("prompt for {agent}"))
            .with_fallbacks(fallbacks.iter().map(|line| (*line).to_owned()).collect())
    }

    #[tokio::test]
    async fn backend_failure_uses_a_fallback_line() {
        let generator = generator(FailingBackend);
        let message = generator.generate(request("Adam", &["plan B"])).await;
        assert!(message.fallback);
        assert_eq!(message.message, "plan B");
        assert_eq!(message.emotion, "excited");
    }

    #[tokio::test]
    async fn empty_fallback_list_still_yields_text() {
        let generator = generator(FailingBackend);
        let message = generator.generate(request("Zenon", &["", "  "])).await;
        assert!(message.fallback);
        assert!(!message.message.trim().is_empty());
    }

    #[tokio::test]
    async fn slow_backend_hits_the_deadline() {
        let generator = generator(SlowBackend);
        let message = generator.generate(request("Beata", &["za wolno"])).await;
        assert!(message.fallback);
        assert_eq!(message.message, "za wolno");
        assert!(!generator.backend_healthy().await);
    }

    #[tokio::test]
    async fn generate_many_keeps_order_and_calls_once_each() {
        let backend = EchoBackend::default();
        let calls = backend.calls.clone();
        let generator = generator(backend);

        let messages = generator
            .generate_many(vec![
                request("Adam", &[]),
                request("Beata", &[]),
                request("Wątpiący", &[]),
                request("Daria", &[]),
                request("Zenon", &[]),
            ])
            .await;

        let agents: Vec<_> = messages.iter().map(|m| m.agent.as_str()).collect();
        assert_eq!(agents, vec!["Adam", "Beata", "Wątpiący", "Daria", "Zenon"]);
        assert_eq!(messages[1].message, "echo: prompt for Beata");
        assert!(messages.iter().all(|m| !m.fallback));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(generator.backend_healthy().await);
    }
}
