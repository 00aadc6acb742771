//! Single-shot model invocation.

use crate::profile::MODEL_TEMPERATURE;
use llmdesk_core::error::ProviderError;
use llmdesk_core::message::Message;
use llmdesk_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::debug;

/// Sends one assembled prompt to one model. No retries.
pub struct ModelInvoker {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
}

impl ModelInvoker {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: MODEL_TEMPERATURE,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn invoke(&self, messages: Vec<Message>) -> Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: None,
        };

        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                provider = self.provider.name(),
                model = %response.model,
                total_tokens = usage.total_tokens,
                "Model responded"
            );
        }
        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmdesk_core::provider::ProviderResponse;
    use std::sync::Mutex;

    struct RecordingProvider {
        requests: Mutex<Vec<ProviderRequest>>,
    }

    #[async_trait::async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            Ok(ProviderResponse {
                message: Message::assistant("ok"),
                usage: None,
                model: "m".into(),
            })
        }
    }

    #[tokio::test]
    async fn uses_fixed_temperature_and_model() {
        let provider = Arc::new(RecordingProvider {
            requests: Mutex::new(Vec::new()),
        });
        let invoker = ModelInvoker::new(provider.clone(), "gemini-2.0-flash-exp");

        let answer = invoker.invoke(vec![Message::user("hi")]).await.unwrap();
        assert_eq!(answer, "ok");

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gemini-2.0-flash-exp");
        assert!((requests[0].temperature - 0.1).abs() < f32::EPSILON);
    }
}
