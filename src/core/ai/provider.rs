use super::models::{AiConfig, AiMessage, AiProviderResponse};
use async_trait::async_trait;
use std::error::Error;

/// A chat-completion backend. The moderation gate talks to its classifier
/// exclusively through this trait so tests can swap in a canned provider.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request to the AI provider.
    ///
    /// Messages with role `"system"` carry the instruction; the rest form the
    /// conversation in order.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>>;
}
