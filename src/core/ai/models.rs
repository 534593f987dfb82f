use serde::{Deserialize, Serialize};

/// One turn handed to a chat-completion provider.
///
/// `role` is one of `"system"`, `"user"` or `"assistant"`. Providers that use
/// different terminology translate it themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: String,
    pub content: String,
}

impl AiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    /// Ask the provider to emit a bare JSON document instead of prose.
    pub json_output: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.0,
            max_tokens: None,
            top_p: None,
            json_output: false,
        }
    }
}

/// Raw response from an AI provider.
#[derive(Debug, Clone, Default)]
pub struct AiProviderResponse {
    /// The main response content from the model.
    pub content: String,

    /// Why the model stopped generating, when the provider reports it.
    pub finish_reason: Option<String>,
}
