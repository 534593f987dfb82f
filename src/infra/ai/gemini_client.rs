// =============================================================================
// GEMINI CLIENT - Google AI Studio API Integration
// =============================================================================
//
// Implements the `AiProvider` trait against Google's Gemini API
// (https://ai.google.dev/gemini-api/docs). The moderation gate uses it as its
// content classifier.
//
// **Wire format notes:**
// - Authentication: API key is passed as a query parameter (`?key=API_KEY`).
// - `systemInstruction` is a separate top-level field, not a message.
// - "assistant" turns are called "model".
// - Content is at `candidates[0].content.parts[*].text`.
// - JSON mode is requested with `generationConfig.responseMimeType`.

use crate::core::ai::{AiConfig, AiMessage, AiProvider, AiProviderResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// =============================================================================
// GEMINI API DATA STRUCTURES
// =============================================================================
//
// See: https://ai.google.dev/api/generate-content

/// A single part of content. Only text parts are used here.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    /// Set on parts that carry the model's reasoning rather than its answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct Content {
    /// Role: "user" or "model" (Gemini uses "model" instead of "assistant")
    #[serde(skip_serializing_if = "String::is_empty")]
    role: String,
    parts: Vec<Part>,
}

/// Generation configuration options that control the model's output.
/// See: https://ai.google.dev/api/generate-content#generationconfig
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    /// Controls randomness. Range: [0.0, 2.0]. Higher = more creative.
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,

    /// `application/json` makes the model emit a bare JSON document.
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

/// The request body sent to the Gemini generateContent endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    /// Missing when the candidate was blocked.
    #[serde(default)]
    content: Option<Content>,

    /// Why the model stopped generating (e.g., "STOP", "MAX_TOKENS", "SAFETY").
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

/// Error response from the Gemini API.
#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

// =============================================================================
// GEMINI CLIENT IMPLEMENTATION
// =============================================================================

/// Client for Google's Gemini API.
///
/// # Example
/// ```ignore
/// let client = GeminiClient::with_options(api_key, DEFAULT_GEMINI_BASE_URL.to_string(), None)?;
/// let messages = vec![AiMessage::system("Classify this."), AiMessage::user("hi")];
/// let response = client.chat_complete(&messages, &AiConfig::default()).await?;
/// ```
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client with a custom endpoint and an optional per-request timeout.
    pub fn with_options(
        api_key: String,
        base_url: String,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn text_part(text: String) -> Part {
        Part {
            text: Some(text),
            thought: None,
        }
    }

    /// Converts our generic `AiMessage` to Gemini's `Content` format.
    fn convert_message(msg: &AiMessage) -> Content {
        let role = match msg.role.as_str() {
            "assistant" => "model".to_string(),
            other => other.to_string(),
        };

        Content {
            role,
            parts: vec![Self::text_part(msg.content.clone())],
        }
    }

    fn build_request(messages: &[AiMessage], config: &AiConfig) -> GenerateContentRequest {
        // Multiple system messages are concatenated into one instruction.
        let system_text: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .collect();
        let system_instruction = if system_text.is_empty() {
            None
        } else {
            Some(Content {
                role: String::new(),
                parts: vec![Self::text_part(system_text.join("\n\n"))],
            })
        };

        let contents = messages
            .iter()
            .filter(|m| m.role != "system")
            .map(Self::convert_message)
            .collect();

        let generation_config = GenerationConfig {
            temperature: Some(config.temperature),
            max_output_tokens: config.max_tokens,
            top_p: config.top_p,
            response_mime_type: config
                .json_output
                .then(|| "application/json".to_string()),
        };

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: Some(generation_config),
        }
    }

    /// Pulls the answer text out of a response.
    ///
    /// Thought parts are skipped. The remaining text parts are joined, since
    /// long JSON answers are sometimes split across parts.
    fn extract_response(
        response: GenerateContentResponse,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
        {
            return Err(format!("Gemini blocked the prompt: {reason}").into());
        }

        let candidate = response
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or("No candidates in Gemini response")?;

        let content: String = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter(|p| !p.thought.unwrap_or(false))
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(format!(
                "Empty Gemini response (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )
            .into());
        }

        Ok(AiProviderResponse {
            content,
            finish_reason: candidate.finish_reason,
        })
    }
}

#[async_trait]
impl AiProvider for GeminiClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, config.model, self.api_key
        );

        let request = Self::build_request(messages, config);

        // Be careful not to log the URL, it carries the API key.
        tracing::debug!(
            "Gemini request to model {}: {} messages, json_output: {}",
            config.model,
            messages.len(),
            config.json_output
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(&error_text) {
                return Err(format!(
                    "Gemini API error ({}): {}",
                    status, error_response.error.message
                )
                .into());
            }

            return Err(format!("Gemini API error: {} - {}", status, error_text).into());
        }

        let response_json: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &response_json.usage_metadata {
            tracing::debug!(
                prompt_tokens = usage.prompt_token_count,
                response_tokens = usage.candidates_token_count,
                "Gemini usage"
            );
        }

        let result = Self::extract_response(response_json)?;

        tracing::debug!(
            "Gemini response received: {} chars, finish reason {:?}",
            result.content.len(),
            result.finish_reason
        );

        Ok(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================
