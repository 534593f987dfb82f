// Moderation gate - core business logic for classifying user content.
//
// This service handles:
// - Asking the classifier for a verdict on a post or comment
// - Turning classifier outages and garbage replies into fail-closed verdicts
// - Writing one audit log row per classification attempt
//
// NO HTTP or SQL here - the classifier and the log store are injected.

use super::moderation_models::{
    ContentFilterLogEntry, LogFilter, ModerationVerdict, NewContentFilterLog,
};
use super::verdict_parser::parse_verdict;
use crate::core::ai::{AiConfig, AiMessage, AiProvider};
use async_trait::async_trait;
use thiserror::Error;

/// Policy handed to the classifier as its system instruction.
pub const DEFAULT_MODERATION_PROMPT: &str = r#"You are the content moderator for a campus social network used by university students. Review the post or comment you are given for:

1. Profanity and inappropriate language
2. Self-advertisement and spam
3. Hate speech or discriminatory content
4. Personal attacks or harassment

Respond with ONLY a raw JSON object. Do not use markdown, code blocks or any other text. The object must have exactly this shape:
{
  "isAcceptable": boolean,
  "reason": string (only when isAcceptable is false),
  "category": one of "PROFANITY", "SELF_ADVERTISEMENT", "HATE_SPEECH", "HARASSMENT", "ACCEPTABLE"
}

Be strict but fair. Genuine questions and academic collaboration requests are acceptable; commercial promotion is SELF_ADVERTISEMENT."#;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Append-only persistence for moderation verdicts.
#[async_trait]
pub trait ContentFilterLogStore: Send + Sync {
    /// Append one audit row. Returns the stored entry with its assigned id.
    async fn append(&self, entry: NewContentFilterLog)
        -> Result<ContentFilterLogEntry, ModerationError>;

    /// Most recent rows first, restricted by `filter`, at most `limit` rows.
    async fn recent(
        &self,
        filter: LogFilter,
        limit: usize,
    ) -> Result<Vec<ContentFilterLogEntry>, ModerationError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Classifies user text and records every decision.
pub struct ModerationService<P: AiProvider, S: ContentFilterLogStore> {
    classifier: P,
    store: S,
    prompt: String,
    config: AiConfig,
}

impl<P: AiProvider, S: ContentFilterLogStore> ModerationService<P, S> {
    pub fn new(classifier: P, store: S, prompt: String, config: AiConfig) -> Self {
        Self {
            classifier,
            store,
            prompt,
            config,
        }
    }

    /// Decide whether `content` may be published.
    ///
    /// Never fails: classifier errors and unreadable replies come back as a
    /// rejected verdict so the caller always has something to show. The
    /// verdict is advisory; the caller must check `is_acceptable` before
    /// storing the content.
    pub async fn classify(&self, content: &str, user_id: &str) -> ModerationVerdict {
        let messages = [
            AiMessage::system(self.prompt.clone()),
            AiMessage::user(content),
        ];

        let verdict = match self.classifier.chat_complete(&messages, &self.config).await {
            Ok(response) => match parse_verdict(&response.content) {
                Ok(verdict) => verdict,
                Err(err) => {
                    tracing::warn!(
                        user_id,
                        error = %err,
                        raw = %response.content,
                        "Failed to parse moderation result"
                    );
                    ModerationVerdict::analysis_failed()
                }
            },
            Err(err) => {
                tracing::warn!(user_id, error = %err, "Content moderation request failed");
                ModerationVerdict::service_unavailable()
            }
        };

        tracing::info!(
            user_id,
            accepted = verdict.is_acceptable,
            category = %verdict.category,
            "Content classified"
        );

        // Best effort: the audit row must never change or block the verdict.
        self.record(content, user_id, &verdict).await;

        verdict
    }

    /// Browse the audit log, newest first.
    pub async fn recent_logs(
        &self,
        filter: LogFilter,
        limit: usize,
    ) -> Result<Vec<ContentFilterLogEntry>, ModerationError> {
        self.store.recent(filter, limit).await
    }

    async fn record(&self, content: &str, user_id: &str, verdict: &ModerationVerdict) {
        let entry = NewContentFilterLog::from_verdict(content, user_id, verdict);
        if let Err(err) = self.store.append(entry).await {
            tracing::warn!(user_id, error = %err, "Failed to log moderation result");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
