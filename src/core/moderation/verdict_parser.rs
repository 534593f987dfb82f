// Turns the classifier's free-form text reply into a `ModerationVerdict`.
//
// Models are asked for a bare JSON object but regularly wrap it in a
// markdown code fence anyway, so the fence is stripped before parsing.

use super::moderation_models::{ContentCategory, ModerationVerdict};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerdictParseError {
    #[error("classifier reply is not a valid verdict: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("classifier rejected content without naming a violation")]
    Incoherent,
}

/// Exact shape the classifier is instructed to return.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifierReply {
    is_acceptable: bool,
    #[serde(default)]
    reason: Option<String>,
    category: ContentCategory,
}

/// Removes a surrounding markdown code fence (```` ``` ```` or ```` ```json ````)
/// and outer whitespace. Text without a fence is only trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.split_once('\n') {
            // Only treat the first line as a language tag if it looks like one.
            Some((tag, body)) if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) => body,
            _ => rest.strip_prefix("json").unwrap_or(rest),
        };
    }

    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Parses a classifier reply into a verdict.
///
/// The category is authoritative: a violation label always rejects, even if
/// the reply also claims the content is acceptable. A rejection labelled
/// `ACCEPTABLE` is incoherent and reported as an error so the caller can
/// fall back to its failure verdict.
pub fn parse_verdict(raw: &str) -> Result<ModerationVerdict, VerdictParseError> {
    let reply: ClassifierReply = serde_json::from_str(strip_code_fences(raw))?;

    let reason = reply
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    match (reply.category.is_violation(), reply.is_acceptable) {
        (true, _) => Ok(ModerationVerdict::rejected(reply.category, reason)),
        (false, true) => Ok(ModerationVerdict::accepted()),
        (false, false) => Err(VerdictParseError::Incoherent),
    }
}
