// Moderation domain models - verdicts and the audit log.
//
// These are pure domain types with no storage or HTTP dependencies.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reason attached to verdicts when the classifier could not be reached.
pub const SERVICE_UNAVAILABLE_REASON: &str =
    "Content moderation service unavailable. Please try again.";

/// Reason attached to verdicts when the classifier reply could not be understood.
pub const ANALYSIS_FAILED_REASON: &str = "Failed to analyze content. Please try again.";

/// Shown to the author when a rejected verdict carries no reason of its own.
pub const GENERIC_REJECTION_MESSAGE: &str =
    "This content doesn't meet our community guidelines.";

/// The single label the classifier assigns to a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentCategory {
    Profanity,
    SelfAdvertisement,
    HateSpeech,
    Harassment,
    Acceptable,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 5] = [
        ContentCategory::Profanity,
        ContentCategory::SelfAdvertisement,
        ContentCategory::HateSpeech,
        ContentCategory::Harassment,
        ContentCategory::Acceptable,
    ];

    /// Wire and storage spelling, e.g. `SELF_ADVERTISEMENT`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Profanity => "PROFANITY",
            ContentCategory::SelfAdvertisement => "SELF_ADVERTISEMENT",
            ContentCategory::HateSpeech => "HATE_SPEECH",
            ContentCategory::Harassment => "HARASSMENT",
            ContentCategory::Acceptable => "ACCEPTABLE",
        }
    }

    /// Whether this label names a policy violation.
    pub fn is_violation(&self) -> bool {
        !matches!(self, ContentCategory::Acceptable)
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown content category: {s}"))
    }
}

/// Outcome of classifying one piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationVerdict {
    pub is_acceptable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub category: ContentCategory,
}

impl ModerationVerdict {
    pub fn accepted() -> Self {
        Self {
            is_acceptable: true,
            reason: None,
            category: ContentCategory::Acceptable,
        }
    }

    pub fn rejected(category: ContentCategory, reason: Option<String>) -> Self {
        Self {
            is_acceptable: false,
            reason,
            category,
        }
    }

    /// Fail-closed verdict for a classifier that could not be reached.
    ///
    /// Keeps the `ACCEPTABLE` label so rows written by earlier versions and
    /// new rows read the same way in the audit log.
    pub fn service_unavailable() -> Self {
        Self::rejected(
            ContentCategory::Acceptable,
            Some(SERVICE_UNAVAILABLE_REASON.to_string()),
        )
    }

    /// Fail-closed verdict for a classifier reply that could not be parsed.
    pub fn analysis_failed() -> Self {
        Self::rejected(
            ContentCategory::Acceptable,
            Some(ANALYSIS_FAILED_REASON.to_string()),
        )
    }

    /// True for the synthetic verdicts produced when classification itself failed.
    pub fn is_classifier_failure(&self) -> bool {
        !self.is_acceptable && self.category == ContentCategory::Acceptable
    }

    /// Message to show the author of rejected content.
    pub fn display_reason(&self) -> Option<&str> {
        if self.is_acceptable {
            return None;
        }
        Some(self.reason.as_deref().unwrap_or(GENERIC_REJECTION_MESSAGE))
    }
}

/// One row of the append-only moderation audit log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentFilterLogEntry {
    pub id: i64,
    pub content: String,
    pub user_id: String,
    pub is_acceptable: bool,
    pub reason: Option<String>,
    pub category: ContentCategory,
    pub created_at: DateTime<Utc>,
}

/// Values written for a new log row. The store assigns `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContentFilterLog {
    pub content: String,
    pub user_id: String,
    pub is_acceptable: bool,
    pub reason: Option<String>,
    pub category: ContentCategory,
    pub created_at: DateTime<Utc>,
}

impl NewContentFilterLog {
    pub fn from_verdict(content: &str, user_id: &str, verdict: &ModerationVerdict) -> Self {
        Self {
            content: content.to_string(),
            user_id: user_id.to_string(),
            is_acceptable: verdict.is_acceptable,
            reason: verdict.reason.clone(),
            category: verdict.category,
            // Stored with microsecond precision; truncate so reads compare equal.
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}

/// Which audit rows to return when browsing the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFilter {
    #[default]
    All,
    Rejected,
    Accepted,
}

impl LogFilter {
    /// The `is_acceptable` value rows must have, or `None` for no restriction.
    pub fn acceptance(&self) -> Option<bool> {
        match self {
            LogFilter::All => None,
            LogFilter::Rejected => Some(false),
            LogFilter::Accepted => Some(true),
        }
    }
}

impl FromStr for LogFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(LogFilter::All),
            "rejected" => Ok(LogFilter::Rejected),
            "accepted" => Ok(LogFilter::Accepted),
            other => Err(format!(
                "unknown log filter '{other}' (expected all, rejected or accepted)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_str() {
        for category in ContentCategory::ALL {
            assert_eq!(category.as_str().parse::<ContentCategory>(), Ok(category));
        }
        assert!("SPAM".parse::<ContentCategory>().is_err());
    }

    #[test]
    fn test_category_serde_matches_storage_spelling() {
        let json = serde_json::to_string(&ContentCategory::SelfAdvertisement).unwrap();
        assert_eq!(json, "\"SELF_ADVERTISEMENT\"");
    }

    #[test]
    fn test_failure_verdicts_are_flagged() {
        assert!(ModerationVerdict::service_unavailable().is_classifier_failure());
        assert!(ModerationVerdict::analysis_failed().is_classifier_failure());
        assert!(!ModerationVerdict::accepted().is_classifier_failure());
        assert!(!ModerationVerdict::rejected(ContentCategory::Profanity, None).is_classifier_failure());
    }

    #[test]
    fn test_display_reason_falls_back_to_generic_message() {
        let verdict = ModerationVerdict::rejected(ContentCategory::Harassment, None);
        assert_eq!(verdict.display_reason(), Some(GENERIC_REJECTION_MESSAGE));

        let verdict = ModerationVerdict::rejected(
            ContentCategory::Harassment,
            Some("personal attack".to_string()),
        );
        assert_eq!(verdict.display_reason(), Some("personal attack"));

        assert_eq!(ModerationVerdict::accepted().display_reason(), None);
    }

    #[test]
    fn test_log_filter_parsing() {
        assert_eq!("Rejected".parse::<LogFilter>(), Ok(LogFilter::Rejected));
        assert_eq!("all".parse::<LogFilter>().unwrap().acceptance(), None);
        assert!("pending".parse::<LogFilter>().is_err());
    }
}
