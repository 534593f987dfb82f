// This is the entry point of the campus-pipeline command-line tool.
//
// **Architecture Overview:**
// - `core/` = Business logic (moderation gate, notification dispatcher)
// - `infra/` = Implementations of core traits (Gemini client, SQLite stores)
// - `config.rs` = Environment-driven settings
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run the requested subcommand and print its result as JSON

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::AppConfig;
use crate::core::moderation::{
    ContentFilterLogStore, LogFilter, ModerationService, ModerationVerdict,
};
use crate::core::notifications::{
    NotificationService, NotificationTrigger, DEFAULT_NOTIFICATION_LIMIT,
};
use crate::infra::ai::GeminiClient;
use crate::infra::moderation::SqliteFilterLogStore;
use crate::infra::notifications::SqliteNotificationStore;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;

const DEFAULT_LOG_LIMIT: usize = 20;
const DEFAULT_RETENTION_DAYS: i64 = 30;

// ============================================================================
// CLI DEFINITION
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "campus-pipeline",
    version,
    about = "Content moderation and notifications for the campus social network"
)]
struct Cli {
    /// SQLite database file (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Classify a post or comment before it is published
    Classify {
        /// Text to check
        content: String,

        /// Profile id of the author
        #[arg(long)]
        user: String,
    },

    /// Browse the moderation audit log, newest first
    Logs {
        /// all, rejected or accepted
        #[arg(long, default_value = "all")]
        filter: LogFilter,

        #[arg(short = 'n', long, default_value_t = DEFAULT_LOG_LIMIT)]
        limit: usize,
    },

    /// Create a notification for a social action
    Notify {
        #[command(subcommand)]
        trigger: TriggerCommand,
    },

    /// List a user's notifications, newest first
    Notifications {
        #[arg(long)]
        user: String,

        #[arg(short = 'n', long, default_value_t = DEFAULT_NOTIFICATION_LIMIT)]
        limit: usize,
    },

    /// Count a user's unread notifications
    Unread {
        #[arg(long)]
        user: String,
    },

    /// Mark one notification read
    Read {
        #[arg(long)]
        user: String,

        notification_id: String,
    },

    /// Mark all of a user's notifications read
    ReadAll {
        #[arg(long)]
        user: String,
    },

    /// Delete read notifications older than the retention window
    Prune {
        #[arg(long, default_value_t = DEFAULT_RETENTION_DAYS)]
        older_than_days: i64,
    },
}

#[derive(Debug, Subcommand)]
enum TriggerCommand {
    Like {
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        post: String,
    },
    Comment {
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        post: String,
    },
    Follow {
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        actor: String,
        /// Profile id of the follower
        #[arg(long)]
        actor_id: String,
    },
    Mention {
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        actor: String,
        /// Profile id of whoever wrote the mention
        #[arg(long)]
        actor_id: String,
    },
    System {
        #[arg(long)]
        recipient: String,
        message: String,
    },
}

impl From<TriggerCommand> for NotificationTrigger {
    fn from(command: TriggerCommand) -> Self {
        match command {
            TriggerCommand::Like {
                recipient,
                actor,
                post,
            } => NotificationTrigger::Like {
                recipient_id: recipient,
                actor_name: actor,
                post_id: post,
            },
            TriggerCommand::Comment {
                recipient,
                actor,
                post,
            } => NotificationTrigger::Comment {
                recipient_id: recipient,
                actor_name: actor,
                post_id: post,
            },
            TriggerCommand::Follow {
                recipient,
                actor,
                actor_id,
            } => NotificationTrigger::Follow {
                recipient_id: recipient,
                actor_name: actor,
                actor_id,
            },
            TriggerCommand::Mention {
                recipient,
                actor,
                actor_id,
            } => NotificationTrigger::Mention {
                recipient_id: recipient,
                actor_name: actor,
                actor_id,
            },
            TriggerCommand::System { recipient, message } => NotificationTrigger::System {
                recipient_id: recipient,
                message,
            },
        }
    }
}

/// What `classify` prints: the verdict plus the message to show the author.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyOutput<'a> {
    #[serde(flatten)]
    verdict: &'a ModerationVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

fn moderation_gate(
    config: &AppConfig,
    log_store: SqliteFilterLogStore,
) -> Result<ModerationService<GeminiClient, SqliteFilterLogStore>> {
    let client = GeminiClient::with_options(
        config.require_api_key()?.to_string(),
        config.gemini_api_base.clone(),
        config.classifier_timeout,
    )
    .context("Failed to build Gemini HTTP client")?;

    Ok(ModerationService::new(
        client,
        log_store,
        config.moderation_prompt.clone(),
        config.classifier_config(),
    ))
}

/// Start of the retention window, `days` before `now`.
fn retention_cutoff(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    if days < 0 {
        bail!("--older-than-days must not be negative (got {days})");
    }
    TimeDelta::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .with_context(|| format!("--older-than-days {days} is out of range"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Both stores share one pool; only `classify` ever calls the classifier.

    let pool = infra::database::connect(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database_path))?;

    let log_store = SqliteFilterLogStore::new(pool.clone());
    log_store
        .migrate()
        .await
        .context("Failed to migrate moderation log table")?;

    let notification_store = SqliteNotificationStore::new(pool);
    notification_store
        .migrate()
        .await
        .context("Failed to migrate notifications table")?;
    let notifications = NotificationService::new(notification_store);

    match cli.command {
        Commands::Classify { content, user } => {
            let gate = moderation_gate(&config, log_store)?;

            let verdict = gate.classify(&content, &user).await;
            print_json(&ClassifyOutput {
                verdict: &verdict,
                message: verdict.display_reason(),
            })?;

            if !verdict.is_acceptable {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Logs { filter, limit } => {
            let rows = log_store.recent(filter, limit).await?;
            print_json(&rows)?;
        }
        Commands::Notify { trigger } => {
            let notification = notifications.notify(trigger.into()).await?;
            print_json(&notification)?;
        }
        Commands::Notifications { user, limit } => {
            let listed = notifications.list_recent(&user, limit).await?;
            print_json(&listed)?;
        }
        Commands::Unread { user } => {
            let unread = notifications.unread_count(&user).await?;
            print_json(&serde_json::json!({ "user_id": user, "unread": unread }))?;
        }
        Commands::Read {
            user,
            notification_id,
        } => {
            notifications.mark_read(&user, &notification_id).await?;
            let unread = notifications.unread_count(&user).await?;
            print_json(&serde_json::json!({ "user_id": user, "unread": unread }))?;
        }
        Commands::ReadAll { user } => {
            notifications.mark_all_read(&user).await?;
            let unread = notifications.unread_count(&user).await?;
            print_json(&serde_json::json!({ "user_id": user, "unread": unread }))?;
        }
        Commands::Prune { older_than_days } => {
            let cutoff = retention_cutoff(Utc::now(), older_than_days)?;
            let removed = notifications.prune_read(cutoff).await?;
            print_json(&serde_json::json!({ "removed": removed, "cutoff": cutoff }))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
