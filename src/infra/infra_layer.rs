// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "database.rs"]
pub mod database;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "notifications/mod.rs"]
pub mod notifications;
