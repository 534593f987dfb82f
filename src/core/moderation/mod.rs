// Core moderation module - classifies user content before it is published.
// Following the same pattern as the notifications module.

pub mod moderation_models;
pub mod moderation_service;
pub mod verdict_parser;

pub use moderation_models::*;
pub use moderation_service::*;
