// Core notifications module - creates and tracks per-user notifications.

pub mod notification_models;
pub mod notification_service;

pub use notification_models::*;
pub use notification_service::*;
