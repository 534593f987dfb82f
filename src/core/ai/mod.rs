pub mod models;
pub mod provider;

pub use models::{AiConfig, AiMessage, AiProviderResponse};
pub use provider::AiProvider;
