pub mod gemini_client;

pub use gemini_client::{GeminiClient, DEFAULT_GEMINI_BASE_URL};
