pub mod ai;
pub mod chat;
pub mod config;
pub mod markdown;
pub mod relay;
pub mod relay_client;
pub mod state;

// Re-export main types for convenience
pub use ai::{GeminiClient, GenerativeModel};
pub use chat::ChatSession;
pub use config::Config;
pub use relay::{EnrichedPrompt, RelayError, ValidPrompt};
pub use relay_client::{ClientError, RelayApi, RelayClient};
pub use state::{ChatRole, Message, MessageId};
