pub mod providers;

pub use providers::{ConversationProvider, ProviderError};
