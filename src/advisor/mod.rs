//! Generative-model backed flows: discovery, chat and price aggregation.

pub mod chat;
pub mod discovery;
pub mod model;
pub mod prices;

pub use model::{ChatMessage, ChatRole, ModelConfig, ModelHandle};
