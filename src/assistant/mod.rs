//! Chat assistant: intent extraction, gateway lookup and LLM analysis.

mod intent;
mod llm;
mod orchestrator;

pub use intent::{Intent, extract_intent};
pub use llm::{AnthropicChatModel, ChatModel};
pub use orchestrator::{ChatOrchestrator, ChatReply};
