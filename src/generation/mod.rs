//! Answer generation with the LLM

pub mod anthropic;
pub mod prompt;

pub use anthropic::AnthropicClient;
pub use prompt::PromptBuilder;
