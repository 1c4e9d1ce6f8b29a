pub mod anthropic;
pub mod factory;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use factory::create_provider;
pub use openai::OpenAIProvider;
