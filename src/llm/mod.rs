pub mod provider;
pub mod openai;
pub mod prompts;
pub mod parser;
pub mod rate_limiter;

pub use provider::LLMProvider;
pub use openai::OpenAIProvider;
pub use prompts::ClassificationRequest;
pub use rate_limiter::RateLimiter;
