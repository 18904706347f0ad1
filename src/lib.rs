pub mod config;
pub mod error;
pub mod models;
pub mod llm;
pub mod classification;
pub mod storage;

pub use config::{Config, Credentials, MissingPolicy, PipelineConfig};
pub use error::{Error, Result};
pub use llm::{LLMProvider, OpenAIProvider};
pub use classification::{ClassificationPipeline, ClassificationReport};
pub use storage::Storage;
