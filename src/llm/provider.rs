use async_trait::async_trait;
use crate::error::Result;
use crate::llm::prompts::ClassificationRequest;
use crate::models::category::Classification;

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn classify_developer(&self, request: &ClassificationRequest) -> Result<Classification>;
    fn name(&self) -> &str;
}
