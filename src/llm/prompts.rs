use crate::models::category::DeveloperCategory;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    pub developer: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ClassificationRequest {
    pub fn new(
        developer: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            developer: developer.into(),
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    pub fn to_prompt(&self) -> String {
        let categories = DeveloperCategory::ALL
            .iter()
            .map(DeveloperCategory::label)
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Classify the game developer '{developer}' into one of the following categories: {categories}.\n\
             If the game is developed by multiple developers, choose the most well-known or impactful one \
             based on your judgment, then categorize it into one of the three categories mentioned above.\n\
             Return only the classification result.",
            developer = self.developer,
            categories = categories,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_developer_and_labels() {
        let request = ClassificationRequest::new("Nintendo EPD; Monolith Soft", "gpt-4o", 0.5, 10);
        let prompt = request.to_prompt();

        assert!(prompt.starts_with("Classify the game developer 'Nintendo EPD; Monolith Soft'"));
        assert!(prompt.contains("Large Game Company, Indie Developer, Regional Developer."));
        assert!(prompt.contains("most well-known or impactful one"));
        assert!(prompt.ends_with("Return only the classification result."));
    }
}
