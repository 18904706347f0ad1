use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::category::Classification;

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Takes the first choice's content, trimmed.
pub fn parse_completion(body: &str) -> Result<Classification> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| Error::ParseError(format!("Failed to parse completion: {}", e)))?;

    if let Some(error) = response.error {
        return Err(Error::LLMApi(error.message));
    }

    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::LLMApi("Response contained no choices".to_string()))?
        .message
        .content
        .ok_or_else(|| Error::LLMApi("First choice has no message content".to_string()))?;

    Ok(Classification::from_reply(content))
}

/// Pulls `error.message` out of an error body, falling back to the raw text.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::DeveloperCategory;

    #[test]
    fn test_parse_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "  Large Game Company\n"}},
                {"index": 1, "message": {"role": "assistant", "content": "Indie Developer"}}
            ]
        }"#;

        let classification = parse_completion(body).unwrap();
        assert_eq!(classification.reply, "Large Game Company");
        assert_eq!(classification.category, Some(DeveloperCategory::LargeGameCompany));
    }

    #[test]
    fn test_parse_provider_error() {
        let body = r#"{"error": {"message": "You exceeded your current quota", "type": "insufficient_quota"}}"#;
        let err = parse_completion(body).unwrap_err();
        assert!(matches!(err, Error::LLMApi(ref m) if m.contains("quota")));
    }

    #[test]
    fn test_parse_empty_choices() {
        assert!(matches!(
            parse_completion(r#"{"choices": []}"#).unwrap_err(),
            Error::LLMApi(_)
        ));
        assert!(matches!(
            parse_completion("not json").unwrap_err(),
            Error::ParseError(_)
        ));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"error": {"message": "Invalid API key"}}"#),
            "Invalid API key"
        );
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }
}
