/// Natural-language recommendation generator
///
/// The single AI call per request: maps a free-text mood to an ordered list
/// of candidate title strings plus a conversational reply. Failures here are
/// fatal to the whole pipeline run, so unlike the catalog client this trait
/// surfaces errors. No retry is attempted.
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Inputs for one generation call
#[derive(Debug, Clone)]
pub struct GeneratorRequest {
    pub prompt: String,
    pub desired_count: u32,
    /// Human-readable content-type labels, e.g. ["movies", "TV shows"]
    pub content_labels: Vec<String>,
    pub region: String,
    pub language: String,
}

/// What the generator hands back: candidate titles in its preferred order
/// plus a short conversational reply for the user
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GeneratedRecommendations {
    pub titles: Vec<String>,
    pub reply: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationGenerator: Send + Sync {
    async fn generate(&self, request: &GeneratorRequest) -> AppResult<GeneratedRecommendations>;
}

// ============================================================================
// OpenAI-compatible chat-completions implementation
// ============================================================================

const SYSTEM_PROMPT: &str = "You are a film and TV recommendation assistant. \
    Reply with a JSON object of the form {\"titles\": [...], \"reply\": \"...\"}: \
    \"titles\" is an ordered list of real, existing title names best matching the \
    request, \"reply\" is one short conversational sentence for the user in the \
    user's language. Do not invent titles.";

#[derive(Clone)]
pub struct OpenAiGenerator {
    http_client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key,
            api_url,
            model,
        }
    }

    fn build_user_prompt(request: &GeneratorRequest) -> String {
        format!(
            "Recommend {count} {labels} for this request: \"{prompt}\". \
             The user is in region {region} and speaks {language}.",
            count = request.desired_count,
            labels = request.content_labels.join(" or "),
            prompt = request.prompt,
            region = request.region,
            language = request.language,
        )
    }

    fn parse_content(content: &str) -> AppResult<GeneratedRecommendations> {
        serde_json::from_str(content)
            .map_err(|e| AppError::Generator(format!("Malformed generator reply: {}", e)))
    }
}

#[async_trait::async_trait]
impl RecommendationGenerator for OpenAiGenerator {
    async fn generate(&self, request: &GeneratorRequest) -> AppResult<GeneratedRecommendations> {
        let user_prompt = Self::build_user_prompt(request);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let url = format!("{}/chat/completions", self.api_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Generator(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generator(format!(
                "Generator returned status {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generator(e.to_string()))?;

        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| AppError::Generator("Generator returned no choices".to_string()))?;

        let generated = Self::parse_content(content)?;

        tracing::info!(
            titles = generated.titles.len(),
            model = %self.model,
            "Recommendations generated"
        );

        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_user_prompt_mentions_count_and_labels() {
        let request = GeneratorRequest {
            prompt: "something cozy for a rainy evening".to_string(),
            desired_count: 5,
            content_labels: vec!["movies".to_string(), "TV shows".to_string()],
            region: "US".to_string(),
            language: "en-US".to_string(),
        };

        let prompt = OpenAiGenerator::build_user_prompt(&request);
        assert!(prompt.contains("Recommend 5 movies or TV shows"));
        assert!(prompt.contains("something cozy for a rainy evening"));
        assert!(prompt.contains("region US"));
    }

    #[test]
    fn test_parse_content_valid_json() {
        let content = r#"{"titles": ["The Matrix", "Inception"], "reply": "Two mind-benders!"}"#;
        let parsed = OpenAiGenerator::parse_content(content).unwrap();
        assert_eq!(parsed.titles, vec!["The Matrix", "Inception"]);
        assert_eq!(parsed.reply, "Two mind-benders!");
    }

    #[test]
    fn test_parse_content_malformed_json_is_generator_error() {
        let result = OpenAiGenerator::parse_content("not json at all");
        assert!(matches!(result, Err(AppError::Generator(_))));
    }
}
