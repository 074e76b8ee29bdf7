use crate::config::EngineConfig;
use crate::models::{ChatMessage, ChatRequest, ChatResponse, JsonSchemaFormat, ResponseFormat};
use anyhow::Result;
use reqwest::Client;
use serde_json::Value;

/// Client for the hosted chat-completions API. One instance is built at
/// startup and shared across requests.
pub struct OpenAiService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiService {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
            model: config.model.clone(),
        }
    }

    /// Issue one chat completion with a structured-output schema and return
    /// the raw message content. Single attempt: no retries, no timeout
    /// beyond the transport defaults.
    pub async fn structured_completion(
        &self,
        messages: Vec<ChatMessage>,
        schema_name: &str,
        schema: Value,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: schema_name.to_string(),
                    schema,
                    strict: true,
                },
            },
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow::anyhow!("OpenAI API error ({}): {}", status, error_text));
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("OpenAI response contained no message content"))
    }
}
