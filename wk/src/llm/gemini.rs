//! Google Gemini client (Generative Language API, `generateContent`)

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::http::post_json;
use super::{
    CompletionRequest, CompletionResponse, ContentBlock, LlmClient, LlmError, Message, MessageContent, Role,
    StopReason, TokenUsage, ToolCall,
};
use crate::config::LlmConfig;

/// Gemini API client
pub struct GeminiClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    temperature: f32,
}

impl GeminiClient {
    /// Create a new client from configuration
    ///
    /// Fails when the configured API key variable is unset.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, "GeminiClient::from_config: called");
        let api_key = config
            .api_key()
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    /// Build the request body for `generateContent`
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");

        let mut body = serde_json::json!({
            "contents": convert_messages(&request.messages),
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": request.max_tokens.min(self.max_tokens),
            },
        });

        if !request.system_prompt.is_empty() {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": request.system_prompt }],
            });
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!([{
                "functionDeclarations": request.tools.iter().map(|t| t.to_gemini_declaration()).collect::<Vec<_>>(),
            }]);
        }

        body
    }
}

/// Convert internal messages to Gemini `contents`
///
/// Gemini function responses are keyed by function name rather than call ID,
/// so names are remembered from earlier tool-use blocks.
fn convert_messages(messages: &[Message]) -> Vec<serde_json::Value> {
    debug!(message_count = %messages.len(), "convert_messages: called");
    let mut call_names: HashMap<String, String> = HashMap::new();
    let mut contents = Vec::new();

    for msg in messages {
        let role = match msg.role {
            Role::User => "user",
            Role::Assistant => "model",
        };

        let parts: Vec<serde_json::Value> = match &msg.content {
            MessageContent::Text(text) => vec![serde_json::json!({ "text": text })],
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => serde_json::json!({ "text": text }),
                    ContentBlock::ToolUse { id, name, input } => {
                        call_names.insert(id.clone(), name.clone());
                        serde_json::json!({
                            "functionCall": { "name": name, "args": input }
                        })
                    }
                    ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        is_error,
                    } => {
                        let name = call_names.get(tool_use_id).cloned().unwrap_or_else(|| tool_use_id.clone());
                        serde_json::json!({
                            "functionResponse": {
                                "name": name,
                                "response": { "content": content, "is_error": is_error }
                            }
                        })
                    }
                })
                .collect(),
        };

        contents.push(serde_json::json!({ "role": role, "parts": parts }));
    }

    contents
}

/// Parse a `generateContent` response
fn parse_response(api_response: GeminiResponse) -> Result<CompletionResponse, LlmError> {
    let candidate = api_response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("Gemini returned no candidates (prompt blocked?)".to_string()))?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for part in candidate.content.and_then(|c| c.parts).unwrap_or_default() {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(call) = part.function_call {
            tool_calls.push(ToolCall {
                id: format!("call_{}", uuid::Uuid::now_v7().simple()),
                name: call.name,
                input: call.args.unwrap_or(serde_json::json!({})),
            });
        }
    }

    let stop_reason = if !tool_calls.is_empty() {
        StopReason::ToolUse
    } else {
        candidate
            .finish_reason
            .as_deref()
            .map(StopReason::from_gemini)
            .unwrap_or(StopReason::EndTurn)
    };

    let usage = api_response
        .usage_metadata
        .map(|u| TokenUsage {
            input_tokens: u.prompt_token_count.unwrap_or(0),
            output_tokens: u.candidates_token_count.unwrap_or(0),
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content: if text.is_empty() { None } else { Some(text) },
        tool_calls,
        stop_reason,
        usage,
    })
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "GeminiClient::complete: called");
        let body = self.build_request_body(&request);
        let api_response: GeminiResponse = post_json(&self.http, &self.endpoint(), None, &body).await?;
        parse_response(api_response)
    }
}

// Gemini API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolDefinition;

    fn client() -> GeminiClient {
        GeminiClient {
            model: "gemini-1.5-flash".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            http: Client::new(),
            max_tokens: 2048,
            temperature: 0.1,
        }
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            client().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key=test-key"
        );
    }

    #[test]
    fn test_build_request_body_basic() {
        let request = CompletionRequest {
            system_prompt: "Answer from the index".to_string(),
            messages: vec![Message::user("Hello"), Message::assistant("Hi")],
            tools: vec![],
            max_tokens: 4096,
        };

        let body = client().build_request_body(&request);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Answer from the index");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_build_request_body_with_tools() {
        let mut request = CompletionRequest::prompt("Hi", 100);
        request.tools = vec![ToolDefinition::new("Wikipedia", "search", serde_json::json!({"type": "object"}))];

        let body = client().build_request_body(&request);
        assert!(body.get("systemInstruction").is_none());
        assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "Wikipedia");
    }

    #[test]
    fn test_function_response_uses_call_name() {
        let messages = vec![
            Message::assistant_blocks(vec![ContentBlock::ToolUse {
                id: "call_1".to_string(),
                name: "Wikipedia".to_string(),
                input: serde_json::json!({"input": "paris"}),
            }]),
            Message::user_blocks(vec![ContentBlock::tool_result("call_1", "Paris is in France", false)]),
        ];

        let contents = convert_messages(&messages);
        assert_eq!(contents[0]["parts"][0]["functionCall"]["name"], "Wikipedia");
        assert_eq!(contents[1]["parts"][0]["functionResponse"]["name"], "Wikipedia");
        assert_eq!(
            contents[1]["parts"][0]["functionResponse"]["response"]["content"],
            "Paris is in France"
        );
    }

    #[test]
    fn test_parse_text_response() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "[\"paris\", "}, {"text": "\"lagos\"]"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 40, "candidatesTokenCount": 7}
        }"#;

        let response = parse_response(serde_json::from_str(raw).unwrap()).unwrap();
        assert_eq!(response.content.as_deref(), Some("[\"paris\", \"lagos\"]"));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.input_tokens, 40);
        assert_eq!(response.usage.output_tokens, 7);
    }

    #[test]
    fn test_parse_function_call_response() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [{"functionCall": {"name": "Wikipedia", "args": {"input": "lao"}}}]},
                "finishReason": "STOP"
            }]
        }"#;

        let response = parse_response(serde_json::from_str(raw).unwrap()).unwrap();
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert!(response.content.is_none());
        assert_eq!(response.tool_calls[0].name, "Wikipedia");
        assert_eq!(response.tool_calls[0].input["input"], "lao");
        assert!(response.tool_calls[0].id.starts_with("call_"));
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        assert!(matches!(
            parse_response(serde_json::from_str(raw).unwrap()),
            Err(LlmError::InvalidResponse(_))
        ));
    }
}
