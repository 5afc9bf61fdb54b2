//! Gateway for OpenAI-compatible chat-completions services (Groq by default).

use crate::backend::{ModelConfig, ModelGateway};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use toolchat_conversation::{Message, MessageRole, ToolCallRequest, ToolDescriptor, Transcript};
use toolchat_core::{ApiKey, InvocationId};
use tracing::{debug, instrument, warn};

/// Model gateway speaking the `/chat/completions` protocol.
#[derive(Debug)]
pub struct OpenAiGateway {
    client: Client,
    config: ModelConfig,
    api_key: ApiKey,
    tools: Vec<WireTool>,
}

impl OpenAiGateway {
    /// Creates a gateway. Requests time out after `config.timeout_seconds`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::InvalidConfig`] if the API key is empty or the
    /// HTTP client cannot be built.
    pub fn new(config: ModelConfig, api_key: ApiKey) -> Result<Self, Report<LlmError>> {
        if api_key.is_empty() {
            return Err(LlmError::InvalidConfig {
                reason: "model API key is not set".to_string(),
            }
            .into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: format!("HTTP client error: {e}"),
            })?;

        Ok(Self {
            client,
            config,
            api_key,
            tools: Vec::new(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request<'a>(&'a self, transcript: &'a Transcript) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.name,
            messages: transcript.messages().iter().map(WireMessage::from).collect(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            tools: (!self.tools.is_empty()).then_some(self.tools.as_slice()),
            tool_choice: (!self.tools.is_empty()).then_some("auto"),
        }
    }

    fn transport_error(&self, e: &reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::ProviderUnavailable {
                provider: self.config.base_url.clone(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    fn advertise(&mut self, tools: &[ToolDescriptor]) {
        self.tools = tools.iter().map(WireTool::from).collect();
    }

    #[instrument(
        skip_all,
        fields(invocation = %InvocationId::new(), model = %self.config.name, messages = transcript.len())
    )]
    async fn infer(&self, transcript: &Transcript) -> Result<Message, Report<LlmError>> {
        let request = self.build_request(transcript);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(LlmError::RateLimited { retry_after_secs }.into());
        }
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                status: status.as_u16(),
                reason,
            }
            .into());
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseParseFailed {
                reason: e.to_string(),
            })?;
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ResponseParseFailed {
                reason: "response contained no choices".to_string(),
            })?;

        let message = choice.message.into_message();
        debug!(
            finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
            tool_calls = message.tool_calls.len(),
            "model replied"
        );
        Ok(message)
    }

    fn model(&self) -> &str {
        &self.config.name
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [WireTool]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    /// Null for an assistant message that only requests tools.
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

impl<'a> From<&'a Message> for WireMessage<'a> {
    fn from(message: &'a Message) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::ToolResult => "tool",
        };
        let content = if message.has_tool_calls() && message.content.is_empty() {
            None
        } else {
            Some(message.content.as_str())
        };

        Self {
            role,
            content,
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.id.as_str(),
                    kind: "function",
                    function: WireFunctionCall {
                        name: &call.name,
                        arguments: &call.arguments,
                    },
                })
                .collect(),
            tool_call_id: message.tool_call_id.as_ref().map(|id| id.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireToolCall<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionCall<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunctionCall<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: JsonValue,
}

impl From<&ToolDescriptor> for WireTool {
    fn from(descriptor: &ToolDescriptor) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: descriptor.name.clone(),
                description: descriptor.description.clone(),
                parameters: descriptor.input_schema(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

impl ResponseMessage {
    fn into_message(self) -> Message {
        self.tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .fold(
                Message::assistant(self.content.unwrap_or_default()),
                |message, (index, call)| message.with_tool_call(call.into_request(index)),
            )
    }
}

/// A tool call as sent by the server. Every field is optional so that one
/// malformed entry reaches dispatch instead of failing the whole reply.
#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: ResponseFunction,
}

impl ResponseToolCall {
    fn into_request(self, index: usize) -> ToolCallRequest {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => {
                warn!(index, "tool call without id");
                format!("generated_{index}")
            }
        };
        let arguments = self.function.arguments_text();
        ToolCallRequest::new(id, self.function.name, arguments)
    }
}

/// An empty name is dispatched like any unknown tool.
#[derive(Debug, Default, Deserialize)]
struct ResponseFunction {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: JsonValue,
}

impl ResponseFunction {
    /// Arguments are specified as a JSON string, but some servers send the object itself.
    fn arguments_text(&self) -> String {
        match &self.arguments {
            JsonValue::String(text) => text.clone(),
            JsonValue::Null => "{}".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolchat_conversation::{ParamType, ToolCallId};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer) -> OpenAiGateway {
        let config = ModelConfig::default().with_base_url(server.uri());
        OpenAiGateway::new(config, ApiKey::new("test-key")).expect("gateway")
    }

    fn reply(message: JsonValue) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "chatcmpl-1",
            "model": "llama3-8b-8192",
            "choices": [{ "index": 0, "message": message, "finish_reason": "stop" }]
        }))
    }

    async fn sent_body(server: &MockServer) -> JsonValue {
        let requests = server.received_requests().await.expect("recording enabled");
        requests
            .last()
            .expect("one request")
            .body_json()
            .expect("json body")
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = OpenAiGateway::new(ModelConfig::default(), ApiKey::default()).unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn advertise_replaces_previous_tools() {
        let mut gateway =
            OpenAiGateway::new(ModelConfig::default(), ApiKey::new("k")).expect("gateway");
        let mul = ToolDescriptor::new("mul", "Multiply two numbers.")
            .with_parameter("a", ParamType::Integer)
            .with_parameter("b", ParamType::Integer);

        gateway.advertise(std::slice::from_ref(&mul));
        gateway.advertise(std::slice::from_ref(&mul));

        assert_eq!(gateway.tools.len(), 1);
        assert_eq!(gateway.tools[0].function.name, "mul");
        assert_eq!(gateway.tools[0].function.parameters, mul.input_schema());
    }

    #[tokio::test]
    async fn infer_returns_plain_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(reply(serde_json::json!({
                "role": "assistant",
                "content": "Hello there!"
            })))
            .mount(&server)
            .await;

        let transcript = Transcript::new("be helpful");
        let message = gateway_for(&server).infer(&transcript).await.expect("infer");

        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.content, "Hello there!");
        assert!(!message.has_tool_calls());

        let body = sent_body(&server).await;
        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["max_tokens"], 1024);
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[tokio::test]
    async fn infer_parses_tool_calls_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(reply(serde_json::json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [
                    {
                        "id": "call_w",
                        "type": "function",
                        "function": { "name": "get_weather", "arguments": "{\"city\":\"paris\"}" }
                    },
                    {
                        "id": "call_m",
                        "type": "function",
                        "function": { "name": "mul", "arguments": { "a": 6, "b": 7 } }
                    }
                ]
            })))
            .mount(&server)
            .await;

        let transcript = Transcript::new("be helpful");
        let message = gateway_for(&server).infer(&transcript).await.expect("infer");

        assert_eq!(message.content, "");
        let calls: Vec<_> = message
            .tool_calls
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str(), c.arguments.as_str()))
            .collect();
        assert_eq!(
            calls,
            [
                ("call_w", "get_weather", r#"{"city":"paris"}"#),
                ("call_m", "mul", r#"{"a":6,"b":7}"#),
            ]
        );
    }

    #[tokio::test]
    async fn infer_sends_transcript_and_advertised_tools() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(reply(serde_json::json!({ "content": "It is 42." })))
            .mount(&server)
            .await;

        let mut gateway = gateway_for(&server);
        gateway.advertise(&[ToolDescriptor::new("mul", "Multiply two numbers.")
            .with_parameter("a", ParamType::Integer)
            .with_parameter("b", ParamType::Integer)]);

        let mut transcript = Transcript::new("be helpful");
        transcript.append(Message::user("6 times 7?")).expect("user");
        transcript
            .append(
                Message::assistant("")
                    .with_tool_call(ToolCallRequest::new("call_1", "mul", r#"{"a":6,"b":7}"#)),
            )
            .expect("assistant");
        transcript
            .append(Message::tool_result(ToolCallId::new("call_1"), "42"))
            .expect("result");

        gateway.infer(&transcript).await.expect("infer");

        let body = sent_body(&server).await;
        let roles: Vec<_> = body["messages"]
            .as_array()
            .expect("messages")
            .iter()
            .map(|m| m["role"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(roles, ["system", "user", "assistant", "tool"]);

        let assistant = &body["messages"][2];
        assert!(assistant["content"].is_null());
        assert_eq!(assistant["tool_calls"][0]["id"], "call_1");
        assert_eq!(assistant["tool_calls"][0]["type"], "function");
        assert_eq!(assistant["tool_calls"][0]["function"]["arguments"], r#"{"a":6,"b":7}"#);

        let tool = &body["messages"][3];
        assert_eq!(tool["tool_call_id"], "call_1");
        assert_eq!(tool["content"], "42");

        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "mul");
        assert_eq!(
            body["tools"][0]["function"]["parameters"]["required"],
            serde_json::json!(["a", "b"])
        );
    }

    #[tokio::test]
    async fn malformed_tool_calls_still_parse() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(reply(serde_json::json!({
                "content": null,
                "tool_calls": [
                    { "type": "function", "function": { "name": "mul", "arguments": "{\"a\":2,\"b\":3}" } },
                    { "id": "call_x", "type": "function", "function": { "arguments": "{}" } },
                    { "id": "call_y", "type": "function" }
                ]
            })))
            .mount(&server)
            .await;

        let message = gateway_for(&server)
            .infer(&Transcript::new("be helpful"))
            .await
            .expect("infer");

        let calls: Vec<_> = message
            .tool_calls
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str(), c.arguments.as_str()))
            .collect();
        assert_eq!(
            calls,
            [
                ("generated_0", "mul", r#"{"a":2,"b":3}"#),
                ("call_x", "", "{}"),
                ("call_y", "", "{}"),
            ]
        );
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = gateway_for(&server)
            .infer(&Transcript::new("be helpful"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("status 401"));
    }

    #[tokio::test]
    async fn rate_limit_reports_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
            .mount(&server)
            .await;

        let err = gateway_for(&server)
            .infer(&Transcript::new("be helpful"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("retry after 3s"));
    }

    #[tokio::test]
    async fn reply_without_choices_fails_to_parse() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = gateway_for(&server)
            .infer(&Transcript::new("be helpful"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }
}
