use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::Config;
use crate::statistics::StatisticsService;
use crate::{initialize_full_client, ClientError, HttpsFullClient};

pub const STATISTICS_TOOL: &str = "getYoutubeStatistics";

/// Upper bound on model round trips for one question.
const MAX_TOOL_ROUNDS: usize = 4;

const SYSTEM_INSTRUCTION: &str = "You are KenAI, a friendly assistant for Kenyan YouTube trends and statistics. \
Always call the getYoutubeStatistics tool with the user's question before answering. \
If the tool result has videoInfo, present its title, channel, views, likes and duration. \
Otherwise use whatever it does contain, such as trendingVideos, musicTrends, channelInfo or comparison. \
If nothing was found, suggest checking the spelling or a related search. \
Politely steer questions about non-Kenyan content back to Kenyan topics. \
Answer in Markdown: bold titles, channel names and numbers, and numbered lists for several items.";

#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("Narration is not configured")]
    NotConfigured,
    #[error("Request error: {0}")]
    RequestError(#[from] hyper::http::Error),
    #[error("HTTP error: {0}")]
    HttpError(#[from] hyper::Error),
    #[error("Legacy HTTP error: {0}")]
    LegacyHttpError(#[from] hyper_util::client::legacy::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Model returned status {0}: {1}")]
    UpstreamStatus(StatusCode, String),
    #[error("Model returned no answer")]
    EmptyAnswer,
    #[error("Model kept calling tools after {0} rounds")]
    TooManyToolRounds(usize),
}

#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, question: &str) -> Result<String, NarrationError>;
}

/// Stand-in used when no model credential is configured.
pub struct DisabledNarrator;

#[async_trait]
impl Narrator for DisabledNarrator {
    async fn narrate(&self, _question: &str) -> Result<String, NarrationError> {
        Err(NarrationError::NotConfigured)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content,
    contents: &'a [Content],
    tools: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn text_content(role: &str, text: &str) -> Content {
    Content {
        role: Some(role.to_string()),
        parts: vec![Part { text: Some(text.to_string()), ..Part::default() }],
    }
}

fn tool_declarations() -> Value {
    json!([{
        "functionDeclarations": [{
            "name": STATISTICS_TOOL,
            "description": "Retrieves Kenyan YouTube statistics based on the user question.",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The user question to guide the statistics retrieval."
                    }
                },
                "required": ["query"]
            }
        }]
    }])
}

pub struct GeminiNarrator {
    client: HttpsFullClient,
    api_base: String,
    api_key: String,
    model: String,
    stats: StatisticsService,
}

impl GeminiNarrator {
    pub fn new(
        client: HttpsFullClient,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        stats: StatisticsService,
    ) -> Self {
        GeminiNarrator {
            client,
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
            stats,
        }
    }

    /// Picks the Gemini narrator when a key is configured, the disabled one otherwise.
    pub fn from_config(config: &Config, stats: StatisticsService) -> Result<Box<dyn Narrator>, ClientError> {
        match &config.gemini_api_key {
            Some(key) => Ok(Box::new(GeminiNarrator::new(
                initialize_full_client()?,
                config.gemini_api_base.clone(),
                key.clone(),
                config.gemini_model.clone(),
                stats,
            ))),
            None => Ok(Box::new(DisabledNarrator)),
        }
    }

    async fn generate(&self, contents: &[Content]) -> Result<Content, NarrationError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        );

        let body = serde_json::to_vec(&GenerateContentRequest {
            system_instruction: Content { role: None, parts: vec![Part { text: Some(SYSTEM_INSTRUCTION.to_string()), ..Part::default() }] },
            contents,
            tools: tool_declarations(),
        })?;

        let req = Request::builder()
            .method(Method::POST)
            .uri(url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .body(Full::new(Bytes::from(body)))?;

        let resp = self.client.request(req).await?;
        let status = resp.status();
        let body_bytes = resp.into_body().collect().await?.to_bytes();

        if status != StatusCode::OK {
            let body_str = String::from_utf8_lossy(&body_bytes).into_owned();
            return Err(NarrationError::UpstreamStatus(status, body_str));
        }

        let response: GenerateContentResponse = serde_json::from_slice(&body_bytes)?;
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or(NarrationError::EmptyAnswer)
    }

    async fn call_tool(&self, call: &FunctionCall, question: &str) -> Value {
        if call.name != STATISTICS_TOOL {
            tracing::warn!(tool = %call.name, "model called an unknown tool");
            return json!({ "error": format!("Unknown tool {}", call.name) });
        }

        let query = call.args.get("query").and_then(Value::as_str).unwrap_or(question);
        let output = self.stats.get_youtube_statistics(query).await;
        let output = serde_json::from_str::<Value>(&output).unwrap_or(Value::String(output));
        json!({ "output": output })
    }
}

#[async_trait]
impl Narrator for GeminiNarrator {
    async fn narrate(&self, question: &str) -> Result<String, NarrationError> {
        let mut contents = vec![text_content("user", question)];

        for _ in 0..MAX_TOOL_ROUNDS {
            let reply = self.generate(&contents).await?;

            let calls: Vec<FunctionCall> = reply
                .parts
                .iter()
                .filter_map(|p| p.function_call.clone())
                .collect();

            if calls.is_empty() {
                let answer: String = reply.parts.iter().filter_map(|p| p.text.as_deref()).collect();
                let answer = answer.trim();
                if answer.is_empty() {
                    return Err(NarrationError::EmptyAnswer);
                }
                return Ok(answer.to_string());
            }

            contents.push(Content { role: Some("model".to_string()), parts: reply.parts });

            let mut responses = Vec::with_capacity(calls.len());
            for call in &calls {
                responses.push(Part {
                    function_response: Some(FunctionResponse {
                        name: call.name.clone(),
                        response: self.call_tool(call, question).await,
                    }),
                    ..Part::default()
                });
            }
            contents.push(Content { role: Some("user".to_string()), parts: responses });
        }

        Err(NarrationError::TooManyToolRounds(MAX_TOOL_ROUNDS))
    }
}
