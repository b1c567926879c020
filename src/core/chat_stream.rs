use std::fmt;
use std::sync::Arc;

use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use memchr::memchr;
use reqwest::StatusCode;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{Content, GenerateContentRequest, GenerateContentResponse, Part, SystemInstruction};
use crate::core::persona::{persona_config, PersonaId};
use crate::utils::url::stream_generate_url;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables consulted for the credential, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Lazy, finite sequence of reply fragments. An `Err` item ends the sequence.
pub type FragmentStream = BoxStream<'static, Result<String, TransportError>>;

/// The outbound call could not be completed or was interrupted.
#[derive(Debug)]
pub enum TransportError {
    /// No credential was found in the environment.
    MissingCredential,

    /// The request could not be sent (DNS, TLS, connection refused, ...).
    Request(reqwest::Error),

    /// The service answered with a non-success status.
    Status {
        status: StatusCode,
        /// Error summary extracted from the response body.
        message: String,
    },

    /// The response body broke off after streaming had started.
    Body(reqwest::Error),

    /// The service reported an error inside the event stream.
    Api { message: String },

    /// An event payload was not valid JSON.
    Decode(serde_json::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::MissingCredential => write!(
                f,
                "No API key configured. Set {} in the environment.",
                API_KEY_ENV_VARS.join(" or ")
            ),
            TransportError::Request(source) => write!(f, "Request failed: {source}"),
            TransportError::Status { status, message } => {
                write!(f, "API Error ({status}): {message}")
            }
            TransportError::Body(source) => write!(f, "Response stream interrupted: {source}"),
            TransportError::Api { message } => write!(f, "API Error: {message}"),
            TransportError::Decode(source) => write!(f, "Malformed stream event: {source}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Request(source) | TransportError::Body(source) => Some(source),
            TransportError::Decode(source) => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRole {
    User,
    Model,
}

impl HistoryRole {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryRole::User => "user",
            HistoryRole::Model => "model",
        }
    }
}

/// One prior turn as sent to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub text: String,
}

impl HistoryEntry {
    pub fn new(role: HistoryRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Anything that can answer a prompt with a stream of text fragments.
pub trait ReplySource: Send + Sync {
    fn stream_reply(
        &self,
        prompt: &str,
        persona: PersonaId,
        history: &[HistoryEntry],
    ) -> FragmentStream;
}

/// Build the request body for `persona`, with `history` first and `prompt` last.
pub fn build_request(
    prompt: &str,
    persona: PersonaId,
    history: &[HistoryEntry],
) -> GenerateContentRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|entry| Content::text(entry.role.as_str(), entry.text.clone()))
        .collect();
    contents.push(Content::text(HistoryRole::User.as_str(), prompt));

    GenerateContentRequest {
        system_instruction: SystemInstruction {
            parts: vec![Part {
                text: persona_config(persona).instruction.to_string(),
            }],
        },
        contents,
    }
}

/// Client for the hosted generation service.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    /// Read the credential from the environment. A missing key is reported
    /// when the first reply is requested, not here.
    pub fn from_env(base_url: impl Into<String>) -> Self {
        let api_key = API_KEY_ENV_VARS
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()));
        if api_key.is_none() {
            warn!("no API key found in {}", API_KEY_ENV_VARS.join(" / "));
        }
        Self::new(base_url, api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

}

impl ReplySource for GeminiClient {
    fn stream_reply(
        &self,
        prompt: &str,
        persona: PersonaId,
        history: &[HistoryEntry],
    ) -> FragmentStream {
        let url = stream_generate_url(&self.base_url, persona_config(persona).model_name);
        let request = build_request(prompt, persona, history);
        Box::pin(sse_fragments(
            self.http.clone(),
            url,
            self.api_key.clone(),
            request,
        ))
    }
}

fn sse_fragments(
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    request: GenerateContentRequest,
) -> impl Stream<Item = Result<String, TransportError>> + Send + 'static {
    async_stream::try_stream! {
        let api_key = api_key.ok_or(TransportError::MissingCredential)?;

        debug!(%url, "opening reply stream");
        let response = http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(TransportError::Request)?;

        let response = ensure_success(response).await?;

        let mut body = response.bytes_stream();
        let mut lines = SseLineBuffer::default();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(TransportError::Body)?;
            lines.push(&chunk);
            while let Some(line) = lines.next_line() {
                for fragment in process_sse_line(&line)? {
                    yield fragment;
                }
            }
        }

        if let Some(line) = lines.finish() {
            for fragment in process_sse_line(&line)? {
                yield fragment;
            }
        }
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    Err(TransportError::Status {
        status,
        message: summarize_error_body(&body),
    })
}

/// Splits a byte stream into trimmed lines, buffering partial lines between chunks.
#[derive(Default)]
struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn next_line(&mut self) -> Option<String> {
        let newline_pos = memchr(b'\n', &self.buffer)?;
        let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }

    fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Fragments carried by one SSE line. Comments, `event:` fields and blank
/// lines carry none.
fn process_sse_line(line: &str) -> Result<Vec<String>, TransportError> {
    match extract_data_payload(line) {
        Some(payload) if !payload.trim().is_empty() && payload != "[DONE]" => {
            decode_event(payload)
        }
        _ => Ok(Vec::new()),
    }
}

fn decode_event(payload: &str) -> Result<Vec<String>, TransportError> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(TransportError::Decode)?;

    if value.get("error").is_some() {
        let message = extract_error_summary(&value).unwrap_or_else(|| payload.trim().to_string());
        return Err(TransportError::Api { message });
    }

    let response: GenerateContentResponse =
        serde_json::from_value(value).map_err(TransportError::Decode)?;
    if let Some(reason) = response.finish_reason() {
        debug!(reason, "reply finished");
    }
    Ok(response.text_fragments().map(str::to_owned).collect())
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
}

fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| extract_error_summary(&value))
        .unwrap_or_else(|| trimmed.to_string())
}

#[derive(Debug)]
pub enum StreamMessage {
    Chunk(String),
    /// Terminal: no further messages follow for this stream.
    Error(TransportError),
    End,
}

pub struct StreamParams {
    pub source: Arc<dyn ReplySource>,
    pub prompt: String,
    pub persona: PersonaId,
    pub history: Vec<HistoryEntry>,
    pub stream_id: u64,
}

/// Drives reply streams on background tasks and forwards their fragments,
/// tagged with a stream id, to the UI event loop.
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                source,
                prompt,
                persona,
                history,
                stream_id,
            } = params;

            let mut fragments = source.stream_reply(&prompt, persona, &history);
            while let Some(item) = fragments.next().await {
                let message = match item {
                    Ok(fragment) => StreamMessage::Chunk(fragment),
                    Err(err) => {
                        let _ = tx.send((StreamMessage::Error(err), stream_id));
                        return;
                    }
                };
                if tx.send((message, stream_id)).is_err() {
                    // Receiver gone: the UI has shut down.
                    return;
                }
            }
            let _ = tx.send((StreamMessage::End, stream_id));
        });
    }
}
