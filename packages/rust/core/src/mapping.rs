//! Field → knowledge-base path mapping.
//!
//! The model sees the scraped fields and the whole knowledge base and answers
//! with a JSON object of `label → path`. Its output is treated as untrusted
//! text: the first `{...}` block is extracted and anything unusable degrades
//! to an empty map rather than an error.

use std::future::Future;
use std::path::Path;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use formfill_shared::{FieldDescriptor, FormFillError, OpenRouterConfig, QueryMap, Result};

/// User-Agent string for model requests.
const USER_AGENT: &str = concat!("FormFill/", env!("CARGO_PKG_VERSION"));

/// Longest slice of a bad response quoted in logs and errors.
const MAX_EXCERPT: usize = 200;

/// Matches the outermost `{...}` block, across newlines.
static JSON_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("JSON object regex"));

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Produces a query map for a set of fields.
pub trait MappingGenerator: Send + Sync {
    /// Map each field label to a path into `schema`.
    fn generate(
        &self,
        fields: &[FieldDescriptor],
        schema: &Value,
    ) -> impl Future<Output = Result<QueryMap>> + Send;

    /// Human-readable generator name for reports and tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Chat completion protocol types
// ---------------------------------------------------------------------------

/// Request body for `POST /chat/completions`.
#[derive(Debug, serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// The subset of the completion response we read.
#[derive(Debug, serde::Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, serde::Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, serde::Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

// ---------------------------------------------------------------------------
// OpenRouter generator
// ---------------------------------------------------------------------------

/// Mapping generator backed by an OpenAI-compatible chat completion API.
#[derive(Debug, Clone)]
pub struct OpenRouterMapper {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterMapper {
    pub fn new(config: &OpenRouterConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FormFillError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.default_model.clone(),
        })
    }

    /// Override the model id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Send one prompt and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| FormFillError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FormFillError::Mapping(format!(
                "model request failed: HTTP {status}: {}",
                excerpt(&body)
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| FormFillError::Mapping(format!("invalid completion response: {e}")))?;

        if let Some(usage) = &body.usage {
            info!(
                model = %self.model,
                tokens_in = usage.prompt_tokens,
                tokens_out = usage.completion_tokens,
                latency_ms = started.elapsed().as_millis() as u64,
                "model call complete"
            );
        }

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| FormFillError::Mapping("completion response has no content".into()))
    }
}

impl MappingGenerator for OpenRouterMapper {
    #[instrument(skip_all, fields(model = %self.model, fields = fields.len()))]
    async fn generate(&self, fields: &[FieldDescriptor], schema: &Value) -> Result<QueryMap> {
        let prompt = build_prompt(fields, schema)?;
        let reply = self.complete(&prompt).await?;
        debug!(reply_len = reply.len(), "model replied");
        Ok(parse_query_map(&reply))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Static generator
// ---------------------------------------------------------------------------

/// Generator that returns a fixed map (hand-written mappings and tests).
#[derive(Debug, Clone, Default)]
pub struct StaticMapper {
    map: QueryMap,
}

impl StaticMapper {
    pub fn new(map: QueryMap) -> Self {
        Self { map }
    }

    /// Load a JSON object of `label → path` from disk.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FormFillError::io(path, e))?;
        let object: Map<String, Value> = serde_json::from_str(&content).map_err(|e| {
            FormFillError::parse(format!("{}: expected a JSON object of label → path: {e}", path.display()))
        })?;
        Ok(Self::new(query_map_from_object(object)))
    }
}

impl MappingGenerator for StaticMapper {
    async fn generate(&self, _fields: &[FieldDescriptor], _schema: &Value) -> Result<QueryMap> {
        Ok(self.map.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

// ---------------------------------------------------------------------------
// Prompt and response handling
// ---------------------------------------------------------------------------

/// Build the mapping prompt.
pub fn build_prompt(fields: &[FieldDescriptor], schema: &Value) -> Result<String> {
    let fields_json = serde_json::to_string_pretty(fields)
        .map_err(|e| FormFillError::Mapping(format!("failed to serialize fields: {e}")))?;
    let schema_json = serde_json::to_string_pretty(schema)
        .map_err(|e| FormFillError::Mapping(format!("failed to serialize schema: {e}")))?;

    Ok(format!(
        "You map job application form fields to entries in a personal knowledge base.\n\
         \n\
         Form fields (label, type, and options where the field is a choice):\n\
         {fields_json}\n\
         \n\
         Knowledge base:\n\
         {schema_json}\n\
         \n\
         Return a JSON object whose keys are the field labels exactly as given and whose \
         values are paths into the knowledge base. Use dots between keys and [n] for list \
         positions, e.g. \"Full Name\" -> \"personal_info.full_name\" and \"Most Recent \
         Employer\" -> \"work_experience[0].company\". For choice fields pick the path whose \
         value best matches one of the options.\n\
         Output only the JSON object."
    ))
}

/// Extract a query map from model output. Never fails: no usable object
/// yields an empty map.
pub fn parse_query_map(text: &str) -> QueryMap {
    let Some(found) = JSON_OBJECT_RE.find(text) else {
        warn!(response = %excerpt(text), "no JSON object in mapping response");
        return QueryMap::new();
    };

    match serde_json::from_str::<Map<String, Value>>(found.as_str()) {
        Ok(object) => {
            let map = query_map_from_object(object);
            info!(mappings = map.len(), "parsed query map");
            map
        }
        Err(e) => {
            warn!(error = %e, response = %excerpt(text), "mapping response is not valid JSON");
            QueryMap::new()
        }
    }
}

/// Non-string paths are kept as their JSON text; they will simply not resolve.
fn query_map_from_object(object: Map<String, Value>) -> QueryMap {
    object
        .into_iter()
        .map(|(label, path)| {
            let path = match path {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (label, path)
        })
        .collect()
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(MAX_EXCERPT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use formfill_shared::FieldKind;
    use serde_json::json;

    fn fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor {
            label: "Full Name".into(),
            kind: FieldKind::Text,
            name: Some("full_name".into()),
            id: Some("full_name".into()),
            options: vec![],
        }]
    }

    #[test]
    fn parses_bare_object() {
        let map = parse_query_map(r#"{"Full Name": "personal_info.full_name", "Email": "personal_info.email"}"#);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Email"), Some("personal_info.email"));
    }

    #[test]
    fn parses_object_wrapped_in_prose() {
        let reply = "Sure! Here is the mapping:\n```json\n{\n  \"Full Name\": \"personal_info.full_name\"\n}\n```\nLet me know.";
        let map = parse_query_map(reply);
        assert_eq!(map.get("Full Name"), Some("personal_info.full_name"));
    }

    #[test]
    fn keeps_response_order() {
        let map = parse_query_map(r#"{"b": "x.b", "a": "x.a", "c": "x.c"}"#);
        let labels: Vec<_> = map.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
    }

    #[test]
    fn non_string_paths_become_text() {
        let map = parse_query_map(r#"{"Age": 42, "Tags": ["a"], "Nothing": null}"#);
        assert_eq!(map.get("Age"), Some("42"));
        assert_eq!(map.get("Tags"), Some(r#"["a"]"#));
        assert_eq!(map.get("Nothing"), Some("null"));
    }

    #[test]
    fn garbage_yields_empty_map() {
        assert!(parse_query_map("I cannot help with that.").is_empty());
        assert!(parse_query_map("{ this is not json }").is_empty());
        assert!(parse_query_map(r#"["a", "b"]"#).is_empty());
        assert!(parse_query_map("").is_empty());
    }

    #[test]
    fn prompt_embeds_fields_and_schema() {
        let prompt = build_prompt(&fields(), &json!({"personal_info": {"full_name": "Ada"}})).unwrap();
        assert!(prompt.contains("\"label\": \"Full Name\""));
        assert!(prompt.contains("\"full_name\": \"Ada\""));
        assert!(prompt.contains("Output only the JSON object."));
    }

    #[test]
    fn request_serializes_correctly() {
        let request = ChatRequest {
            model: "test/model",
            temperature: 0.0,
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"model":"test/model","temperature":0.0,"messages":[{"role":"user","content":"hi"}]}"#
        );
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        let text = "é".repeat(300);
        assert_eq!(excerpt(&text).chars().count(), MAX_EXCERPT);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn static_mapper_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        std::fs::write(&path, r#"{"Full Name": "personal_info.full_name"}"#).unwrap();
        let mapper = StaticMapper::from_json_file(&path).unwrap();
        assert_eq!(mapper.map.get("Full Name"), Some("personal_info.full_name"));

        std::fs::write(&path, "[1]").unwrap();
        assert!(StaticMapper::from_json_file(&path).is_err());
    }

    fn config_for(server: &wiremock::MockServer) -> OpenRouterConfig {
        OpenRouterConfig {
            base_url: format!("{}/api/v1/", server.uri()),
            timeout_secs: 5,
            ..OpenRouterConfig::default()
        }
    }

    #[tokio::test]
    async fn openrouter_mapper_round_trip() {
        let server = wiremock::MockServer::start().await;

        let reply = json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"Full Name\": \"'personal_info.full_name'\"}"}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 12}
        });

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/api/v1/chat/completions"))
            .and(wiremock::matchers::header("authorization", "Bearer test-key"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(reply))
            .expect(1)
            .mount(&server)
            .await;

        let mapper = OpenRouterMapper::new(&config_for(&server), "test-key")
            .unwrap()
            .with_model("test/model");
        assert_eq!(mapper.name(), "test/model");

        let map = mapper.generate(&fields(), &json!({})).await.unwrap();
        assert_eq!(map.get("Full Name"), Some("'personal_info.full_name'"));
    }

    #[tokio::test]
    async fn openrouter_mapper_http_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let mapper = OpenRouterMapper::new(&config_for(&server), "test-key").unwrap();
        let err = mapper.generate(&fields(), &json!({})).await.unwrap_err();
        assert!(matches!(err, FormFillError::Mapping(_)));
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn openrouter_mapper_empty_choices() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let mapper = OpenRouterMapper::new(&config_for(&server), "test-key").unwrap();
        let err = mapper.generate(&fields(), &json!({})).await.unwrap_err();
        assert!(err.to_string().contains("no content"));
    }
}
