//! The external ranking collaborator and its OpenAI-compatible implementation

use crate::config::AiConfig;
use crate::error::RerankError;
use crate::output::ExportedElement;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

const SYSTEM_PROMPT: &str = "You rank code elements by relevance to a developer's search query. \
Each candidate has an id, a name, a type, its owning scope, its file and a few lines of \
surrounding source. Return the ids of the most relevant candidates, best first, using \
exactly `limit` ids taken from the candidate list.";

/// Longest error body kept in `RerankError::Status`
const MAX_ERROR_BODY: usize = 512;

/// Query plus the candidates the collaborator may choose from
#[derive(Debug, Clone, Serialize)]
pub struct RankRequest {
    pub query: String,
    pub limit: usize,
    pub candidates: Vec<ExportedElement>,
}

/// Orders candidates by relevance; returns candidate ids, best first
#[async_trait]
pub trait RankingClient: Send + Sync {
    async fn rank(&self, request: &RankRequest) -> Result<Vec<String>, RerankError>;
}

/// Ranks through an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiRanker {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiRanker {
    /// Build a ranker, reading the API key from `config.api_key_env`
    pub fn from_config(config: &AiConfig) -> Result<Self, RerankError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| RerankError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(config, api_key)
    }

    pub fn new(config: &AiConfig, api_key: String) -> Result<Self, RerankError> {
        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RankingClient for OpenAiRanker {
    async fn rank(&self, request: &RankRequest) -> Result<Vec<String>, RerankError> {
        let body = build_request_body(&self.model, request)?;
        debug!(
            endpoint = %self.endpoint,
            candidates = request.candidates.len(),
            limit = request.limit,
            "sending rank request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let mut body = text;
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(RerankError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_ranked_ids(&text)
    }
}

/// Chat completion request whose structured output may only name candidate ids
pub fn build_request_body(model: &str, request: &RankRequest) -> Result<Value, RerankError> {
    let payload = serde_json::to_string(request).map_err(|e| RerankError::Decode(e.to_string()))?;
    let ids: Vec<&str> = request.candidates.iter().map(|c| c.id.as_str()).collect();

    Ok(json!({
        "model": model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": payload },
        ],
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": "ranked_ids",
                "strict": true,
                "schema": {
                    "type": "object",
                    "properties": {
                        "ids": {
                            "type": "array",
                            "items": { "type": "string", "enum": ids },
                        },
                    },
                    "required": ["ids"],
                    "additionalProperties": false,
                },
            },
        },
    }))
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct RankedIds {
    ids: Vec<String>,
}

/// Extract `{"ids": [...]}` from `choices[0].message.content`
pub fn parse_ranked_ids(body: &str) -> Result<Vec<String>, RerankError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| RerankError::Decode(e.to_string()))?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(RerankError::EmptyResponse)?;
    let ranked: RankedIds =
        serde_json::from_str(&content).map_err(|e| RerankError::Decode(e.to_string()))?;
    Ok(ranked.ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::ElementKind;

    fn candidate(id: &str) -> ExportedElement {
        ExportedElement {
            id: id.to_string(),
            name: "create".to_string(),
            kind: ElementKind::Method,
            parent_name: Some("UserService".to_string()),
            parent_type: Some(ElementKind::Class),
            file_path: "/app/user.service.ts".to_string(),
            line_number: 4,
            context: "create() {}".to_string(),
        }
    }

    fn request() -> RankRequest {
        RankRequest {
            query: "create user".to_string(),
            limit: 1,
            candidates: vec![candidate("method-1"), candidate("method-7")],
        }
    }

    #[test]
    fn test_request_body_constrains_ids() {
        let body = build_request_body("gpt-4o-mini", &request()).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        let items = &body["response_format"]["json_schema"]["schema"]["properties"]["ids"]["items"];
        assert_eq!(items["enum"], json!(["method-1", "method-7"]));

        let user: Value =
            serde_json::from_str(body["messages"][1]["content"].as_str().unwrap()).unwrap();
        assert_eq!(user["query"], "create user");
        assert_eq!(user["limit"], 1);
        assert_eq!(user["candidates"][1]["id"], "method-7");
        assert_eq!(user["candidates"][0]["parentType"], "class");
    }

    #[test]
    fn test_parse_ranked_ids() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"ids\":[\"method-7\",\"method-1\"]}"}}]}"#;
        assert_eq!(parse_ranked_ids(body).unwrap(), vec!["method-7", "method-1"]);
    }

    #[test]
    fn test_parse_no_choices() {
        let err = parse_ranked_ids(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, RerankError::EmptyResponse));
    }

    #[test]
    fn test_parse_malformed_content() {
        let body = r#"{"choices":[{"message":{"content":"method-7"}}]}"#;
        assert!(matches!(parse_ranked_ids(body), Err(RerankError::Decode(_))));
        assert!(matches!(parse_ranked_ids("<html>"), Err(RerankError::Decode(_))));
    }

    #[test]
    fn test_missing_api_key() {
        let config = AiConfig {
            api_key_env: "SYMDEX_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..AiConfig::default()
        };
        let err = OpenAiRanker::from_config(&config).err().unwrap();
        assert!(matches!(err, RerankError::MissingApiKey(name) if name == config.api_key_env));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = AiConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..AiConfig::default()
        };
        let ranker = OpenAiRanker::new(&config, "key".to_string()).unwrap();
        assert_eq!(ranker.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
