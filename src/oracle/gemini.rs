// fitbatch/src/oracle/gemini.rs
use super::{DimensionOracle, DimensionSuggestion, OracleError};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

// The model is asked for integers, but nothing stops it from answering with
// zero or a negative value, so take signed values and validate afterwards.
#[derive(Debug, Deserialize)]
struct RawSuggestion {
    width: i64,
    height: i64,
    #[serde(default)]
    reasoning: String,
}

/// Asks a Gemini model for a target size through the `generateContent` API,
/// constraining the answer with a JSON response schema.
pub struct GeminiOracle {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiOracle {
    pub fn new(api_key: impl Into<String>) -> Result<Self, OracleError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OracleError::MissingKey);
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Reads the key from `GEMINI_API_KEY`, falling back to `API_KEY`.
    pub fn from_env() -> Result<Self, OracleError> {
        let key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .map_err(|_| OracleError::MissingKey)?;
        Self::new(key)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn request_body(query: &str) -> Value {
        let prompt = format!(
            "Suggest the best image width and height in pixels for this platform or use case: \"{}\". \
             Return standard dimensions in current use.",
            query.trim()
        );

        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "width": { "type": "INTEGER", "description": "Recommended width in pixels" },
                        "height": { "type": "INTEGER", "description": "Recommended height in pixels" },
                        "reasoning": { "type": "STRING", "description": "Short explanation, at most 10 words" }
                    },
                    "required": ["width", "height", "reasoning"]
                }
            }
        })
    }

    fn parse_response(body: &str) -> Result<DimensionSuggestion, OracleError> {
        let response: GenerateResponse = serde_json::from_str(body)?;

        let text = response
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .find_map(|part| part.text.filter(|t| !t.trim().is_empty()))
            .ok_or(OracleError::EmptyResponse)?;

        let raw: RawSuggestion = serde_json::from_str(text.trim())?;
        DimensionSuggestion::new(raw.width, raw.height, raw.reasoning)
    }
}

impl DimensionOracle for GeminiOracle {
    fn suggest_dimensions(&self, query: &str) -> Result<DimensionSuggestion, OracleError> {
        log::debug!("Requesting size suggestion from {} for \"{}\"", self.model, query);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(query))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Self::parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(text: &str) -> String {
        json!({
            "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }]
        })
        .to_string()
    }

    #[test]
    fn parses_structured_answer() {
        let body = wrap(r#"{"width": 1080, "height": 1920, "reasoning": "Vertical story format"}"#);
        let suggestion = GeminiOracle::parse_response(&body).unwrap();
        assert_eq!((suggestion.width, suggestion.height), (1080, 1920));
        assert_eq!(suggestion.reasoning, "Vertical story format");
    }

    #[test]
    fn rejects_non_positive_answer() {
        let body = wrap(r#"{"width": -1, "height": 1920, "reasoning": "?"}"#);
        assert!(matches!(
            GeminiOracle::parse_response(&body),
            Err(OracleError::InvalidSuggestion { .. })
        ));
    }

    #[test]
    fn empty_candidates_are_reported() {
        assert!(matches!(
            GeminiOracle::parse_response(r#"{"candidates": []}"#),
            Err(OracleError::EmptyResponse)
        ));
        assert!(matches!(
            GeminiOracle::parse_response("{}"),
            Err(OracleError::EmptyResponse)
        ));
    }

    #[test]
    fn garbage_text_is_malformed() {
        assert!(matches!(
            GeminiOracle::parse_response(&wrap("I think 1080 by 1080")),
            Err(OracleError::Malformed(_))
        ));
    }

    #[test]
    fn request_carries_schema_and_query() {
        let body = GeminiOracle::request_body("  pinterest pin ");
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("\"pinterest pin\""));
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"],
            json!(["width", "height", "reasoning"])
        );
    }

    #[test]
    fn blank_key_is_missing() {
        assert!(matches!(GeminiOracle::new("  "), Err(OracleError::MissingKey)));
    }

    #[test]
    fn url_uses_model_and_trimmed_endpoint() {
        let oracle = GeminiOracle::new("key")
            .unwrap()
            .with_endpoint("http://localhost:9999/v1/")
            .with_model("test-model");
        assert_eq!(oracle.url(), "http://localhost:9999/v1/models/test-model:generateContent");
    }
}
