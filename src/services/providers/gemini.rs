/// Gemini provider (generateContent REST API)
///
/// Sends the fixed sommelier instruction set together with the user prompt and
/// a strict response schema, and expects back a JSON array of exactly three
/// recommendations. The instruction text defines the correctness of the
/// external contract (distinctness rule, Persian notes, image search) and must
/// be transmitted unmodified.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::ServiceError,
    models::{PerfumeRecommendation, RECOMMENDATION_COUNT},
    services::providers::{ProviderError, RecommendationProvider},
};

/// Instruction set revision, logged with every call so prompt changes can be
/// correlated with answer-quality regressions.
pub const SOMMELIER_PROMPT_VERSION: &str = "1";

/// The sommelier directive. Changing a single rule here changes what the
/// external model is contractually expected to return.
pub const SOMMELIER_PROMPT: &str = r#"You are a world-class Persian Perfume Sommelier and Visual Data Expert.

Your Task:
1. Analyze the user's request. 
2. If the user provides a specific perfume name, suggest 3 SIMILAR but DISTINCT perfumes. NEVER include the perfume name the user mentioned in your suggestions.
3. If the user describes a mood/memory, suggest 3 perfumes that capture that essence.

For each of the 3 recommendations, you MUST:
- name: Full English name of the perfume.
- brand: Full English brand name.
- scentProfile: 3-4 key notes in Persian (e.g., یاس، چوب صندل، وانیل).
- story: A poetic Persian paragraph explaining why this matches. Use **bold** for notes.
- imageUrl: MANDATORY. Use the googleSearch tool to find the exact main product image for this perfume. Search for "site:fragrantica.com [Brand] [Name] perfume bottle". Extract a direct URL (usually from fimgs.net or fragrantica.com). It MUST be a direct link to the image file.

Strict Rule: Return ONLY a JSON array containing exactly 3 objects. Do not add any text before or after the JSON."#;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Schema the model's JSON output must validate against: an array of exactly
/// three objects with all five fields required.
fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "brand": { "type": "STRING" },
                "scentProfile": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                },
                "story": { "type": "STRING" },
                "imageUrl": {
                    "type": "STRING",
                    "description": "Direct URL of the perfume bottle image found via search (prioritize Fragrantica/fimgs.net)."
                }
            },
            "required": ["name", "brand", "scentProfile", "story", "imageUrl"]
        }
    })
}

// ============================================================================
// Provider
// ============================================================================

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiProvider {
    /// Builds the provider with its own HTTP client.
    ///
    /// `request_timeout` bounds the outbound call; `None` leaves it unbounded,
    /// which is the original behavior of this integration.
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        request_timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = HttpClient::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            model,
        })
    }

    fn build_request(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: Content {
                parts: vec![Part {
                    text: SOMMELIER_PROMPT.to_string(),
                }],
            },
            tools: vec![Tool {
                google_search: json!({}),
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        }
    }

    /// One best-effort call, failure modes kept distinct for logging.
    async fn generate(&self, prompt: &str) -> Result<Vec<PerfumeRecommendation>, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        );

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_request(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::UpstreamStatus { status, body });
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text = extract_text(payload).ok_or(ProviderError::EmptyResponse)?;

        parse_payload(&text)
    }
}

/// Concatenated text of the first candidate, or `None` when the model
/// produced no textual payload at all.
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Parses the model's text as the declared schema.
///
/// Anything short of exactly three fully-populated records is rejected whole;
/// a partial result never reaches the session.
fn parse_payload(text: &str) -> Result<Vec<PerfumeRecommendation>, ProviderError> {
    let recommendations: Vec<PerfumeRecommendation> = serde_json::from_str(text)
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

    if recommendations.len() != RECOMMENDATION_COUNT {
        return Err(ProviderError::MalformedResponse(format!(
            "expected {} recommendations, got {}",
            RECOMMENDATION_COUNT,
            recommendations.len()
        )));
    }

    if let Some(incomplete) = recommendations.iter().find(|rec| !rec.is_complete()) {
        return Err(ProviderError::MalformedResponse(format!(
            "recommendation '{}' has blank required fields",
            incomplete.name
        )));
    }

    Ok(recommendations)
}

#[async_trait::async_trait]
impl RecommendationProvider for GeminiProvider {
    async fn fetch_recommendations(
        &self,
        prompt: &str,
    ) -> Result<Vec<PerfumeRecommendation>, ServiceError> {
        match self.generate(prompt).await {
            Ok(recommendations) => {
                tracing::info!(
                    prompt_chars = prompt.chars().count(),
                    results = recommendations.len(),
                    provider = self.name(),
                    prompt_version = SOMMELIER_PROMPT_VERSION,
                    "Recommendations fetched"
                );
                Ok(recommendations)
            }
            Err(cause) => {
                // The cause stays here; callers only ever see the opaque error
                // with its stable user-facing message.
                tracing::error!(
                    error = %cause,
                    provider = self.name(),
                    prompt_version = SOMMELIER_PROMPT_VERSION,
                    "Recommendation fetch failed"
                );
                Err(ServiceError)
            }
        }
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn well_formed_items() -> Value {
        json!([
            {
                "name": "Un Jardin Sur Le Nil",
                "brand": "Hermès",
                "scentProfile": ["انبه سبز", "نیلوفر آبی", "چوب"],
                "story": "نسیمی خنک با **انبه سبز** و **نیلوفر آبی**.",
                "imageUrl": "https://fimgs.net/mdimg/perfume/375x500.24.jpg"
            },
            {
                "name": "Philosykos",
                "brand": "Diptyque",
                "scentProfile": ["برگ انجیر", "شیر انجیر", "چوب سدر"],
                "story": "سایه‌ی درخت انجیر با **برگ انجیر** و **چوب سدر**.",
                "imageUrl": "https://fimgs.net/mdimg/perfume/375x500.338.jpg"
            },
            {
                "name": "Eau de Campagne",
                "brand": "Sisley",
                "scentProfile": ["گوجه‌برگ", "ریحان", "خزه بلوط"],
                "story": "عصر تابستانی با **ریحان** و **خزه بلوط**.",
                "imageUrl": "https://fimgs.net/mdimg/perfume/375x500.1125.jpg"
            }
        ])
    }

    fn candidate_body(text: &str) -> Value {
        json!({
            "candidates": [
                { "content": { "parts": [{ "text": text }] } }
            ]
        })
    }

    fn test_provider(base_url: String) -> GeminiProvider {
        GeminiProvider::new(
            "test_key".to_string(),
            base_url,
            "test-model".to_string(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_sommelier_prompt_spacing_is_byte_exact() {
        // The instruction set is a wire contract; even the trailing space on
        // the first task line must survive edits to this file.
        assert!(SOMMELIER_PROMPT.contains("1. Analyze the user's request. \n2."));
        assert!(SOMMELIER_PROMPT.starts_with(
            "You are a world-class Persian Perfume Sommelier and Visual Data Expert.\n\nYour Task:"
        ));
        assert!(SOMMELIER_PROMPT.ends_with("Do not add any text before or after the JSON."));
    }

    #[test]
    fn test_parse_payload_success() {
        let text = well_formed_items().to_string();
        let parsed = parse_payload(&text).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].brand, "Hermès");
        assert_eq!(parsed[1].scent_profile.len(), 3);
    }

    #[test]
    fn test_parse_payload_rejects_non_json() {
        let result = parse_payload("three lovely perfumes, I promise");
        assert!(matches!(result, Err(ProviderError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_payload_rejects_wrong_count() {
        let mut items = well_formed_items();
        items.as_array_mut().unwrap().pop();
        let result = parse_payload(&items.to_string());
        assert!(matches!(result, Err(ProviderError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_payload_rejects_blank_required_field() {
        let mut items = well_formed_items();
        items[2]["brand"] = json!("   ");
        let result = parse_payload(&items.to_string());
        assert!(matches!(result, Err(ProviderError::MalformedResponse(_))));
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        let response = GenerateContentResponse { candidates: vec![] };
        assert!(extract_text(response).is_none());
    }

    #[tokio::test]
    async fn test_generate_success_sends_contract() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1beta/models/test-model:generateContent")
                .header("x-goog-api-key", "test_key")
                // The instruction set must reach the wire unmodified.
                .body_contains("Persian Perfume Sommelier")
                .body_contains("NEVER include the perfume name")
                .body_contains("Silver Mountain Water");
            then.status(200)
                .json_body(candidate_body(&well_formed_items().to_string()));
        });

        let provider = test_provider(server.base_url());
        let result = provider
            .generate("عطری شبیه Silver Mountain Water")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].name, "Un Jardin Sur Le Nil");
    }

    #[tokio::test]
    async fn test_generate_empty_payload() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({ "candidates": [] }));
        });

        let provider = test_provider(server.base_url());
        let result = provider.generate("بوی باران").await;
        assert!(matches!(result, Err(ProviderError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_generate_malformed_payload() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(candidate_body("{ not json"));
        });

        let provider = test_provider(server.base_url());
        let result = provider.generate("بوی باران").await;
        assert!(matches!(result, Err(ProviderError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_generate_upstream_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(429).body("quota exceeded");
        });

        let provider = test_provider(server.base_url());
        let result = provider.generate("بوی باران").await;
        assert!(matches!(result, Err(ProviderError::UpstreamStatus { .. })));
    }

    #[tokio::test]
    async fn test_fetch_normalizes_every_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(500).body("boom");
        });

        let provider = test_provider(server.base_url());
        let err = provider.fetch_recommendations("بوی باران").await.unwrap_err();
        assert_eq!(err.user_message(), crate::error::SERVICE_ERROR_MESSAGE);
    }
}
