//! Gemini provider using the `v1beta` `generateContent` and `models` APIs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{check_http_response, ProviderError, TextGenerator};

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

const API_KEY_HEADER: &str = "x-goog-api-key";
const GENERATE_METHOD: &str = "generateContent";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// `generateContent` request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    /// System instruction applied to the whole exchange.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    /// Conversation contents; a single user turn here.
    pub contents: Vec<GeminiContent>,
}

/// A content block: a role and its parts.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// `"user"` or `"model"`; omitted for system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Content parts.
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// A single content part. Only text parts are used.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    /// Text content, absent for non-text parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// `generateContent` response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    /// Candidate replies.
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    /// Present when the prompt itself was blocked.
    pub prompt_feedback: Option<GeminiPromptFeedback>,
}

/// A candidate reply.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    /// Candidate content; absent when generation was stopped early.
    pub content: Option<GeminiContent>,
    /// Why generation stopped.
    pub finish_reason: Option<String>,
}

/// Prompt-level feedback.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPromptFeedback {
    /// Block reason, if the prompt was blocked.
    pub block_reason: Option<String>,
}

/// One page of the `models` listing.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiModelsPage {
    /// Models on this page.
    #[serde(default)]
    pub models: Vec<GeminiModelInfo>,
    /// Token for the next page, if any.
    pub next_page_token: Option<String>,
}

/// A model entry from the `models` listing.
#[doc(hidden)]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiModelInfo {
    /// Resource name, e.g. `models/gemini-1.5-flash`.
    pub name: String,
    /// Human-readable name.
    pub display_name: Option<String>,
    /// API methods this model supports.
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl GeminiModelInfo {
    /// Whether the model can serve `generateContent` calls.
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == GENERATE_METHOD)
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build a single-turn `generateContent` request.
#[doc(hidden)]
pub fn build_request(prompt: &str, system_instruction: &str) -> GeminiRequest {
    let system_instruction = if system_instruction.trim().is_empty() {
        None
    } else {
        Some(GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: Some(system_instruction.to_owned()),
            }],
        })
    };

    GeminiRequest {
        system_instruction,
        contents: vec![GeminiContent {
            role: Some("user".to_owned()),
            parts: vec![GeminiPart {
                text: Some(prompt.to_owned()),
            }],
        }],
    }
}

/// Extract the reply text from a `generateContent` response body.
///
/// Joins the text parts of the first candidate.
///
/// # Errors
///
/// Returns `ProviderError::Parse` if the body cannot be deserialized and
/// `ProviderError::EmptyReply` if no text was produced.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<String, ProviderError> {
    let resp: GeminiResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let Some(candidate) = resp.candidates.into_iter().next() else {
        let reason = resp
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_owned());
        return Err(ProviderError::EmptyReply(reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "empty candidate".to_owned());
        return Err(ProviderError::EmptyReply(reason));
    }
    Ok(text)
}

/// Parse one page of the `models` listing.
///
/// # Errors
///
/// Returns `ProviderError::Parse` if the body cannot be deserialized.
#[doc(hidden)]
pub fn parse_models_page(body: &str) -> Result<GeminiModelsPage, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Gemini `generateContent` provider.
#[derive(Clone)]
pub struct GeminiProvider {
    model: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GeminiProvider {
    /// Create a provider for `model` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Request` if the HTTP client cannot be built.
    pub fn new(
        model: &str,
        api_key: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            model: normalize_model_name(model),
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    /// The `generateContent` endpoint for this provider's model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:{GENERATE_METHOD}",
            self.base_url, self.model
        )
    }

    /// List every model visible to the API key, following pagination.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on network, status, or parse failure.
    pub async fn list_models(&self) -> Result<Vec<GeminiModelInfo>, ProviderError> {
        let url = format!("{}/v1beta/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .header(API_KEY_HEADER, &self.api_key);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let body = check_http_response(request.send().await?).await?;
            let page = parse_models_page(&body)?;
            models.extend(page.models);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(models)
    }
}

/// Strip whitespace and a leading `models/` from a configured model name.
fn normalize_model_name(model: &str) -> String {
    let trimmed = model.trim();
    trimmed
        .strip_prefix("models/")
        .unwrap_or(trimmed)
        .to_owned()
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<String, ProviderError> {
        let api_request = build_request(prompt, system_instruction);

        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
