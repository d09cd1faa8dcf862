use crate::models::{Annotation, MatchResult, UserPreferences, Venue};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to the text-generation endpoint
///
/// These stay internal to the retry loop: the public [`AnnotationClient::annotate`]
/// resolves every failure to a well-formed fallback Annotation.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("rate limited (429)")]
    RateLimited,

    #[error("API returned error status: {0}")]
    ApiError(StatusCode),

    #[error("invalid response format: {0}")]
    InvalidResponse(String),
}

/// Injected connection and retry configuration
///
/// Endpoint, model id and credential are configuration values, never
/// literals in the client logic.
#[derive(Debug, Clone)]
pub struct AnnotationConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// Referring-application header required by OpenRouter for free models
    pub referer: String,
    pub app_title: String,
    /// Total attempt budget per call
    pub max_attempts: u32,
    /// Base wait after a 429, multiplied by the attempt number
    pub rate_limit_backoff: Duration,
    /// Flat wait after any other transport failure
    pub transport_backoff: Duration,
    /// Ceiling for a single request; a hung request becomes a transport
    /// failure once this elapses
    pub request_timeout: Duration,
    pub temperature: f64,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "google/gemma-3n-e2b-it:free".to_string(),
            referer: "http://localhost:3000".to_string(),
            app_title: "Coffinding App".to_string(),
            max_attempts: 3,
            rate_limit_backoff: Duration::from_millis(2000),
            transport_backoff: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(30),
            temperature: 0.7,
        }
    }
}

/// Client for the chat-completion endpoint that writes result explanations
///
/// Each call builds a structured prompt from the ranked result and the
/// user's preferences, then runs a bounded retry loop against the endpoint.
pub struct AnnotationClient {
    config: AnnotationConfig,
    client: Client,
}

impl AnnotationClient {
    pub fn new(config: AnnotationConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Generate the three-field explanation for a ranked result
    ///
    /// Callers must skip hard misses (score 0); the scheduler enforces this.
    ///
    /// Never returns an error value:
    /// - 429 responses retry after `rate_limit_backoff * attempt` until the
    ///   attempt budget runs out, then collapse to the offline fallback
    /// - any other transport failure retries after a flat `transport_backoff`
    ///   with the same terminal fallback
    /// - an unparseable model reply is not retried over the network; it
    ///   collapses immediately to a best-effort fallback built from the
    ///   venue's own tags
    ///
    /// The remote model is stochastic, so repeated calls with identical
    /// inputs may return different text; both calls still terminate with a
    /// well-formed Annotation.
    pub async fn annotate(&self, result: &MatchResult, preferences: &UserPreferences) -> Annotation {
        let prompt = build_prompt(result, preferences);

        let mut attempt: u32 = 0;
        loop {
            match self.request_completion(&prompt).await {
                Ok(content) => {
                    return match parse_annotation(&content) {
                        Ok(annotation) => annotation,
                        Err(e) => {
                            // Parsing failure is distinct from transport
                            // failure and does not consume a retry
                            tracing::warn!(
                                "Unparseable model reply for venue {}: {}",
                                result.venue.id,
                                e
                            );
                            best_effort_fallback(&result.venue)
                        }
                    };
                }
                Err(AnnotationError::RateLimited) => {
                    attempt += 1;
                    if attempt >= self.config.max_attempts {
                        tracing::warn!(
                            "Rate limit budget exhausted for venue {}",
                            result.venue.id
                        );
                        return offline_fallback();
                    }
                    let wait = self.config.rate_limit_backoff * attempt;
                    tracing::warn!(
                        "Rate limit 429 for venue {}; attempt {} of {}, backing off {:?}",
                        result.venue.id,
                        attempt,
                        self.config.max_attempts,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.config.max_attempts {
                        tracing::warn!(
                            "Annotation failed for venue {} after {} attempts: {}",
                            result.venue.id,
                            attempt,
                            e
                        );
                        return offline_fallback();
                    }
                    tracing::debug!(
                        "Annotation attempt {} failed for venue {}: {}",
                        attempt,
                        result.venue.id,
                        e
                    );
                    tokio::time::sleep(self.config.transport_backoff).await;
                }
            }
        }
    }

    /// Single request against the endpoint; returns the raw text payload
    async fn request_completion(&self, prompt: &str) -> Result<String, AnnotationError> {
        let payload = json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": self.config.temperature,
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.app_title)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AnnotationError::RateLimited);
        }
        if !status.is_success() {
            return Err(AnnotationError::ApiError(status));
        }

        let body: Value = response.json().await?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }
}

/// Build the structured prompt embedding preferences and venue facts
///
/// The 「距離極近」 wording is a textual hint to the model for close,
/// high-scoring venues, not a score modifier.
fn build_prompt(result: &MatchResult, preferences: &UserPreferences) -> String {
    let attributes_json = serde_json::to_string(&result.venue.attributes).unwrap_or_default();

    format!(
        "你現在是「Coffinding 尋咖」網站的智慧後端引擎。\n\
         \n\
         使用者需求：\n\
         - 目前位置/區域：{location}\n\
         - 絕對匹配 (Must-have)：{must}\n\
         - 加分匹配 (Nice-to-have)：{nice}\n\
         \n\
         候選店家資訊：\n\
         - 店名：{name}\n\
         - 距離：{distance}m\n\
         - 標籤：{tags}\n\
         - 契合度星等：{score:.1} / 5\n\
         - 屬性細節：{attributes}\n\
         \n\
         請根據上述資訊，產出一段JSON格式的回應。\n\
         \n\
         回應必須嚴格遵守以下JSON結構，不要包含Markdown代碼區塊，只要純JSON字串：\n\
         {{\n\
           \"recommendation\": \"推薦理由：(說明為何符合標籤，或缺少了什麼，若距離<500m且星等>=4請加入「距離極近」字眼)\",\n\
           \"atmosphere\": \"AI 氛圍快照：(模擬一段充滿畫面感的評論摘要)\",\n\
           \"actionGuide\": \"行為引導：(詢問是否要查看菜單或導航)\"\n\
         }}\n\
         \n\
         保持專業、直覺、資訊導向的口吻。",
        location = preferences.location,
        must = preferences.must_haves_joined(),
        nice = preferences.nice_to_haves_joined(),
        name = result.venue.name,
        distance = result.venue.distance,
        tags = result.venue.tags_joined(),
        score = result.score,
        attributes = attributes_json,
    )
}

/// Strip the markdown code fences smaller free models like to wrap JSON in
fn strip_code_fences(content: &str) -> String {
    content
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse the model's raw text into an Annotation
///
/// A reply that deserializes but carries an empty field violates the
/// three-non-empty-strings contract and counts as malformed.
fn parse_annotation(content: &str) -> Result<Annotation, AnnotationError> {
    let cleaned = strip_code_fences(content);

    let annotation: Annotation = serde_json::from_str(&cleaned)
        .map_err(|e| AnnotationError::InvalidResponse(e.to_string()))?;

    if !annotation.is_complete() {
        return Err(AnnotationError::InvalidResponse(
            "annotation field is empty".to_string(),
        ));
    }

    Ok(annotation)
}

/// Fixed reply once the endpoint stays unreachable through the whole budget
fn offline_fallback() -> Annotation {
    Annotation {
        recommendation: "推薦理由：系統暫時無法連線至 AI 引擎，但根據數據，此店家符合您的硬體需求。"
            .to_string(),
        atmosphere: "AI 氛圍快照：(離線模式)".to_string(),
        action_guide: "行為引導：是否直接導航？".to_string(),
    }
}

/// Best-effort reply restating the venue's own tags when the model text
/// cannot be parsed
fn best_effort_fallback(venue: &Venue) -> Annotation {
    Annotation {
        recommendation: format!(
            "推薦理由：這家店有 {}，符合您的部分需求。",
            venue.tags_joined()
        ),
        atmosphere: "AI 氛圍快照：資料解析中...".to_string(),
        action_guide: "行為引導：查看詳情？".to_string(),
    }
}
