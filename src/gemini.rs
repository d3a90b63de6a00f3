use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;
use crate::model::EnrichedResult;

/// Instruction template for the structured transform. The reply is required
/// to be bare JSON, though in practice the model sometimes wraps it in a
/// markdown fence, which `parse_transform_response` strips.
const TRANSFORM_INSTRUCTION: &str = r#"你是一位專業的 AI 藝術 prompt 分析專家。
請分析以下 AI 藝術生成 prompt，並以 JSON 格式回傳：

{
  "translated_text_zh": "繁體中文翻譯（台灣用語風格）",
  "tags": ["標籤1", "標籤2", "標籤3", "標籤4", "標籤5"],
  "cleaned_text": "優化後的英文 prompt（移除冗餘詞、修正文法）"
}

**要求：**
1. 翻譯必須符合台灣繁體中文習慣用語
2. 提取 5 個最能代表此 prompt 風格的標籤（如 cyberpunk, watercolor, portrait 等）
3. 清理後的英文應保持原意但更精簡專業
4. **僅回傳 JSON，不要包含任何其他說明文字**

原始 Prompt：
"#;

const TRANSFORM_TEMPERATURE: f32 = 0.3;

/// Client for the Gemini REST API: one model for the structured transform,
/// one for embeddings. An absent API key still builds a client; every call
/// will then come back as a status failure.
pub struct GeminiClient {
    client: Client,
    base: String,
    api_key: String,
    model: String,
    embedding_model: String,
}

impl GeminiClient {
    pub fn new(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            base: cfg.gemini_base.clone(),
            api_key: cfg.api_key.clone().unwrap_or_default(),
            model: cfg.gemini_model.clone(),
            embedding_model: cfg.embedding_model.clone(),
        }
    }

    /// Translate, tag, and clean one prompt. Shape failures (missing required
    /// fields) are final; transport/decode failures are the caller's to retry.
    pub async fn transform_prompt(&self, prompt: &str) -> Result<EnrichedResult, ApiError> {
        let url = format!("{}/models/{}:generateContent", self.base, self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: format!("{TRANSFORM_INSTRUCTION}{prompt}\n"),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TRANSFORM_TEMPERATURE,
                candidate_count: 1,
            },
        };

        let response: GenerateResponse = self.post_json(&url, &body).await?;
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ApiError::Decode("no candidates in Gemini response".into()))?;

        debug!("raw transform response: {}", text);
        parse_transform_response(&text)
    }

    /// Embed one prompt with document-retrieval intent. Returns the raw
    /// vector; the pipeline downgrades a final failure to an empty one.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let url = format!(
            "{}/models/{}:embedContent",
            self.base, self.embedding_model
        );
        let body = EmbedRequest {
            model: format!("models/{}", self.embedding_model),
            content: Content {
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
            task_type: "RETRIEVAL_DOCUMENT",
        };

        let response: EmbedResponse = self.post_json(&url, &body).await?;
        Ok(response.embedding.values)
    }

    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let text = resp.text().await.map_err(ApiError::from_reqwest)?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Strip an optional markdown code fence (```json or bare ```), leaving
/// unfenced input untouched. Idempotent.
pub fn strip_markdown_fence(raw: &str) -> String {
    let open = Regex::new(r"^```(?:json)?\s*").unwrap();
    let close = Regex::new(r"\s*```$").unwrap();
    let trimmed = raw.trim();
    let without_open = open.replace(trimmed, "");
    close.replace(&without_open, "").trim().to_string()
}

/// Parse the model's reply into an `EnrichedResult`. Non-JSON replies are
/// decode failures (worth a retry); replies missing any of the three required
/// fields are shape failures (final). Tag count is not checked.
pub fn parse_transform_response(raw: &str) -> Result<EnrichedResult, ApiError> {
    let stripped = strip_markdown_fence(raw);
    let value: Value = serde_json::from_str(&stripped)
        .map_err(|e| ApiError::Decode(format!("transform reply is not JSON: {e}")))?;

    for field in ["translated_text_zh", "tags", "cleaned_text"] {
        if value.get(field).is_none() {
            return Err(ApiError::Shape(format!("transform reply missing `{field}`")));
        }
    }

    serde_json::from_value(value).map_err(|e| ApiError::Shape(e.to_string()))
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "candidateCount")]
    candidate_count: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    content: Content,
    #[serde(rename = "taskType")]
    task_type: &'static str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embedding: EmbeddingValues,
}

#[derive(Default, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"{"translated_text_zh": "夜裡發光的森林", "tags": ["fantasy", "forest", "night", "detailed", "art"], "cleaned_text": "a glowing forest at night"}"#;

    #[test]
    fn fenced_and_unfenced_replies_parse_identically() {
        let fenced = format!("```json\n{REPLY}\n```");
        let bare_fence = format!("```\n{REPLY}\n```");

        let from_fenced = parse_transform_response(&fenced).unwrap();
        let from_bare = parse_transform_response(&bare_fence).unwrap();
        let from_plain = parse_transform_response(REPLY).unwrap();

        assert_eq!(from_fenced, from_plain);
        assert_eq!(from_bare, from_plain);
    }

    #[test]
    fn fence_stripping_is_idempotent() {
        let fenced = format!("```json\n{REPLY}\n```");
        let once = strip_markdown_fence(&fenced);
        let twice = strip_markdown_fence(&once);
        assert_eq!(once, twice);
        assert_eq!(once, REPLY);
    }

    #[test]
    fn missing_required_field_is_a_shape_error() {
        let reply = r#"{"translated_text_zh": "x", "tags": []}"#;
        let err = parse_transform_response(reply).unwrap_err();
        assert!(matches!(err, ApiError::Shape(_)));
        assert!(err.to_string().contains("cleaned_text"));
    }

    #[test]
    fn non_json_reply_is_a_decode_error() {
        let err = parse_transform_response("I'm sorry, I can't do that.").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn extra_fields_and_tag_count_are_not_enforced() {
        let reply = r#"{"translated_text_zh": "x", "tags": ["only", "three", "tags"], "cleaned_text": "y", "confidence": 0.9}"#;
        let parsed = parse_transform_response(reply).unwrap();
        assert_eq!(parsed.tags.len(), 3);
    }
}
