use reqwest::Client;

use crate::error::ApiError;
use crate::models::{
    ChatRequest, ChatResponse, ErrorResponse, ModelEntry, ModelListResponse, SpeechRequest, Usage,
};

pub const API_BASE: &str = "https://api.groq.com/openai/v1";
pub const TTS_MODEL: &str = "playai-tts";
const AUDIO_FORMAT: &str = "wav";

/// A parsed, non-empty assistant reply.
pub struct Completion {
    pub text: String,
    pub usage: Option<Usage>,
}

/// Thin client over the three remote endpoints. The credential is passed per
/// call and never held anywhere.
pub struct ApiClient;

impl ApiClient {
    pub async fn list_models(api_key: &str) -> Result<Vec<ModelEntry>, ApiError> {
        let client = Client::new();
        let resp = client
            .get(format!("{}/models", API_BASE))
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(ApiError::transport)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(ApiError::transport)?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Rejected {
                status,
                message: extract_error_message(status, &body),
            });
        }
        let parsed: ModelListResponse = serde_json::from_str(&body).map_err(|e| {
            ApiError::Rejected {
                status,
                message: format!("malformed model list: {}", e),
            }
        })?;
        Ok(parsed.data)
    }

    /// Non-streamed chat completion. A 2xx response that carries no
    /// assistant text still counts as a failure.
    pub async fn chat_completion(
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<Completion, ApiError> {
        let client = Client::new();
        let resp = client
            .post(format!("{}/chat/completions", API_BASE))
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(ApiError::transport)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(ApiError::transport)?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Rejected {
                status,
                message: extract_error_message(status, &body),
            });
        }
        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| ApiError::Rejected {
            status,
            message: format!("malformed completion: {}", e),
        })?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if text.is_empty() {
            return Err(ApiError::EmptyCompletion);
        }
        Ok(Completion {
            text,
            usage: parsed.usage,
        })
    }

    /// Synthesizes the reply with the fixed TTS model and returns the raw
    /// wav payload.
    pub async fn synthesize_speech(
        api_key: &str,
        voice: &str,
        input: &str,
    ) -> Result<Vec<u8>, ApiError> {
        let request = SpeechRequest {
            model: TTS_MODEL.to_string(),
            voice: voice.to_string(),
            input: input.to_string(),
            response_format: AUDIO_FORMAT.to_string(),
        };
        let client = Client::new();
        let resp = client
            .post(format!("{}/audio/speech", API_BASE))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(ApiError::transport)?;
        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Rejected {
                status,
                message: extract_error_message(status, &body),
            });
        }
        let bytes = resp.bytes().await.map_err(ApiError::transport)?;
        Ok(bytes.to_vec())
    }
}

/// Remote failure bodies are `{"error":{"message":...}}` when the service
/// had anything to say; fall back to the HTTP status otherwise.
fn extract_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|resp| resp.error)
        .and_then(|detail| detail.message)
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| format!("HTTP error {}", status))
}
