use crate::error::{ApiError, TurnError};
use crate::models::{ChatRequest, GenerationParams, Message, Role, Usage};
use crate::services::api::{ApiClient, Completion};
use crate::services::catalog::ModelCatalog;

/// Everything one turn needs, snapshotted at submit time so later UI changes
/// cannot leak into an in-flight request.
pub struct TurnContext {
    pub credential: String,
    pub model: String,
    pub voice: String,
    pub params: GenerationParams,
    pub system_prompt: String,
    /// Full history of the active conversation, already including the new
    /// user message.
    pub history: Vec<Message>,
}

/// Preconditions checked before anything is mutated. Order matters: the
/// credential gates the catalog, the catalog gates the input.
pub fn validate(
    credential: &str,
    catalog: &ModelCatalog,
    user_text: &str,
    busy: bool,
) -> Result<(), TurnError> {
    if credential.trim().is_empty() {
        return Err(TurnError::MissingCredential);
    }
    if !catalog.is_ready() {
        return Err(TurnError::ModelsNotReady);
    }
    if user_text.trim().is_empty() {
        return Err(TurnError::EmptyInput);
    }
    if busy {
        return Err(TurnError::Busy);
    }
    Ok(())
}

/// Outgoing message list: a synthetic leading system message followed by the
/// conversation history. The system prompt is never part of the history
/// itself.
pub fn completion_request(ctx: &TurnContext) -> ChatRequest {
    let mut messages = Vec::with_capacity(ctx.history.len() + 1);
    messages.push(Message::new(Role::System, ctx.system_prompt.clone()));
    messages.extend(ctx.history.iter().cloned());
    ChatRequest {
        messages,
        model: ctx.model.clone(),
        temperature: ctx.params.temperature,
        max_completion_tokens: ctx.params.max_completion_tokens,
        top_p: ctx.params.top_p,
        frequency_penalty: ctx.params.frequency_penalty,
        presence_penalty: ctx.params.presence_penalty,
        stream: false,
    }
}

pub async fn run_completion(ctx: &TurnContext) -> Result<Completion, TurnError> {
    match ApiClient::chat_completion(&ctx.credential, &completion_request(ctx)).await {
        Ok(completion) => Ok(completion),
        Err(ApiError::EmptyCompletion) => Err(TurnError::EmptyCompletion),
        Err(e) => Err(TurnError::Completion(e)),
    }
}

pub async fn run_speech(ctx: &TurnContext, text: &str) -> Result<Vec<u8>, TurnError> {
    ApiClient::synthesize_speech(&ctx.credential, &ctx.voice, text)
        .await
        .map_err(TurnError::Speech)
}

/// ` (N tokens / S.SSs)` once the response reported usage, empty otherwise.
/// Appended to the status line for the rest of the turn.
pub fn usage_suffix(usage: Option<&Usage>) -> String {
    let usage = match usage {
        Some(u) => u,
        None => return String::new(),
    };
    match (usage.completion_tokens, usage.total_time) {
        (Some(tokens), Some(time)) => format!(" ({} tokens / {:.2}s)", tokens, time),
        (Some(tokens), None) => format!(" ({} tokens)", tokens),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelEntry, DEFAULT_CHAT_MODEL};

    fn ready_catalog() -> ModelCatalog {
        let mut catalog = ModelCatalog::default();
        let entries: Vec<ModelEntry> = serde_json::from_str(&format!(
            r#"[{{"id":"{}"}},{{"id":"mixtral-8x7b-32768"}}]"#,
            DEFAULT_CHAT_MODEL
        ))
        .unwrap();
        catalog.populate(entries).unwrap();
        catalog
    }

    fn ctx() -> TurnContext {
        TurnContext {
            credential: "key".into(),
            model: DEFAULT_CHAT_MODEL.into(),
            voice: "Fritz-PlayAI".into(),
            params: GenerationParams::default(),
            system_prompt: "You are terse.".into(),
            history: vec![
                Message::new(Role::User, "hi"),
                Message::new(Role::Assistant, "hello"),
                Message::new(Role::User, "how are you"),
            ],
        }
    }

    #[test]
    fn validate_rejects_missing_credential_first() {
        let err = validate("  ", &ready_catalog(), "hello", false).unwrap_err();
        assert_eq!(err, TurnError::MissingCredential);
    }

    #[test]
    fn validate_rejects_unready_catalog() {
        let err = validate("key", &ModelCatalog::default(), "hello", false).unwrap_err();
        assert_eq!(err, TurnError::ModelsNotReady);
    }

    #[test]
    fn validate_rejects_blank_input_and_busy_pipeline() {
        assert_eq!(
            validate("key", &ready_catalog(), "   ", false).unwrap_err(),
            TurnError::EmptyInput
        );
        assert_eq!(
            validate("key", &ready_catalog(), "hello", true).unwrap_err(),
            TurnError::Busy
        );
    }

    #[test]
    fn validate_accepts_a_ready_turn() {
        assert!(validate("key", &ready_catalog(), "hello", false).is_ok());
    }

    #[test]
    fn request_injects_system_message_ahead_of_history() {
        let req = completion_request(&ctx());
        assert_eq!(req.messages.len(), 4);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[0].content, "You are terse.");
        assert_eq!(req.messages[1].role, Role::User);
        assert_eq!(req.messages[3].content, "how are you");
        assert!(!req.stream);
        assert_eq!(req.model, DEFAULT_CHAT_MODEL);
    }

    #[test]
    fn request_carries_current_parameters() {
        let mut context = ctx();
        context.params.temperature = 1.2;
        context.params.max_completion_tokens = 256;
        let req = completion_request(&context);
        assert_eq!(req.temperature, 1.2);
        assert_eq!(req.max_completion_tokens, 256);
    }

    #[test]
    fn usage_suffix_formats_tokens_and_time() {
        let usage: Usage =
            serde_json::from_str(r#"{"completion_tokens":42,"total_time":1.234}"#).unwrap();
        assert_eq!(usage_suffix(Some(&usage)), " (42 tokens / 1.23s)");
    }

    #[test]
    fn usage_suffix_degrades_gracefully() {
        assert_eq!(usage_suffix(None), "");
        let partial: Usage = serde_json::from_str(r#"{"completion_tokens":7}"#).unwrap();
        assert_eq!(usage_suffix(Some(&partial)), " (7 tokens)");
        let empty: Usage = serde_json::from_str("{}").unwrap();
        assert_eq!(usage_suffix(Some(&empty)), "");
    }
}
