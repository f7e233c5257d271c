use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_CHAT_MODEL: &str = "llama3-8b-8192";

pub const AVAILABLE_VOICES: [&str; 19] = [
    "Arista-PlayAI",
    "Atlas-PlayAI",
    "Basil-PlayAI",
    "Briggs-PlayAI",
    "Calum-PlayAI",
    "Celeste-PlayAI",
    "Cheyenne-PlayAI",
    "Chip-PlayAI",
    "Cillian-PlayAI",
    "Deedee-PlayAI",
    "Fritz-PlayAI",
    "Gail-PlayAI",
    "Indigo-PlayAI",
    "Mamaw-PlayAI",
    "Mason-PlayAI",
    "Mikail-PlayAI",
    "Mitch-PlayAI",
    "Quinn-PlayAI",
    "Thunder-PlayAI",
];
pub const DEFAULT_VOICE: &str = "Fritz-PlayAI";

/// Display name shown in the voice selector.
pub fn voice_label(id: &str) -> &str {
    id.strip_suffix("-PlayAI").unwrap_or(id)
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Error,
}

impl Role {
    /// Only user and assistant turns ever reach storage. The system prompt is
    /// a separate conversation field, and error entries are display-only.
    pub fn is_persistable(self) -> bool {
        matches!(self, Role::User | Role::Assistant)
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A persisted conversation record. Field names stay camelCase so the stored
/// JSON matches what earlier deployments of this app already wrote.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub created_at: f64,
    #[serde(default)]
    pub last_updated: f64,
}

impl Conversation {
    /// Sort key for "most recent first" and for picking the conversation to
    /// resume on startup.
    pub fn recency(&self) -> f64 {
        if self.last_updated > 0.0 {
            self.last_updated
        } else {
            self.created_at
        }
    }
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

pub const MAX_TOKENS_FALLBACK: u32 = 1024;

/// The complete tunable-parameter record. Every field carries a serde default
/// so a partial record loaded from storage merges over the defaults instead
/// of failing or leaving holes.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct GenerationParams {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_completion_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default)]
    pub frequency_penalty: f64,
    #[serde(default)]
    pub presence_penalty: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_completion_tokens: default_max_tokens(),
            top_p: default_top_p(),
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_top_p() -> f64 {
    1.0
}

/// Logical parameter names with their validation and formatting rules, kept
/// as pure data so the settings panel can render controls from it without the
/// rules depending on any presentation detail.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParamField {
    Temperature,
    MaxTokens,
    TopP,
    FrequencyPenalty,
    PresencePenalty,
}

impl ParamField {
    pub const ALL: [ParamField; 5] = [
        ParamField::Temperature,
        ParamField::MaxTokens,
        ParamField::TopP,
        ParamField::FrequencyPenalty,
        ParamField::PresencePenalty,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ParamField::Temperature => "Temperature",
            ParamField::MaxTokens => "Max Tokens",
            ParamField::TopP => "Top P",
            ParamField::FrequencyPenalty => "Frequency Penalty",
            ParamField::PresencePenalty => "Presence Penalty",
        }
    }

    /// (min, max, step) for the slider-backed fields.
    pub fn range(self) -> (f64, f64, f64) {
        match self {
            ParamField::Temperature => (0.0, 2.0, 0.1),
            ParamField::MaxTokens => (1.0, 32768.0, 1.0),
            ParamField::TopP => (0.0, 1.0, 0.05),
            ParamField::FrequencyPenalty => (-2.0, 2.0, 0.1),
            ParamField::PresencePenalty => (-2.0, 2.0, 0.1),
        }
    }

    /// Max tokens is a free-form number input; everything else is a slider.
    pub fn is_slider(self) -> bool {
        !matches!(self, ParamField::MaxTokens)
    }

    /// Decimal places for the value readout next to a slider.
    pub fn precision(self) -> usize {
        match self {
            ParamField::TopP => 2,
            ParamField::MaxTokens => 0,
            _ => 1,
        }
    }

    pub fn get(self, params: &GenerationParams) -> f64 {
        match self {
            ParamField::Temperature => params.temperature,
            ParamField::MaxTokens => f64::from(params.max_completion_tokens),
            ParamField::TopP => params.top_p,
            ParamField::FrequencyPenalty => params.frequency_penalty,
            ParamField::PresencePenalty => params.presence_penalty,
        }
    }

    /// Applies a raw control value onto the record. Max tokens must end up a
    /// positive integer; anything invalid coerces to the fixed fallback.
    pub fn apply(self, params: &mut GenerationParams, raw: f64) {
        match self {
            ParamField::Temperature => params.temperature = raw,
            ParamField::TopP => params.top_p = raw,
            ParamField::FrequencyPenalty => params.frequency_penalty = raw,
            ParamField::PresencePenalty => params.presence_penalty = raw,
            ParamField::MaxTokens => {
                params.max_completion_tokens = if raw.is_finite() && raw >= 1.0 {
                    raw as u32
                } else {
                    MAX_TOKENS_FALLBACK
                };
            }
        }
    }
}

// API DTOs

#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub model: String,
    pub temperature: f64,
    pub max_completion_tokens: u32,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub stream: bool,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
pub struct ChatChoice {
    pub message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Deserialize, Clone, PartialEq, Debug)]
pub struct Usage {
    pub completion_tokens: Option<u64>,
    pub total_time: Option<f64>,
}

#[derive(Deserialize, Debug)]
pub struct ModelListResponse {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

#[derive(Deserialize, Clone, PartialEq, Debug)]
pub struct ModelEntry {
    pub id: String,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Serialize, Debug)]
pub struct SpeechRequest {
    pub model: String,
    pub voice: String,
    pub input: String,
    pub response_format: String,
}

#[derive(Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: Option<ErrorDetail>,
}

#[derive(Deserialize, Debug)]
pub struct ErrorDetail {
    pub message: Option<String>,
}

/// One line of user-visible pipeline state, shown under the transcript.
#[derive(Clone, PartialEq, Debug)]
pub struct Status {
    pub text: String,
    pub kind: StatusKind,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StatusKind {
    Info,
    Working,
    Error,
}

impl Status {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Info,
        }
    }

    pub fn working(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Working,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn conversation_round_trips_camel_case() {
        let conv = Conversation {
            id: "abc".into(),
            name: "hello".into(),
            system_prompt: "be brief".into(),
            messages: vec![Message::new(Role::User, "hi")],
            created_at: 100.0,
            last_updated: 200.0,
        };
        let json = serde_json::to_string(&conv).unwrap();
        assert!(json.contains("\"systemPrompt\""));
        assert!(json.contains("\"lastUpdated\""));
        let back: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, conv);
    }

    #[test]
    fn conversation_tolerates_missing_fields() {
        let back: Conversation = serde_json::from_str(r#"{"id":"only-id"}"#).unwrap();
        assert_eq!(back.id, "only-id");
        assert_eq!(back.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert!(back.messages.is_empty());
    }

    #[test]
    fn recency_prefers_last_updated_then_created() {
        let mut conv: Conversation = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        conv.created_at = 50.0;
        assert_eq!(conv.recency(), 50.0);
        conv.last_updated = 75.0;
        assert_eq!(conv.recency(), 75.0);
    }

    #[test]
    fn partial_params_merge_over_defaults() {
        let params: GenerationParams = serde_json::from_str(r#"{"temperature":1.5}"#).unwrap();
        assert_eq!(params.temperature, 1.5);
        assert_eq!(params.max_completion_tokens, 8192);
        assert_eq!(params.top_p, 1.0);
        assert_eq!(params.frequency_penalty, 0.0);
    }

    #[test]
    fn max_tokens_coerces_invalid_input() {
        let mut params = GenerationParams::default();
        for bad in [0.0, -5.0, f64::NAN] {
            ParamField::MaxTokens.apply(&mut params, bad);
            assert_eq!(params.max_completion_tokens, MAX_TOKENS_FALLBACK);
        }
        ParamField::MaxTokens.apply(&mut params, 2048.0);
        assert_eq!(params.max_completion_tokens, 2048);
    }

    #[test]
    fn chat_request_uses_api_field_names() {
        let req = ChatRequest {
            messages: vec![Message::new(Role::System, "p")],
            model: "m".into(),
            temperature: 0.7,
            max_completion_tokens: 1024,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stream: false,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"max_completion_tokens\":1024"));
        assert!(json.contains("\"frequency_penalty\":0.0"));
        assert!(json.contains("\"stream\":false"));
    }

    #[test]
    fn voice_label_strips_suffix() {
        assert_eq!(voice_label("Fritz-PlayAI"), "Fritz");
        assert_eq!(voice_label("plain"), "plain");
    }
}
