use thiserror::Error;

/// Failures at the remote-endpoint boundary. Non-2xx responses carry the
/// remote error message when one can be decoded, the HTTP status otherwise.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("empty response from assistant")]
    EmptyCompletion,
}

impl ApiError {
    pub fn transport(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Conversation-store failures. Loads never error (they fall back to empty
/// state); saves surface here without rolling back the in-memory mutation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("chat {0} not found")]
    UnknownConversation(String),

    #[error("failed to save chat history: {0}")]
    Storage(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error("No compatible chat models found.")]
    NoCompatibleModels,
}

/// Everything that can end a turn early, from validation through playback.
/// Each stage keeps its identity so the status line can say which call died.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TurnError {
    #[error("API Key missing! Please enter it in Settings.")]
    MissingCredential,

    #[error("LLM models not loaded or none selected.")]
    ModelsNotReady,

    #[error("Type a message first.")]
    EmptyInput,

    #[error("A message is already being processed.")]
    Busy,

    #[error("Chat API Error: {0}")]
    Completion(ApiError),

    #[error("Empty response from assistant.")]
    EmptyCompletion,

    #[error("TTS API Error: {0}")]
    Speech(ApiError),

    #[error("Audio playback failed: {0}")]
    Playback(String),

    #[error("{0}")]
    Storage(StoreError),
}
