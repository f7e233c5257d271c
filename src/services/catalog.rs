use crate::error::CatalogError;
use crate::models::{ModelEntry, DEFAULT_CHAT_MODEL};

/// Model ids carrying any of these markers are transcription, speech or
/// moderation models and never usable for chat.
const EXCLUDED_ID_MARKERS: [&str; 3] = ["whisper", "tts", "guard"];

/// Which chat models the remote service offers, and whether a send is
/// currently possible. Stays empty and not-loaded until a refresh succeeds;
/// the network call itself lives in the API client.
#[derive(Clone, Default, PartialEq)]
pub struct ModelCatalog {
    models: Vec<String>,
    selected: Option<String>,
    loaded: bool,
}

impl ModelCatalog {
    /// Filters and adopts a fetched model list. Leaves the catalog cleared
    /// when nothing usable remains.
    pub fn populate(&mut self, entries: Vec<ModelEntry>) -> Result<(), CatalogError> {
        let mut ids = filter_chat_models(entries);
        if ids.is_empty() {
            self.clear();
            return Err(CatalogError::NoCompatibleModels);
        }
        ids.sort();
        let selected = if ids.iter().any(|id| id == DEFAULT_CHAT_MODEL) {
            DEFAULT_CHAT_MODEL.to_string()
        } else {
            ids[0].clone()
        };
        self.models = ids;
        self.selected = Some(selected);
        self.loaded = true;
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Ignores ids that are not in the catalog.
    pub fn select(&mut self, id: &str) {
        if self.models.iter().any(|m| m == id) {
            self.selected = Some(id.to_string());
        }
    }

    /// Gate for the turn pipeline: a send needs a loaded catalog and a
    /// selected model.
    pub fn is_ready(&self) -> bool {
        self.loaded && self.selected.is_some()
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }
}

fn filter_chat_models(entries: Vec<ModelEntry>) -> Vec<String> {
    entries
        .into_iter()
        .filter(|e| !e.id.is_empty())
        .filter(|e| {
            let id = e.id.to_ascii_lowercase();
            !EXCLUDED_ID_MARKERS.iter().any(|marker| id.contains(marker))
        })
        .filter(|e| e.active.unwrap_or(true))
        .map(|e| e.id)
        .collect()
}
