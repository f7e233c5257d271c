use crate::models::{GenerationParams, ParamField};
use crate::services::storage::{self, KeyValueStore};
use web_sys::console;

const KEY_PARAMS: &str = "groq_llm_params";

/// Owns the tunable generation parameters. Loading merges whatever is in
/// storage over the defaults and never fails visibly; every update persists
/// the full record immediately.
#[derive(Clone)]
pub struct ParamStore<B: KeyValueStore> {
    backend: B,
    params: GenerationParams,
}

impl<B: KeyValueStore> ParamStore<B> {
    pub fn load(backend: B) -> Self {
        let params = storage::read_json(&backend, KEY_PARAMS).unwrap_or_default();
        Self { backend, params }
    }

    pub fn get(&self) -> GenerationParams {
        self.params
    }

    /// Write-through: validation happens in `ParamField::apply`, then the
    /// whole record is persisted. A failed write keeps the in-memory value.
    pub fn set(&mut self, field: ParamField, raw: f64) {
        field.apply(&mut self.params, raw);
        if let Err(e) = storage::write_json(&self.backend, KEY_PARAMS, &self.params) {
            console::error_1(&format!("failed to save generation params: {}", e).into());
        }
    }
}
