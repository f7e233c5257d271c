use std::cmp::Ordering;

use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Conversation, Message, Role, DEFAULT_SYSTEM_PROMPT};
use crate::services::storage::{self, KeyValueStore};

const KEY_CHATS: &str = "groq_saved_chats";
const KEY_ACTIVE: &str = "groq_active_chat_id";

/// Auto-generated names start with this prefix; only names still in that
/// form (or empty) are ever regenerated from the first user message.
const AUTO_NAME_PREFIX: &str = "Chat ";

/// Owns the set of saved conversations and the active pointer.
///
/// A new conversation exists only as the active id (plus a draft message
/// buffer) until `commit` materializes it — the first successful assistant
/// reply is what makes a conversation durable. The record list and the
/// active pointer are always persisted together so a reload never observes
/// one without the other.
#[derive(Clone)]
pub struct ConversationStore<B: KeyValueStore> {
    backend: B,
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    /// Messages buffered for an active id with no materialized record yet.
    draft: Vec<Message>,
    /// System prompt shown and sent for the active conversation.
    system_prompt: String,
}

impl<B: KeyValueStore> ConversationStore<B> {
    /// Absent or corrupt state loads as empty; a persisted active id that no
    /// longer matches a record is dropped here rather than trusted.
    pub fn load(backend: B) -> Self {
        let conversations: Vec<Conversation> =
            storage::read_json(&backend, KEY_CHATS).unwrap_or_default();
        let active_id = backend
            .get_raw(KEY_ACTIVE)
            .filter(|id| conversations.iter().any(|c| &c.id == id));
        let system_prompt = active_id
            .as_ref()
            .and_then(|id| conversations.iter().find(|c| &c.id == id))
            .map(|c| c.system_prompt.clone())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        Self {
            backend,
            conversations,
            active_id,
            draft: Vec::new(),
            system_prompt,
        }
    }

    /// Picks the conversation to continue after a load: a valid persisted
    /// pointer wins, else the most recently updated record, else a fresh one.
    pub fn resume(&mut self) -> Result<(), StoreError> {
        if self.active_id.is_some() {
            return Ok(());
        }
        match self.most_recent_id() {
            Some(id) => self.switch_to(&id),
            None => self.start_new(),
        }
    }

    /// Fresh id, active immediately, no record until `commit`.
    pub fn start_new(&mut self) -> Result<(), StoreError> {
        self.active_id = Some(Uuid::new_v4().to_string());
        self.draft.clear();
        self.system_prompt = DEFAULT_SYSTEM_PROMPT.to_string();
        self.save()
    }

    pub fn switch_to(&mut self, id: &str) -> Result<(), StoreError> {
        if self.active_id.as_deref() == Some(id) {
            return Ok(());
        }
        let conv = self
            .conversations
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::UnknownConversation(id.to_string()))?;
        self.system_prompt = conv.system_prompt.clone();
        self.active_id = Some(id.to_string());
        self.draft.clear();
        self.save()
    }

    /// Appends to the active conversation in memory only. Nothing is durable
    /// until `commit`; non-persistable roles are ignored.
    pub fn append_message(&mut self, role: Role, content: &str) {
        if !role.is_persistable() || self.active_id.is_none() {
            return;
        }
        let msg = Message::new(role, content);
        match self.active_record_mut() {
            Some(conv) => conv.messages.push(msg),
            None => self.draft.push(msg),
        }
    }

    /// The sole point where the active conversation becomes (or stays)
    /// durable: updates the existing record's prompt/messages/timestamps, or
    /// materializes a new record from the draft buffer, then persists the
    /// whole snapshot.
    pub fn commit(&mut self, now_ms: f64) -> Result<(), StoreError> {
        let id = match self.active_id.clone() {
            Some(id) => id,
            None => return Ok(()),
        };
        let system_prompt = effective_prompt(&self.system_prompt);
        if let Some(conv) = self.conversations.iter_mut().find(|c| c.id == id) {
            conv.system_prompt = system_prompt;
            conv.last_updated = now_ms;
            let name = derive_name(&conv.messages, &id);
            if conv.name != name
                && (conv.name.is_empty() || conv.name.starts_with(AUTO_NAME_PREFIX))
            {
                conv.name = name;
            }
        } else {
            let messages = std::mem::take(&mut self.draft);
            let name = derive_name(&messages, &id);
            self.conversations.push(Conversation {
                id,
                name,
                system_prompt,
                messages,
                created_at: now_ms,
                last_updated: now_ms,
            });
        }
        self.save()
    }

    /// Removing the active conversation switches to the most recent
    /// remaining one, or starts fresh when none is left. Unknown ids are a
    /// no-op.
    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() == before {
            return Ok(());
        }
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
            self.draft.clear();
            return match self.most_recent_id() {
                Some(next) => self.switch_to(&next),
                None => self.start_new(),
            };
        }
        self.save()
    }

    pub fn update_system_prompt(&mut self, text: &str, now_ms: f64) -> Result<(), StoreError> {
        self.system_prompt = text.to_string();
        if self.active_record().is_some() {
            self.commit(now_ms)
        } else {
            Ok(())
        }
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active_record(&self) -> Option<&Conversation> {
        let id = self.active_id.as_deref()?;
        self.conversations.iter().find(|c| c.id == id)
    }

    fn active_record_mut(&mut self) -> Option<&mut Conversation> {
        let id = self.active_id.clone()?;
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    /// The active conversation's full in-memory history: record messages
    /// once materialized, the draft buffer before that.
    pub fn active_messages(&self) -> &[Message] {
        match self.active_record() {
            Some(conv) => &conv.messages,
            None => &self.draft,
        }
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active_record().map(|c| c.name.as_str())
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Prompt actually sent with a request: blank falls back to the default.
    pub fn effective_system_prompt(&self) -> String {
        effective_prompt(&self.system_prompt)
    }

    /// Records ordered most-recent-first for the sidebar.
    pub fn sorted(&self) -> Vec<Conversation> {
        let mut list = self.conversations.clone();
        list.sort_by(|a, b| {
            b.recency()
                .partial_cmp(&a.recency())
                .unwrap_or(Ordering::Equal)
        });
        list
    }

    pub fn find(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    fn most_recent_id(&self) -> Option<String> {
        self.conversations
            .iter()
            .max_by(|a, b| {
                a.recency()
                    .partial_cmp(&b.recency())
                    .unwrap_or(Ordering::Equal)
            })
            .map(|c| c.id.clone())
    }

    /// List and active pointer land in storage together so a reload never
    /// resumes an id whose record is gone.
    fn save(&self) -> Result<(), StoreError> {
        storage::write_json(&self.backend, KEY_CHATS, &self.conversations)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        match &self.active_id {
            Some(id) => self
                .backend
                .set_raw(KEY_ACTIVE, id)
                .map_err(|e| StoreError::Storage(e.to_string()))?,
            None => self.backend.remove(KEY_ACTIVE),
        }
        Ok(())
    }
}

fn effective_prompt(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_SYSTEM_PROMPT.to_string()
    } else {
        trimmed.to_string()
    }
}

/// First user message, first six words, cut to forty characters; the auto
/// form otherwise.
fn derive_name(messages: &[Message], id: &str) -> String {
    let first_user = messages
        .iter()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("");
    let name: String = first_user
        .split_whitespace()
        .take(6)
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(40)
        .collect();
    if name.is_empty() {
        format!("{}{}", AUTO_NAME_PREFIX, id.get(..8).unwrap_or(id))
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::fake::MemoryStore;

    fn store() -> (MemoryStore, ConversationStore<MemoryStore>) {
        let backend = MemoryStore::new();
        let store = ConversationStore::load(backend.clone());
        (backend, store)
    }

    fn persisted(backend: &MemoryStore) -> Vec<Conversation> {
        backend
            .raw("groq_saved_chats")
            .map(|raw| serde_json::from_str(&raw).unwrap())
            .unwrap_or_default()
    }

    #[test]
    fn starts_empty_without_stored_state() {
        let (_backend, store) = store();
        assert!(store.active_id().is_none());
        assert!(store.active_messages().is_empty());
        assert!(store.sorted().is_empty());
    }

    #[test]
    fn start_new_persists_pointer_but_no_record() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        assert!(store.active_id().is_some());
        assert_eq!(
            backend.raw("groq_active_chat_id").as_deref(),
            store.active_id()
        );
        assert!(persisted(&backend).is_empty());
    }

    #[test]
    fn messages_buffer_until_commit_materializes_one_record() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        store.append_message(Role::User, "what is rust");
        assert!(persisted(&backend).is_empty());

        store.append_message(Role::Assistant, "a systems language");
        store.commit(1_000.0).unwrap();

        let records = persisted(&backend);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].messages.len(), 2);
        assert_eq!(records[0].messages[0].role, Role::User);
        assert_eq!(records[0].messages[1].role, Role::Assistant);
        assert_eq!(records[0].created_at, 1_000.0);
        assert_eq!(records[0].last_updated, 1_000.0);
    }

    #[test]
    fn uncommitted_user_message_is_not_durable() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        store.append_message(Role::User, "this turn will fail");
        // completion failed: no commit happens
        assert!(persisted(&backend).is_empty());
        // in-memory transcript still shows it for this session
        assert_eq!(store.active_messages().len(), 1);
    }

    #[test]
    fn commit_after_speech_failure_keeps_both_messages() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        store.append_message(Role::User, "hello");
        store.append_message(Role::Assistant, "hi there");
        store.commit(5.0).unwrap();
        // the speech stage failing afterwards changes nothing durable
        let records = persisted(&backend);
        assert_eq!(records[0].messages.len(), 2);
    }

    #[test]
    fn error_and_system_roles_are_never_buffered() {
        let (_backend, mut store) = store();
        store.start_new().unwrap();
        store.append_message(Role::Error, "boom");
        store.append_message(Role::System, "prompt");
        assert!(store.active_messages().is_empty());
    }

    #[test]
    fn name_derives_from_first_user_message() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        store.append_message(Role::User, "one two three four five six seven eight");
        store.append_message(Role::Assistant, "ok");
        store.commit(1.0).unwrap();
        assert_eq!(persisted(&backend)[0].name, "one two three four five six");
    }

    #[test]
    fn long_first_message_truncates_to_forty_chars() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        let word = "abcdefghijklmnopqrstuvwxyz0123456789abcd";
        store.append_message(Role::User, &format!("{}{}", word, word));
        store.append_message(Role::Assistant, "ok");
        store.commit(1.0).unwrap();
        assert_eq!(persisted(&backend)[0].name.chars().count(), 40);
    }

    #[test]
    fn user_renamed_conversation_is_not_regenerated() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        store.append_message(Role::User, "first question");
        store.append_message(Role::Assistant, "a");
        store.commit(1.0).unwrap();

        // simulate a stored record carrying a user-meaningful name
        let mut records = persisted(&backend);
        records[0].name = "My research notes".to_string();
        storage::write_json(&backend, "groq_saved_chats", &records).unwrap();
        let mut store = ConversationStore::load(backend.clone());

        store.append_message(Role::User, "second question");
        store.append_message(Role::Assistant, "b");
        store.commit(2.0).unwrap();
        assert_eq!(persisted(&backend)[0].name, "My research notes");
    }

    #[test]
    fn switch_to_unknown_id_leaves_pointer_alone() {
        let (_backend, mut store) = store();
        store.start_new().unwrap();
        let active = store.active_id().unwrap().to_string();
        let err = store.switch_to("nope").unwrap_err();
        assert_eq!(err, StoreError::UnknownConversation("nope".to_string()));
        assert_eq!(store.active_id(), Some(active.as_str()));
    }

    #[test]
    fn switch_loads_the_target_system_prompt() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        let first = store.active_id().unwrap().to_string();
        store.update_system_prompt("Speak like a pirate.", 1.0).unwrap();
        store.append_message(Role::User, "ahoy");
        store.append_message(Role::Assistant, "arr");
        store.commit(1.0).unwrap();

        store.start_new().unwrap();
        assert_eq!(store.system_prompt(), DEFAULT_SYSTEM_PROMPT);

        store.switch_to(&first).unwrap();
        assert_eq!(store.system_prompt(), "Speak like a pirate.");
        assert_eq!(backend.raw("groq_active_chat_id").as_deref(), Some(first.as_str()));
    }

    #[test]
    fn deleting_active_switches_to_most_recent_remaining() {
        let (backend, mut store) = store();
        for (text, ts) in [("alpha", 100.0), ("bravo", 200.0), ("charlie", 300.0)] {
            store.start_new().unwrap();
            store.append_message(Role::User, text);
            store.append_message(Role::Assistant, "ok");
            store.commit(ts).unwrap();
        }
        let active = store.active_id().unwrap().to_string();
        store.delete(&active).unwrap();

        // bravo (ts 200) is the most recent survivor
        assert_eq!(store.active_name(), Some("bravo"));
        assert_eq!(
            backend.raw("groq_active_chat_id").as_deref(),
            store.active_id()
        );
    }

    #[test]
    fn deleting_last_conversation_starts_a_fresh_empty_one() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        store.append_message(Role::User, "only one");
        store.append_message(Role::Assistant, "ok");
        store.commit(1.0).unwrap();

        let id = store.active_id().unwrap().to_string();
        store.delete(&id).unwrap();

        assert!(store.active_id().is_some());
        assert_ne!(store.active_id(), Some(id.as_str()));
        assert!(persisted(&backend).is_empty());
        assert!(store.active_messages().is_empty());
    }

    #[test]
    fn deleting_inactive_conversation_only_persists_removal() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        store.append_message(Role::User, "keep me");
        store.append_message(Role::Assistant, "ok");
        store.commit(100.0).unwrap();
        let keep = store.active_id().unwrap().to_string();

        store.start_new().unwrap();
        store.append_message(Role::User, "drop me");
        store.append_message(Role::Assistant, "ok");
        store.commit(200.0).unwrap();
        let drop = store.active_id().unwrap().to_string();

        store.switch_to(&keep).unwrap();
        store.delete(&drop).unwrap();
        assert_eq!(store.active_id(), Some(keep.as_str()));
        assert_eq!(persisted(&backend).len(), 1);
    }

    #[test]
    fn reload_resumes_most_recent_when_pointer_is_missing() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        store.append_message(Role::User, "old");
        store.append_message(Role::Assistant, "ok");
        store.commit(100.0).unwrap();

        store.start_new().unwrap();
        store.append_message(Role::User, "new");
        store.append_message(Role::Assistant, "ok");
        store.commit(200.0).unwrap();

        backend.remove("groq_active_chat_id");
        let mut reloaded = ConversationStore::load(backend.clone());
        reloaded.resume().unwrap();
        assert_eq!(reloaded.active_name(), Some("new"));
    }

    #[test]
    fn dangling_active_pointer_is_dropped_on_load() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        store.append_message(Role::User, "real");
        store.append_message(Role::Assistant, "ok");
        store.commit(100.0).unwrap();

        backend.set_raw("groq_active_chat_id", "ghost-id").unwrap();
        let mut reloaded = ConversationStore::load(backend.clone());
        assert!(reloaded.active_id().is_none());
        reloaded.resume().unwrap();
        assert_eq!(reloaded.active_name(), Some("real"));
    }

    #[test]
    fn corrupt_stored_list_loads_as_empty() {
        let backend = MemoryStore::new();
        backend.set_raw("groq_saved_chats", "][").unwrap();
        let store = ConversationStore::load(backend);
        assert!(store.sorted().is_empty());
    }

    #[test]
    fn blank_system_prompt_commits_as_default() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        store.update_system_prompt("   ", 1.0).unwrap();
        store.append_message(Role::User, "hi");
        store.append_message(Role::Assistant, "hello");
        store.commit(1.0).unwrap();
        assert_eq!(persisted(&backend)[0].system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn prompt_edit_persists_only_once_materialized() {
        let (backend, mut store) = store();
        store.start_new().unwrap();
        store.update_system_prompt("Be terse.", 1.0).unwrap();
        assert!(persisted(&backend).is_empty());

        store.append_message(Role::User, "hi");
        store.append_message(Role::Assistant, "hello");
        store.commit(2.0).unwrap();
        assert_eq!(persisted(&backend)[0].system_prompt, "Be terse.");

        store.update_system_prompt("Be verbose.", 3.0).unwrap();
        assert_eq!(persisted(&backend)[0].system_prompt, "Be verbose.");
        assert_eq!(persisted(&backend)[0].last_updated, 3.0);
    }

    #[test]
    fn sorted_orders_most_recent_first() {
        let (_backend, mut store) = store();
        for (text, ts) in [("a", 300.0), ("b", 100.0), ("c", 200.0)] {
            store.start_new().unwrap();
            store.append_message(Role::User, text);
            store.append_message(Role::Assistant, "ok");
            store.commit(ts).unwrap();
        }
        let names: Vec<_> = store.sorted().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["a", "c", "b"]);
    }
}
