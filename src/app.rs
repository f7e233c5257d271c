use wasm_bindgen_futures::spawn_local;
use web_sys::console;
use yew::prelude::*;

use crate::components::{chat_area::ChatArea, settings::SettingsModal, sidebar::Sidebar};
use crate::error::TurnError;
use crate::models::{Message, ParamField, Role, Status, DEFAULT_VOICE};
use crate::pipeline::{self, TurnContext};
use crate::services::api::ApiClient;
use crate::services::audio::{AudioSession, PlaybackResult};
use crate::services::catalog::ModelCatalog;
use crate::services::conversations::ConversationStore;
use crate::services::params::ParamStore;
use crate::services::storage::LocalStorage;
use crate::utils::now_ms;

const GLOBAL_STYLES: &str = r#"
    :root {
        --bg-app: #ffffff;
        --bg-sidebar: #f9f9f9;
        --border-color: #e5e5e5;
        --text-primary: #333;
        --text-secondary: #666;
        --accent-color: #10a37f;
        --accent-hover: #1a7f64;
        --danger-color: #ef4444;
    }

    * { box-sizing: border-box; }
    body { margin: 0; font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Helvetica, Arial, sans-serif; color: var(--text-primary); }

    .app-container { display: flex; height: 100vh; overflow: hidden; }
    .main-content { flex-grow: 1; display: flex; flex-direction: column; position: relative; background: var(--bg-app); }
    .header { padding: 10px 20px; border-bottom: 1px solid var(--border-color); display: flex; justify-content: space-between; align-items: center; height: 60px; }
    .header h2 { font-size: 1rem; margin: 0; font-weight: 600; overflow: hidden; white-space: nowrap; text-overflow: ellipsis; max-width: 500px; }

    .btn { cursor: pointer; border: 1px solid var(--border-color); background: white; padding: 8px 12px; border-radius: 6px; font-size: 0.9rem; transition: all 0.2s; color: var(--text-primary); }
    .btn:hover { background: #f0f0f0; }
    .btn:disabled { color: #bbb; cursor: default; }
    .btn-danger { color: var(--danger-color); border-color: var(--danger-color); }
    .btn-danger:hover { background: #fef2f2; }
    .btn-icon { border: none; background: transparent; font-size: 1.2rem; padding: 5px; color: var(--text-secondary); cursor: pointer; }
    .btn-icon:hover { background: rgba(0,0,0,0.05); color: var(--text-primary); }

    .form-input, .form-select, .form-textarea { width: 100%; padding: 8px; border: 1px solid var(--border-color); border-radius: 6px; font-family: inherit; margin-bottom: 10px; }
    .form-input:focus, .form-textarea:focus { outline: 2px solid var(--accent-color); border-color: transparent; }

    .markdown-body { line-height: 1.6; font-size: 1rem; }
    .markdown-body pre { background: #2d2d2d; color: #fff; padding: 15px; border-radius: 6px; overflow-x: auto; }
    .markdown-body code { background: #f4f4f4; padding: 2px 4px; border-radius: 4px; font-family: monospace; font-size: 0.9em; }
    .markdown-body pre code { background: transparent; color: inherit; }
    .markdown-body p { margin-top: 0; margin-bottom: 1em; }
"#;

/// One terminal update for a failed stage: status line, transcript error
/// bubble, submission re-enabled. Error entries never reach the store.
///
/// Takes the transcript value explicitly: state handles captured by an async
/// block are snapshots of the render they were created in, so the in-flight
/// turn threads its own up-to-date copy through instead of re-reading one.
fn finish_with_error(
    status: &UseStateHandle<Status>,
    transcript: &UseStateHandle<Vec<Message>>,
    mut shown: Vec<Message>,
    is_processing: &UseStateHandle<bool>,
    message: String,
) {
    status.set(Status::error(format!("Error: {}", message)));
    shown.push(Message::new(Role::Error, message));
    transcript.set(shown);
    is_processing.set(false);
}

fn confirm(prompt: &str) -> bool {
    web_sys::window()
        .map(|w| w.confirm_with_message(prompt).unwrap_or(false))
        .unwrap_or(false)
}

#[function_component(App)]
pub fn app() -> Html {
    let conversations = use_state(|| {
        let mut store = ConversationStore::load(LocalStorage);
        if let Err(e) = store.resume() {
            console::error_1(&format!("startup save failed: {}", e).into());
        }
        store
    });
    let params = use_state(|| ParamStore::load(LocalStorage));
    let catalog = use_state(ModelCatalog::default);

    // session-only; deliberately never persisted
    let credential = use_state(String::new);
    let voice = use_state(|| DEFAULT_VOICE.to_string());
    let speed = use_state(|| 1.0_f64);

    let transcript = {
        let initial = conversations.active_messages().to_vec();
        use_state(move || initial)
    };
    let input_text = use_state(String::new);
    let status = use_state(|| Status::info("Ready"));
    let is_processing = use_state(|| false);
    let show_settings = use_state(|| false);
    let sidebar_open = use_state(|| true);
    let audio = use_mut_ref(AudioSession::new);

    // --- CONVERSATION ACTIONS ---

    let on_new_chat = {
        let conversations = conversations.clone();
        let transcript = transcript.clone();
        let status = status.clone();
        let audio = audio.clone();
        Callback::from(move |_| {
            audio.borrow_mut().stop();
            let mut store = (*conversations).clone();
            match store.start_new() {
                Ok(()) => status.set(Status::info("New chat started. Type a message.")),
                Err(e) => status.set(Status::error(e.to_string())),
            }
            transcript.set(Vec::new());
            conversations.set(store);
        })
    };

    let on_select_chat = {
        let conversations = conversations.clone();
        let transcript = transcript.clone();
        let status = status.clone();
        let audio = audio.clone();
        Callback::from(move |target_id: String| {
            if (*conversations).active_id() == Some(target_id.as_str()) {
                return;
            }
            audio.borrow_mut().stop();
            let mut store = (*conversations).clone();
            match store.switch_to(&target_id) {
                Ok(()) => {
                    let name = store.active_name().unwrap_or("Unnamed Chat").to_string();
                    transcript.set(store.active_messages().to_vec());
                    conversations.set(store);
                    status.set(Status::info(format!("Switched to chat: {}", name)));
                }
                Err(e) => {
                    console::error_1(&format!("switch failed: {}", e).into());
                    status.set(Status::error("Error switching chat."));
                }
            }
        })
    };

    let on_delete_chat = {
        let conversations = conversations.clone();
        let transcript = transcript.clone();
        let status = status.clone();
        let audio = audio.clone();
        Callback::from(move |(e, id): (MouseEvent, String)| {
            e.stop_propagation();
            let store = (*conversations).clone();
            let name = store
                .find(&id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| id.clone());
            if !confirm(&format!("Are you sure you want to delete chat \"{}\"?", name)) {
                return;
            }
            audio.borrow_mut().stop();
            let mut store = store;
            match store.delete(&id) {
                Ok(()) => status.set(Status::info("Chat deleted.")),
                Err(err) => status.set(Status::error(err.to_string())),
            }
            transcript.set(store.active_messages().to_vec());
            conversations.set(store);
        })
    };

    let on_clear_chats = {
        let conversations = conversations.clone();
        let transcript = transcript.clone();
        let status = status.clone();
        let audio = audio.clone();
        Callback::from(move |_| {
            if !confirm("Irreversibly delete ALL chat history?") {
                return;
            }
            audio.borrow_mut().stop();
            let mut store = (*conversations).clone();
            let ids: Vec<String> = store.sorted().into_iter().map(|c| c.id).collect();
            let mut result = Ok(());
            for id in ids {
                if let Err(e) = store.delete(&id) {
                    result = Err(e);
                }
            }
            match result {
                Ok(()) => status.set(Status::info("Chat history cleared.")),
                Err(e) => status.set(Status::error(e.to_string())),
            }
            transcript.set(Vec::new());
            conversations.set(store);
        })
    };

    let on_system_prompt_change = {
        let conversations = conversations.clone();
        let status = status.clone();
        Callback::from(move |text: String| {
            let mut store = (*conversations).clone();
            if let Err(e) = store.update_system_prompt(&text, now_ms()) {
                status.set(Status::error(e.to_string()));
            }
            conversations.set(store);
        })
    };

    // --- SETTINGS ACTIONS ---

    let on_credential_change = {
        let credential = credential.clone();
        Callback::from(move |value: String| credential.set(value))
    };

    let on_param_change = {
        let params = params.clone();
        Callback::from(move |(field, raw): (ParamField, f64)| {
            let mut store = (*params).clone();
            store.set(field, raw);
            params.set(store);
        })
    };

    let on_voice_change = {
        let voice = voice.clone();
        Callback::from(move |value: String| voice.set(value))
    };

    let on_speed_change = {
        let speed = speed.clone();
        let audio = audio.clone();
        Callback::from(move |value: f64| {
            audio.borrow_mut().set_speed(value);
            speed.set(value);
        })
    };

    let on_load_models = {
        let catalog = catalog.clone();
        let credential = credential.clone();
        let status = status.clone();
        Callback::from(move |_| {
            if credential.trim().is_empty() {
                let mut cleared = (*catalog).clone();
                cleared.clear();
                catalog.set(cleared);
                status.set(Status::error("Enter an API key to load models."));
                return;
            }
            status.set(Status::working("Loading LLM models..."));
            let catalog = catalog.clone();
            let status = status.clone();
            let api_key = (*credential).clone();
            spawn_local(async move {
                match ApiClient::list_models(&api_key).await {
                    Ok(entries) => {
                        let mut next = (*catalog).clone();
                        match next.populate(entries) {
                            Ok(()) => status.set(Status::info("LLM models loaded.")),
                            Err(e) => status.set(Status::error(e.to_string())),
                        }
                        catalog.set(next);
                    }
                    Err(e) => {
                        let mut cleared = (*catalog).clone();
                        cleared.clear();
                        catalog.set(cleared);
                        status.set(Status::error(format!("Error loading models: {}", e)));
                    }
                }
            });
        })
    };

    let on_model_change = {
        let catalog = catalog.clone();
        Callback::from(move |id: String| {
            let mut next = (*catalog).clone();
            next.select(&id);
            catalog.set(next);
        })
    };

    // --- TURN PIPELINE ---

    let run_turn = {
        let conversations = conversations.clone();
        let transcript = transcript.clone();
        let input_text = input_text.clone();
        let params = params.clone();
        let catalog = catalog.clone();
        let credential = credential.clone();
        let voice = voice.clone();
        let speed = speed.clone();
        let status = status.clone();
        let is_processing = is_processing.clone();
        let show_settings = show_settings.clone();
        let audio = audio.clone();

        Callback::from(move |_| {
            let user_text = input_text.trim().to_string();

            if let Err(err) =
                pipeline::validate(&credential, &catalog, &user_text, *is_processing)
            {
                match err {
                    TurnError::MissingCredential | TurnError::ModelsNotReady => {
                        status.set(Status::error(err.to_string()));
                        let mut shown = (*transcript).clone();
                        shown.push(Message::new(Role::Error, err.to_string()));
                        transcript.set(shown);
                        show_settings.set(true);
                    }
                    // the disabled input already communicates these
                    TurnError::EmptyInput | TurnError::Busy => {}
                    _ => status.set(Status::error(err.to_string())),
                }
                return;
            }

            let mut store = (*conversations).clone();
            // safeguard: a send always has an active conversation to land in
            if store.active_id().is_none() {
                if let Err(e) = store.start_new() {
                    status.set(Status::error(e.to_string()));
                }
            }

            is_processing.set(true);
            status.set(Status::working("Sending message..."));
            audio.borrow_mut().stop();

            store.append_message(Role::User, &user_text);
            let mut shown = (*transcript).clone();
            shown.push(Message::new(Role::User, user_text.clone()));
            transcript.set(shown.clone());
            input_text.set(String::new());

            let ctx = TurnContext {
                credential: (*credential).clone(),
                model: catalog.selected().unwrap_or_default().to_string(),
                voice: (*voice).clone(),
                params: params.get(),
                system_prompt: store.effective_system_prompt(),
                history: store.active_messages().to_vec(),
            };
            conversations.set(store.clone());

            let conversations = conversations.clone();
            let transcript = transcript.clone();
            let status = status.clone();
            let is_processing = is_processing.clone();
            let audio = audio.clone();
            let speed_value = *speed;
            let model_label = ctx.model.clone();

            // `store` and `shown` travel through the async block by value:
            // the handles only re-read the render they were captured in.
            spawn_local(async move {
                let mut store = store;
                let mut shown = shown;

                status.set(Status::working(format!(
                    "Generating response ({})...",
                    model_label
                )));
                let completion = match pipeline::run_completion(&ctx).await {
                    Ok(c) => c,
                    Err(err) => {
                        // nothing was committed: the user message stays
                        // visible this session but is not durable on its own
                        finish_with_error(
                            &status,
                            &transcript,
                            shown,
                            &is_processing,
                            err.to_string(),
                        );
                        return;
                    }
                };
                let suffix = pipeline::usage_suffix(completion.usage.as_ref());

                // the text turn is the durable unit of value: commit now,
                // before speech gets a chance to fail
                store.append_message(Role::Assistant, &completion.text);
                let commit_result = store.commit(now_ms());
                conversations.set(store);

                shown.push(Message::new(Role::Assistant, completion.text.clone()));
                if let Err(e) = commit_result {
                    // the in-memory exchange stays authoritative; only the
                    // durable copy is behind until the next successful save
                    let err = TurnError::Storage(e);
                    shown.push(Message::new(Role::Error, err.to_string()));
                    status.set(Status::error(err.to_string()));
                }
                transcript.set(shown.clone());

                status.set(Status::working(format!("Generating speech...{}", suffix)));
                let audio_bytes = match pipeline::run_speech(&ctx, &completion.text).await {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        // the committed exchange stays committed; only the
                        // audio for this turn is lost
                        finish_with_error(
                            &status,
                            &transcript,
                            shown,
                            &is_processing,
                            err.to_string(),
                        );
                        return;
                    }
                };

                status.set(Status::working(format!("Speaking...{}", suffix)));
                let on_done = {
                    let status = status.clone();
                    let transcript = transcript.clone();
                    let is_processing = is_processing.clone();
                    let audio = audio.clone();
                    let suffix = suffix.clone();
                    let shown = shown.clone();
                    Callback::from(move |outcome: PlaybackResult| {
                        // release outside the audio element's event handler
                        let audio = audio.clone();
                        spawn_local(async move {
                            audio.borrow_mut().stop();
                        });
                        match outcome {
                            Ok(()) => {
                                status.set(Status::info(format!("Ready.{}", suffix)));
                                is_processing.set(false);
                            }
                            Err(reason) => finish_with_error(
                                &status,
                                &transcript,
                                shown.clone(),
                                &is_processing,
                                TurnError::Playback(reason).to_string(),
                            ),
                        }
                    })
                };

                let play_result = {
                    let mut session = audio.borrow_mut();
                    session.set_speed(speed_value);
                    session.play(&audio_bytes, on_done)
                };
                if let Err(reason) = play_result {
                    audio.borrow_mut().stop();
                    finish_with_error(
                        &status,
                        &transcript,
                        shown,
                        &is_processing,
                        TurnError::Playback(reason).to_string(),
                    );
                }
            });
        })
    };

    // -------------------------

    let on_input = {
        let input_text = input_text.clone();
        Callback::from(move |value: String| input_text.set(value))
    };

    let close_settings = {
        let show_settings = show_settings.clone();
        let credential = credential.clone();
        let catalog = catalog.clone();
        let on_load_models = on_load_models.clone();
        Callback::from(move |_| {
            show_settings.set(false);
            // closing with a key present but no catalog is the natural
            // moment to fetch
            if !credential.trim().is_empty() && !catalog.loaded() {
                on_load_models.emit(());
            }
        })
    };

    let toggle_settings = show_settings.clone();
    let toggle_sidebar = sidebar_open.clone();

    let header_title = conversations
        .active_name()
        .unwrap_or("Voice Chat")
        .to_string();

    html! {
        <>
            <style>{ GLOBAL_STYLES }</style>
            <div class="app-container">
                <Sidebar
                    open={*sidebar_open}
                    conversations={conversations.sorted()}
                    active_id={conversations.active_id().unwrap_or_default().to_string()}
                    on_select={on_select_chat}
                    on_new={on_new_chat}
                    on_delete={on_delete_chat}
                />

                <div class="main-content">
                    <div class="header">
                        <div style="display: flex; gap: 10px; align-items: center; min-width: 0;">
                            <button class="btn-icon" onclick={Callback::from(move |_| toggle_sidebar.set(!*toggle_sidebar))} title="Toggle Menu">
                                <svg width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><line x1="3" y1="12" x2="21" y2="12"></line><line x1="3" y1="6" x2="21" y2="6"></line><line x1="3" y1="18" x2="21" y2="18"></line></svg>
                            </button>
                            <h2>{ header_title }</h2>
                        </div>
                        <button class="btn-icon" onclick={Callback::from(move |_| toggle_settings.set(!*toggle_settings))} title="Settings">
                            <svg width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><circle cx="12" cy="12" r="3"></circle><path d="M19.4 15a1.65 1.65 0 0 0 .33 1.82l.06.06a2 2 0 0 1 0 2.83 2 2 0 0 1-2.83 0l-.06-.06a1.65 1.65 0 0 0-1.82-.33 1.65 1.65 0 0 0-1 1.51V21a2 2 0 0 1-2 2 2 2 0 0 1-2-2v-.09A1.65 1.65 0 0 0 9 19.4a1.65 1.65 0 0 0-1.82.33l-.06.06a2 2 0 0 1-2.83 0 2 2 0 0 1 0-2.83l.06-.06a1.65 1.65 0 0 0 .33-1.82 1.65 1.65 0 0 0-1.51-1H3a2 2 0 0 1-2-2 2 2 0 0 1 2-2h.09A1.65 1.65 0 0 0 4.6 9a1.65 1.65 0 0 0-.33-1.82l-.06-.06a2 2 0 0 1 0-2.83 2 2 0 0 1 2.83 0l.06.06a1.65 1.65 0 0 0 1.82.33H9a1.65 1.65 0 0 0 1-1.51V3a2 2 0 0 1 2-2 2 2 0 0 1 2 2v.09a1.65 1.65 0 0 0 1 1.51 1.65 1.65 0 0 0 1.82-.33l.06-.06a2 2 0 0 1 2.83 0 2 2 0 0 1 0 2.83l-.06.06a1.65 1.65 0 0 0-.33 1.82V9a1.65 1.65 0 0 0 1.51 1H21a2 2 0 0 1 2 2 2 2 0 0 1-2 2h-.09a1.65 1.65 0 0 0-1.51 1z"></path></svg>
                        </button>
                    </div>

                    if *show_settings {
                        <SettingsModal
                            credential={(*credential).clone()}
                            system_prompt={conversations.system_prompt().to_string()}
                            models={catalog.models().to_vec()}
                            models_loaded={catalog.loaded()}
                            selected_model={catalog.selected().unwrap_or_default().to_string()}
                            voice={(*voice).clone()}
                            speed={*speed}
                            params={params.get()}
                            on_credential_change={on_credential_change}
                            on_system_prompt_change={on_system_prompt_change}
                            on_load_models={on_load_models.clone()}
                            on_model_change={on_model_change}
                            on_voice_change={on_voice_change}
                            on_speed_change={on_speed_change}
                            on_param_change={on_param_change}
                            on_clear_chats={on_clear_chats}
                            on_close={close_settings}
                        />
                    }

                    <ChatArea
                        messages={(*transcript).clone()}
                        is_processing={*is_processing}
                        status={(*status).clone()}
                        input_text={(*input_text).clone()}
                        on_input={on_input}
                        on_send={run_turn}
                    />
                </div>
            </div>
        </>
    }
}
