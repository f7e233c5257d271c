use web_sys::{HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::prelude::*;

use crate::models::{voice_label, GenerationParams, ParamField, AVAILABLE_VOICES};

#[derive(Properties, PartialEq, Clone)]
pub struct SettingsProps {
    pub credential: String,
    pub system_prompt: String,
    pub models: Vec<String>,
    pub models_loaded: bool,
    pub selected_model: String,
    pub voice: String,
    pub speed: f64,
    pub params: GenerationParams,
    pub on_credential_change: Callback<String>,
    pub on_system_prompt_change: Callback<String>,
    pub on_load_models: Callback<()>,
    pub on_model_change: Callback<String>,
    pub on_voice_change: Callback<String>,
    pub on_speed_change: Callback<f64>,
    pub on_param_change: Callback<(ParamField, f64)>,
    pub on_clear_chats: Callback<()>,
    pub on_close: Callback<()>,
}

#[function_component(SettingsModal)]
pub fn settings_modal(props: &SettingsProps) -> Html {
    let on_key_input = {
        let cb = props.on_credential_change.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            cb.emit(input.value());
        })
    };

    let on_prompt_change = {
        let cb = props.on_system_prompt_change.clone();
        Callback::from(move |e: Event| {
            let input: HtmlTextAreaElement = e.target_unchecked_into();
            cb.emit(input.value());
        })
    };

    let on_model_select = {
        let cb = props.on_model_change.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            cb.emit(select.value());
        })
    };

    let on_voice_select = {
        let cb = props.on_voice_change.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            cb.emit(select.value());
        })
    };

    let on_speed_input = {
        let cb = props.on_speed_change.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            if let Ok(value) = input.value().parse::<f64>() {
                cb.emit(value);
            }
        })
    };

    let param_control = |field: ParamField| -> Html {
        let value = field.get(&props.params);
        let (min, max, step) = field.range();
        let cb = props.on_param_change.clone();
        let on_change = Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            // an unparseable number still goes through so the store can
            // coerce it to the documented fallback
            let raw = input.value().parse::<f64>().unwrap_or(f64::NAN);
            cb.emit((field, raw));
        });

        if field.is_slider() {
            html! {
                <div class="param-row">
                    <label class="form-label">
                        { field.label() }
                        <span class="param-value">{ format!("{:.*}", field.precision(), value) }</span>
                    </label>
                    <input
                        type="range"
                        min={min.to_string()}
                        max={max.to_string()}
                        step={step.to_string()}
                        value={value.to_string()}
                        oninput={on_change}
                    />
                </div>
            }
        } else {
            html! {
                <div class="param-row">
                    <label class="form-label">{ field.label() }</label>
                    <input
                        class="form-input"
                        type="number"
                        min="1"
                        value={format!("{}", value as u32)}
                        oninput={on_change}
                    />
                </div>
            }
        }
    };

    let on_clear_click = {
        let cb = props.on_clear_chats.clone();
        Callback::from(move |_| cb.emit(()))
    };

    let css = r#"
        .settings-backdrop { position: absolute; top: 0; left: 0; width: 100%; height: 100%; background: rgba(255,255,255,0.6); backdrop-filter: blur(2px); z-index: 99; cursor: pointer; }
        .settings-panel { position: absolute; top: 60px; right: 20px; width: 340px; max-height: calc(100vh - 100px); overflow-y: auto; background: white; border: 1px solid var(--border-color); border-radius: 8px; box-shadow: 0 10px 15px -3px rgba(0, 0, 0, 0.1); padding: 20px; z-index: 100; display: flex; flex-direction: column; gap: 15px; }
        .settings-header { display: flex; justify-content: space-between; align-items: center; border-bottom: 1px solid var(--border-color); padding-bottom: 10px; margin-bottom: 5px; }
        .settings-header h3 { margin: 0; font-size: 1.1rem; }
        .close-btn { background: none; border: none; font-size: 1.5rem; line-height: 1; cursor: pointer; color: var(--text-secondary); padding: 0 5px; }
        .close-btn:hover { color: var(--text-primary); }
        .form-label { display: block; font-size: 0.85rem; font-weight: 600; margin-bottom: 5px; color: var(--text-secondary); }
        .fetch-group { display: flex; gap: 8px; }
        .param-row { display: flex; flex-direction: column; }
        .param-row input[type="range"] { width: 100%; }
        .param-value { float: right; font-weight: 400; font-family: monospace; }
        .actions { margin-top: 10px; display: flex; flex-direction: column; gap: 8px; }
    "#;

    html! {
        <>
            <style>{ css }</style>
            <div class="settings-backdrop" onclick={props.on_close.reform(|_| ())}></div>

            <div class="settings-panel">
                <div class="settings-header">
                    <h3>{ "Settings" }</h3>
                    <button class="close-btn" onclick={props.on_close.reform(|_| ())} title="Close">{"×"}</button>
                </div>

                <div>
                    <label class="form-label">{ "API Key" }</label>
                    <div class="fetch-group">
                        <input
                            class="form-input"
                            type="password"
                            placeholder="gsk_..."
                            value={props.credential.clone()}
                            oninput={on_key_input}
                            style="margin-bottom:0;"
                        />
                        <button
                            class="btn"
                            onclick={props.on_load_models.reform(|_| ())}
                            disabled={props.models_loaded}
                            title="Load Models"
                        >{ "⟳" }</button>
                    </div>
                </div>

                <div>
                    <label class="form-label">{ "Model" }</label>
                    <select class="form-select" onchange={on_model_select} disabled={!props.models_loaded}>
                        {
                            if props.models.is_empty() {
                                html! { <option value="" selected=true>{ "-- Enter API Key & Load --" }</option> }
                            } else {
                                html! { for props.models.iter().map(|m| html! {
                                    <option value={m.clone()} selected={*m == props.selected_model}>{ m }</option>
                                }) }
                            }
                        }
                    </select>
                </div>

                <div>
                    <label class="form-label">{ "System Prompt" }</label>
                    <textarea
                        class="form-textarea"
                        value={props.system_prompt.clone()}
                        onchange={on_prompt_change}
                        style="height: 80px; resize: none;"
                    />
                </div>

                <div>
                    <label class="form-label">{ "Voice" }</label>
                    <select class="form-select" onchange={on_voice_select}>
                        { for AVAILABLE_VOICES.iter().map(|v| html! {
                            <option value={*v} selected={*v == props.voice}>{ voice_label(v) }</option>
                        }) }
                    </select>
                </div>

                <div class="param-row">
                    <label class="form-label">
                        { "Playback Speed" }
                        <span class="param-value">{ format!("{:.1}x", props.speed) }</span>
                    </label>
                    <input
                        type="range"
                        min="0.5"
                        max="2.0"
                        step="0.1"
                        value={props.speed.to_string()}
                        oninput={on_speed_input}
                    />
                </div>

                { for ParamField::ALL.iter().map(|f| param_control(*f)) }

                <div class="actions">
                    <hr style="width: 100%; border: 0; border-top: 1px solid var(--border-color);" />
                    <button class="btn btn-danger" onclick={on_clear_click}>{ "Delete All Chats" }</button>
                </div>
            </div>
        </>
    }
}
