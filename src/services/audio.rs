use std::cell::Cell;
use std::rc::Rc;

use js_sys::{Array, Uint8Array};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAudioElement, Url};
use yew::Callback;

/// Delivered once per playback: `Ok` on natural end, `Err` with a reason on
/// a player error or a rejected play() call.
pub type PlaybackResult = Result<(), String>;

/// Owns at most one playable audio resource at a time.
///
/// `ended` and `error` can both fire for the same playback, and a rejected
/// play() promise is a third terminal path; a shared `settled` flag makes
/// sure exactly one of them reports back, and `stop` settles the flag so a
/// replaced resource never reports at all.
pub struct AudioSession {
    element: Option<HtmlAudioElement>,
    object_url: Option<String>,
    speed: f64,
    settled: Rc<Cell<bool>>,
    ended_cb: Option<Closure<dyn FnMut()>>,
    error_cb: Option<Closure<dyn FnMut()>>,
    play_failed_cb: Option<Closure<dyn FnMut(JsValue)>>,
}

impl AudioSession {
    pub fn new() -> Self {
        Self {
            element: None,
            object_url: None,
            speed: 1.0,
            settled: Rc::new(Cell::new(true)),
            ended_cb: None,
            error_cb: None,
            play_failed_cb: None,
        }
    }

    /// Replaces whatever is loaded and starts playback of the wav payload at
    /// the stored speed. `on_done` fires at most once, for whichever
    /// terminal event arrives first; an explicit `stop` silences it instead.
    pub fn play(&mut self, bytes: &[u8], on_done: Callback<PlaybackResult>) -> Result<(), String> {
        self.stop();
        // the previous playback's promise has long settled by now
        self.play_failed_cb = None;

        if self.element.is_none() {
            self.element = Some(HtmlAudioElement::new().map_err(js_reason)?);
        }
        let element = match &self.element {
            Some(el) => el.clone(),
            None => return Err("audio element unavailable".to_string()),
        };

        let parts = Array::new();
        parts.push(&Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type("audio/wav");
        let blob =
            Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(js_reason)?;
        let url = Url::create_object_url_with_blob(&blob).map_err(js_reason)?;
        element.set_src(&url);
        self.object_url = Some(url);
        element.set_playback_rate(self.speed);

        let settled = Rc::new(Cell::new(false));
        self.settled = settled.clone();

        let ended = {
            let settled = settled.clone();
            let on_done = on_done.clone();
            Closure::<dyn FnMut()>::new(move || {
                if !settled.replace(true) {
                    on_done.emit(Ok(()));
                }
            })
        };
        element
            .add_event_listener_with_callback("ended", ended.as_ref().unchecked_ref())
            .map_err(js_reason)?;

        let error = {
            let settled = settled.clone();
            let on_done = on_done.clone();
            let element = element.clone();
            Closure::<dyn FnMut()>::new(move || {
                if !settled.replace(true) {
                    let reason = element
                        .error()
                        .map(|e| e.message())
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "unknown media error".to_string());
                    on_done.emit(Err(reason));
                }
            })
        };
        element
            .add_event_listener_with_callback("error", error.as_ref().unchecked_ref())
            .map_err(js_reason)?;

        // autoplay policy rejections surface through the play() promise
        let play_failed = {
            let settled = settled.clone();
            Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
                if !settled.replace(true) {
                    on_done.emit(Err(js_reason(value)));
                }
            })
        };

        match element.play() {
            Ok(promise) => {
                let _ = promise.catch(&play_failed);
            }
            Err(e) => {
                settled.set(true);
                self.ended_cb = Some(ended);
                self.error_cb = Some(error);
                self.stop();
                return Err(js_reason(e));
            }
        }

        self.ended_cb = Some(ended);
        self.error_cb = Some(error);
        self.play_failed_cb = Some(play_failed);
        Ok(())
    }

    /// Applies to the loaded resource when one is ready; always recorded for
    /// the next playback.
    pub fn set_speed(&mut self, multiplier: f64) {
        self.speed = multiplier;
        if let Some(element) = &self.element {
            if element.ready_state() >= 1 {
                element.set_playback_rate(multiplier);
            }
        }
    }

    /// Idempotent teardown: settles any pending playback (its callbacks go
    /// quiet), pauses the element and releases the blob URL.
    pub fn stop(&mut self) {
        self.settled.set(true);
        if let Some(element) = &self.element {
            let _ = element.pause();
            if let Some(cb) = self.ended_cb.take() {
                let _ = element
                    .remove_event_listener_with_callback("ended", cb.as_ref().unchecked_ref());
            }
            if let Some(cb) = self.error_cb.take() {
                let _ = element
                    .remove_event_listener_with_callback("error", cb.as_ref().unchecked_ref());
            }
            let _ = element.remove_attribute("src");
            element.load();
        }
        if let Some(url) = self.object_url.take() {
            let _ = Url::revoke_object_url(&url);
        }
    }
}

impl Default for AudioSession {
    fn default() -> Self {
        Self::new()
    }
}

fn js_reason(value: JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}
