//! Starts the Twilio device and forwards SDK callbacks into the state machine

use dioxus::prelude::*;

use crate::state::{dispatch, PhoneEvent};

/// Mount once at the top of the app; renders nothing.
#[component]
pub fn PhoneDevice() -> Element {
    #[cfg(target_arch = "wasm32")]
    use_hook(|| {
        use js_sys::Reflect;
        use wasm_bindgen::closure::Closure;
        use wasm_bindgen::{JsCast, JsValue};

        use super::twilio::DEVICE_EVENT;
        use crate::state::parse_sdk_event;

        let field = |detail: &JsValue, name: &str| Reflect::get(detail, &name.into()).ok();

        let callback = Closure::wrap(Box::new(move |event: web_sys::CustomEvent| {
            let detail = event.detail();
            if !detail.is_object() {
                return;
            }

            let Some(kind) = field(&detail, "type").and_then(|v| v.as_string()) else {
                return;
            };
            let code = field(&detail, "code").and_then(|v| v.as_f64()).map(|c| c as u32);
            let message = field(&detail, "message").and_then(|v| v.as_string());
            let from = field(&detail, "from").and_then(|v| v.as_string());

            tracing::debug!("Twilio device event: {}", kind);
            match parse_sdk_event(&kind, code, message, from) {
                Some(event) => dispatch(event),
                None => tracing::debug!("Ignoring device event {}", kind),
            }
        }) as Box<dyn FnMut(_)>);

        if let Some(win) = web_sys::window() {
            let _ = win.add_event_listener_with_callback(DEVICE_EVENT, callback.as_ref().unchecked_ref());
        }

        // Listener lives for the whole page
        callback.forget();
    });

    // Not during render
    use_hook(|| spawn(async { dispatch(PhoneEvent::Initialize) }));

    rsx! {}
}
