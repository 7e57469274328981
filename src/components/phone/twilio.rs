//! Bindings for the Twilio Voice JavaScript SDK
//!
//! The glue in `assets/twilio-bridge.js` owns the `Device` and the active
//! `Call`. SDK callbacks come back as `twilioDeviceEvent` custom events on
//! `window` with a `{ type, code, message, from }` detail.
//!
//! Every import is `catch`: a bridge that has not loaded yet surfaces as an
//! `Err` instead of a thrown exception.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;

/// Name of the custom event the bridge dispatches on `window`
pub const DEVICE_EVENT: &str = "twilioDeviceEvent";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_name = registerTwilioDevice)]
    pub async fn register_device(token: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = updateTwilioToken)]
    pub fn update_token(token: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = connectTwilioCall)]
    pub async fn connect_call(to: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = disconnectTwilioCall)]
    pub fn disconnect_call() -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = acceptTwilioCall)]
    pub fn accept_call() -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = rejectTwilioCall)]
    pub fn reject_call() -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = muteTwilioCall)]
    pub fn mute_call(muted: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = sendTwilioDigits)]
    pub fn send_digits(digits: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = showCallNotification)]
    pub fn show_call_notification(from: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = closeCallNotification)]
    pub fn close_call_notification() -> Result<(), JsValue>;
}

/// Readable form of a value thrown by the bridge
pub fn describe_js_error(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            js_sys::Reflect::get(err, &"message".into())
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| "Twilio bridge unavailable".to_string())
}
