//! Dial pad
//!
//! Number entry and the call button. While a call is up the keys send DTMF
//! digits over the call instead of editing the number.

use dioxus::prelude::*;

use crate::state::{dispatch, DeviceStatus, PhoneEvent, PHONE_STATE};


/// Play DTMF tone for a digit
#[cfg(target_arch = "wasm32")]
fn play_dtmf_tone(digit: &str) {
    use web_sys::{AudioContext, OscillatorType};

    let (low_freq, high_freq) = match digit {
        "1" => (697.0, 1209.0),
        "2" => (697.0, 1336.0),
        "3" => (697.0, 1477.0),
        "4" => (770.0, 1209.0),
        "5" => (770.0, 1336.0),
        "6" => (770.0, 1477.0),
        "7" => (852.0, 1209.0),
        "8" => (852.0, 1336.0),
        "9" => (852.0, 1477.0),
        "*" => (941.0, 1209.0),
        "0" => (941.0, 1336.0),
        "#" => (941.0, 1477.0),
        _ => return,
    };

    if let Ok(ctx) = AudioContext::new() {
        let duration = 0.15;
        let current_time = ctx.current_time();

        if let Ok(gain) = ctx.create_gain() {
            gain.gain().set_value(0.1);
            let _ = gain.connect_with_audio_node(&ctx.destination());

            for freq in [low_freq, high_freq] {
                if let Ok(osc) = ctx.create_oscillator() {
                    osc.set_type(OscillatorType::Sine);
                    osc.frequency().set_value(freq as f32);
                    let _ = osc.connect_with_audio_node(&gain);
                    let _ = osc.start();
                    let _ = osc.stop_with_when(current_time + duration);
                }
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn play_dtmf_tone(_digit: &str) {}

/// Send a DTMF digit over the active call
#[cfg(target_arch = "wasm32")]
fn send_call_digits(digit: &str) {
    use super::twilio::{describe_js_error, send_digits};

    if let Err(e) = send_digits(digit) {
        tracing::warn!("Failed to send digits: {}", describe_js_error(&e));
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn send_call_digits(_digit: &str) {}

const KEYS: [(&str, &str); 12] = [
    ("1", ""),
    ("2", "ABC"),
    ("3", "DEF"),
    ("4", "GHI"),
    ("5", "JKL"),
    ("6", "MNO"),
    ("7", "PQRS"),
    ("8", "TUV"),
    ("9", "WXYZ"),
    ("*", ""),
    ("0", "+"),
    ("#", ""),
];

#[component]
pub fn DialPad() -> Element {
    let mut phone_number = use_signal(String::new);
    let phone = PHONE_STATE.read();

    let device = phone.device;
    let is_ready = phone.is_ready();
    let is_busy = !phone.call_state.is_available();
    let in_call = phone.call_state == crate::state::CallState::InCall;

    let mut press = move |digit: &'static str| {
        play_dtmf_tone(digit);

        if PHONE_STATE.read().call_state == crate::state::CallState::InCall {
            send_call_digits(digit);
            return;
        }

        phone_number.write().push_str(digit);
    };

    let clear_number = move |_| {
        phone_number.set(String::new());
    };

    let backspace = move |_| {
        phone_number.write().pop();
    };

    let make_call = move |_| {
        dispatch(PhoneEvent::Dial(phone_number()));
    };

    rsx! {
        div { class: "bg-gray-50 rounded-lg p-4 w-full",
            // Connection status
            div { class: "mb-2 text-center text-sm",
                match device {
                    DeviceStatus::Registered => rsx! {
                        span { class: "text-green-600", "Phone Ready" }
                    },
                    DeviceStatus::Initializing => rsx! {
                        span { class: "text-yellow-600 animate-pulse", "Connecting..." }
                    },
                    DeviceStatus::Unregistered => rsx! {
                        span { class: "text-red-600", "Offline" }
                        button {
                            class: "ml-2 px-3 py-1 bg-blue-600 hover:bg-blue-700 text-white rounded text-xs",
                            onclick: move |_| dispatch(PhoneEvent::Initialize),
                            "Reconnect"
                        }
                    },
                }
            }

            // Display
            div { class: "bg-white rounded-lg p-3 mb-3 text-center border",
                input {
                    class: "text-xl font-mono w-full text-center bg-transparent outline-none",
                    r#type: "tel",
                    value: "{phone_number}",
                    placeholder: "Enter number",
                    oninput: move |e| phone_number.set(e.value()),
                    onkeydown: move |e| {
                        if e.key() == Key::Enter {
                            dispatch(PhoneEvent::Dial(phone_number()));
                        }
                    },
                    disabled: is_busy,
                }
            }

            div { class: "grid grid-cols-3 gap-1 mb-3",
                for (digit, letters) in KEYS {
                    DialButton {
                        key: "{digit}",
                        digit,
                        letters,
                        disabled: is_busy && !in_call,
                        on_click: move |_| press(digit),
                    }
                }
            }

            div { class: "flex justify-center gap-2",
                button {
                    class: "bg-gray-400 hover:bg-gray-500 text-white rounded-full w-10 h-10 flex items-center justify-center transition-colors text-sm",
                    onclick: clear_number,
                    disabled: is_busy,
                    title: "Clear",
                    "C"
                }
                button {
                    class: "bg-green-500 hover:bg-green-600 text-white rounded-full w-12 h-12 flex items-center justify-center transition-colors disabled:opacity-50",
                    disabled: phone_number().is_empty() || !is_ready || is_busy,
                    onclick: make_call,
                    title: "Call",
                    span { class: "text-xl", "\u{1F4DE}" }
                }
                button {
                    class: "bg-gray-400 hover:bg-gray-500 text-white rounded-full w-10 h-10 flex items-center justify-center transition-colors text-sm",
                    onclick: backspace,
                    disabled: is_busy,
                    title: "Backspace",
                    "\u{232B}"
                }
            }
        }
    }
}

#[component]
fn DialButton(
    digit: &'static str,
    letters: &'static str,
    disabled: bool,
    on_click: EventHandler<MouseEvent>,
) -> Element {
    rsx! {
        button {
            class: "bg-white hover:bg-gray-100 border rounded-lg w-full h-12 flex flex-col items-center justify-center transition-colors disabled:opacity-50",
            disabled,
            onclick: move |e| on_click.call(e),
            span { class: "text-lg font-semibold", "{digit}" }
            if !letters.is_empty() {
                span { class: "text-xs text-gray-400 leading-none", "{letters}" }
            }
        }
    }
}
