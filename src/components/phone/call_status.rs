use dioxus::prelude::*;

use crate::components::common::sleep_ms;
use crate::models::{format_for_display, DEFAULT_COUNTRY_CODE};
use crate::state::{dispatch, CallState, PhoneEvent, MAX_RETRIES, PHONE_STATE};

#[component]
pub fn CallStatusPanel() -> Element {
    let phone = PHONE_STATE.read();
    let mut duration = use_signal(|| 0u32);

    // Call timer, reset whenever a call connects
    use_future(move || async move {
        let mut was_in_call = false;
        loop {
            sleep_ms(1000).await;
            let in_call = PHONE_STATE.peek().call_state == CallState::InCall;
            if in_call && !was_in_call {
                duration.set(0);
            }
            if in_call {
                *duration.write() += 1;
            }
            was_in_call = in_call;
        }
    });

    let call_state = phone.call_state;
    let muted = phone.muted;
    let remote = phone
        .remote
        .as_deref()
        .map(|r| format_for_display(r, DEFAULT_COUNTRY_CODE))
        .unwrap_or_default();
    let has_last_number = phone.last_number.is_some();
    let retries_left = phone.can_retry();
    let retry_count = phone.retry_count;

    let secs = duration();
    let duration_text = format!("{:02}:{:02}", secs / 60, secs % 60);

    let indicator = match call_state {
        CallState::Idle => "bg-gray-400",
        CallState::Dialing | CallState::Ringing => "bg-yellow-500 animate-pulse",
        CallState::Incoming => "bg-blue-500 animate-pulse",
        CallState::InCall => "bg-green-500",
        CallState::Ended => "bg-red-500",
    };

    rsx! {
        div { class: "bg-white rounded-lg shadow-md p-4",
            div { class: "flex items-center gap-3 mb-3",
                div { class: "w-3 h-3 rounded-full {indicator}" }
                span { class: "font-semibold text-gray-800", "{call_state.display_name()}" }
                if call_state == CallState::InCall {
                    span { class: "ml-auto font-mono text-gray-600", "{duration_text}" }
                }
            }

            if !remote.is_empty() && call_state != CallState::Idle {
                div { class: "text-lg font-mono text-gray-700 mb-3", "{remote}" }
            }

            div { class: "flex items-center gap-2",
                match call_state {
                    CallState::Incoming => rsx! {
                        button {
                            class: "px-4 py-2 bg-green-600 hover:bg-green-700 text-white rounded-lg",
                            onclick: move |_| dispatch(PhoneEvent::AcceptIncoming),
                            "Accept"
                        }
                        button {
                            class: "px-4 py-2 bg-red-600 hover:bg-red-700 text-white rounded-lg",
                            onclick: move |_| dispatch(PhoneEvent::RejectIncoming),
                            "Reject"
                        }
                    },
                    CallState::Dialing | CallState::Ringing | CallState::InCall => rsx! {
                        button {
                            class: if muted { "p-2 rounded-full bg-red-500 text-white" } else { "p-2 rounded-full bg-gray-200 hover:bg-gray-300" },
                            onclick: move |_| dispatch(PhoneEvent::SetMuted(!muted)),
                            title: if muted { "Unmute" } else { "Mute" },
                            if muted { "\u{1F507}" } else { "\u{1F50A}" }
                        }
                        button {
                            class: "p-2 bg-red-500 hover:bg-red-600 text-white rounded-full transition-colors",
                            onclick: move |_| dispatch(PhoneEvent::HangUp),
                            title: "End Call",
                            "\u{260E}"
                        }
                    },
                    CallState::Ended if has_last_number => rsx! {
                        button {
                            class: if retries_left { "px-4 py-2 bg-blue-600 hover:bg-blue-700 text-white rounded-lg" } else { "px-4 py-2 bg-gray-400 text-white rounded-lg" },
                            onclick: move |_| dispatch(PhoneEvent::Retry),
                            "Retry ({retry_count}/{MAX_RETRIES})"
                        }
                    },
                    _ => rsx! {},
                }
            }
        }
    }
}
