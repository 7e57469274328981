use dioxus::prelude::*;

use crate::components::common::LoadingSpinner;
use crate::models::{format_duration, CallRecord};
use crate::state::{refresh_history, HISTORY_STATE};

/// Calls from the last 24 hours, newest first
#[component]
pub fn CallHistory() -> Element {
    use_future(|| refresh_history());

    let history = HISTORY_STATE.read();

    rsx! {
        div { class: "bg-white rounded-lg shadow-md p-4",
            div { class: "flex items-center justify-between mb-3",
                h2 { class: "text-lg font-semibold text-gray-800", "Recent Calls" }
                button {
                    class: "px-3 py-1 text-sm text-blue-600 hover:bg-blue-50 rounded disabled:opacity-50",
                    disabled: history.is_loading,
                    onclick: move |_| {
                        spawn(refresh_history());
                    },
                    "Refresh"
                }
            }

            if let Some(err) = history.error.as_ref() {
                div { class: "bg-red-100 border border-red-400 text-red-700 px-4 py-2 rounded mb-3 text-sm",
                    "{err}"
                }
            }

            if history.is_loading && history.calls.is_empty() {
                LoadingSpinner {}
            } else if history.calls.is_empty() {
                p { class: "text-gray-500 text-sm text-center py-4", "No calls in the last 24 hours" }
            } else {
                ul { class: "divide-y",
                    for call in history.calls.iter() {
                        CallRow { key: "{call.sid}", call: call.clone() }
                    }
                }
            }
        }
    }
}

#[component]
fn CallRow(call: CallRecord) -> Element {
    let status = call.status();
    let (arrow, other_party) = if call.is_outbound() {
        ("\u{2197}", call.to.clone())
    } else {
        ("\u{2199}", call.from.clone())
    };
    let started = call.start_time.with_timezone(&chrono::Local).format("%H:%M").to_string();
    let duration = format_duration(call.duration);

    rsx! {
        li { class: "py-2 flex items-center gap-3",
            span { class: "text-gray-400", "{arrow}" }
            div { class: "flex-1",
                div { class: "font-mono text-gray-800", "{other_party}" }
                div { class: "text-xs text-gray-500", "{started} \u{00B7} {duration}" }
            }
            span { class: "text-sm {status.color_class()}", "{status.display_name()}" }
        }
    }
}
