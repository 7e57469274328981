//! Phone device state
//!
//! Owns the global [`PhoneState`] signal. Events from the UI and from the
//! Twilio SDK bridge go through [`dispatch`]; the resulting effects are run
//! against the SDK in the browser.

use dioxus::prelude::*;

use super::machine::{transition, CallState, Effect, PhoneEvent, PhoneState};
use crate::models::{format_for_display, DEFAULT_COUNTRY_CODE};
use super::ui::{show_notification, NotificationType};

/// Global phone state
pub static PHONE_STATE: GlobalSignal<PhoneState> = Signal::global(PhoneState::default);

/// Feed an event through the state machine and carry out its effects
pub fn dispatch(event: PhoneEvent) {
    let notifications_denied = event == PhoneEvent::NotificationPermission(false);
    let current = PHONE_STATE.read().clone();
    let (next, effects) = transition(&current, event);

    let toast = status_toast(&current, &next);
    *PHONE_STATE.write() = next;

    if let Some((message, kind)) = toast {
        show_notification(&message, kind);
    } else if notifications_denied {
        show_notification("Browser notifications are off; keep this tab visible for incoming calls", NotificationType::Warning);
    }

    for effect in effects {
        run_effect(effect);
    }
}

/// Toast for a visible change between two states; errors take precedence.
fn status_toast(current: &PhoneState, next: &PhoneState) -> Option<(String, NotificationType)> {
    if let Some(err) = &next.error {
        if current.error.as_ref() != Some(err) {
            return Some((err.clone(), NotificationType::Error));
        }
    }
    if next.is_ready() && !current.is_ready() {
        return Some(("Phone ready".to_string(), NotificationType::Success));
    }
    if next.call_state == CallState::Incoming && current.call_state != CallState::Incoming {
        let from = next.remote.as_deref().unwrap_or("Unknown");
        return Some((
            format!("Incoming call from {}", format_for_display(from, DEFAULT_COUNTRY_CODE)),
            NotificationType::Info,
        ));
    }
    None
}

/// Map an event reported by the SDK bridge onto a [`PhoneEvent`].
///
/// Unknown event kinds yield `None`.
pub fn parse_sdk_event(
    kind: &str,
    code: Option<u32>,
    message: Option<String>,
    from: Option<String>,
) -> Option<PhoneEvent> {
    let message = message.unwrap_or_else(|| "Unknown error".to_string());
    let event = match kind {
        "registered" => PhoneEvent::Registered,
        "tokenWillExpire" => PhoneEvent::TokenWillExpire,
        "deviceError" => PhoneEvent::DeviceError {
            code: code.unwrap_or(0),
            message,
        },
        "incoming" => PhoneEvent::Incoming {
            from: from.unwrap_or_else(|| "Unknown".to_string()),
        },
        "ringing" => PhoneEvent::Ringing,
        "accept" => PhoneEvent::Accepted,
        "disconnect" => PhoneEvent::Disconnected,
        "reject" => PhoneEvent::Rejected,
        "cancel" => PhoneEvent::Cancelled,
        "callError" => PhoneEvent::CallError {
            code: code.unwrap_or(0),
            message,
        },
        "notificationPermission" => PhoneEvent::NotificationPermission(message == "granted"),
        // Clicking the incoming-call notification answers the call
        "notificationClick" => PhoneEvent::AcceptIncoming,
        _ => return None,
    };
    Some(event)
}

#[cfg(target_arch = "wasm32")]
fn run_effect(effect: Effect) {
    use crate::components::phone::twilio::{self, describe_js_error};
    use wasm_bindgen_futures::spawn_local;

    tracing::debug!("Running phone effect: {:?}", effect);

    let result = match effect {
        Effect::FetchToken => {
            spawn_local(async {
                match crate::api::token::fetch_token().await {
                    Ok(response) => dispatch(PhoneEvent::TokenFetched {
                        token: response.token,
                        caller_number: response.caller_number,
                    }),
                    Err(e) => dispatch(PhoneEvent::TokenFailed(format!("Failed to get access token: {}", e))),
                }
            });
            Ok(())
        }
        Effect::RegisterDevice(token) => {
            spawn_local(async move {
                // Success arrives as a "registered" event from the bridge
                let message = match twilio::register_device(&token).await {
                    Ok(registered) if registered.is_truthy() => return,
                    Ok(_) => "Failed to register device".to_string(),
                    Err(e) => format!("Failed to register device: {}", describe_js_error(&e)),
                };
                dispatch(PhoneEvent::DeviceError { code: 0, message });
            });
            Ok(())
        }
        Effect::UpdateToken(token) => twilio::update_token(&token),
        Effect::Connect { to } => {
            spawn_local(async move {
                let message = match twilio::connect_call(&to).await {
                    Ok(connected) if connected.is_truthy() => return,
                    Ok(_) => "Failed to make call".to_string(),
                    Err(e) => format!("Failed to make call: {}", describe_js_error(&e)),
                };
                dispatch(PhoneEvent::CallError { code: 0, message });
            });
            Ok(())
        }
        Effect::Disconnect => twilio::disconnect_call(),
        Effect::Accept => twilio::accept_call(),
        Effect::Reject => twilio::reject_call(),
        Effect::Mute(muted) => twilio::mute_call(muted),
        Effect::Notify { from } => {
            twilio::show_call_notification(&format_for_display(&from, DEFAULT_COUNTRY_CODE))
        }
        Effect::CloseNotification => twilio::close_call_notification(),
        Effect::RefreshHistory { delay_ms } => {
            spawn_local(async move {
                crate::components::common::sleep_ms(delay_ms).await;
                super::history::refresh_history().await;
            });
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::warn!("Twilio bridge call failed: {}", describe_js_error(&e));
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run_effect(effect: Effect) {
    tracing::debug!("No SDK outside the browser, skipping effect: {:?}", effect);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call_callbacks() {
        assert_eq!(parse_sdk_event("accept", None, None, None), Some(PhoneEvent::Accepted));
        assert_eq!(parse_sdk_event("cancel", None, None, None), Some(PhoneEvent::Cancelled));
        assert_eq!(
            parse_sdk_event("incoming", None, None, Some("+81312345678".into())),
            Some(PhoneEvent::Incoming { from: "+81312345678".into() })
        );
    }

    #[test]
    fn test_parse_errors_keep_code() {
        assert_eq!(
            parse_sdk_event("callError", Some(31005), Some("hangup".into()), None),
            Some(PhoneEvent::CallError { code: 31005, message: "hangup".into() })
        );
        assert_eq!(
            parse_sdk_event("deviceError", None, None, None),
            Some(PhoneEvent::DeviceError { code: 0, message: "Unknown error".into() })
        );
    }

    #[test]
    fn test_parse_notification_permission() {
        assert_eq!(
            parse_sdk_event("notificationPermission", None, Some("granted".into()), None),
            Some(PhoneEvent::NotificationPermission(true))
        );
        assert_eq!(
            parse_sdk_event("notificationPermission", None, Some("denied".into()), None),
            Some(PhoneEvent::NotificationPermission(false))
        );
    }

    #[test]
    fn test_notification_click_accepts() {
        assert_eq!(
            parse_sdk_event("notificationClick", None, None, None),
            Some(PhoneEvent::AcceptIncoming)
        );
    }

    #[test]
    fn test_status_toasts() {
        let idle = PhoneState::default();
        let ready = PhoneState {
            device: crate::state::machine::DeviceStatus::Registered,
            ..Default::default()
        };
        assert_eq!(status_toast(&idle, &ready).map(|t| t.1), Some(NotificationType::Success));

        let ringing_in = PhoneState {
            call_state: CallState::Incoming,
            remote: Some("+819012345678".into()),
            ..ready.clone()
        };
        assert_eq!(
            status_toast(&ready, &ringing_in).map(|t| t.0),
            Some("Incoming call from 09012345678".to_string())
        );

        let failed = PhoneState {
            error: Some("Call failed".into()),
            ..ready.clone()
        };
        assert_eq!(status_toast(&ready, &failed).map(|t| t.1), Some(NotificationType::Error));
        assert_eq!(status_toast(&failed, &failed), None);
    }

    #[test]
    fn test_parse_unknown_kind() {
        assert_eq!(parse_sdk_event("volume", None, None, None), None);
    }
}
