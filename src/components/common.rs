use dioxus::prelude::*;
use crate::state::{UI_STATE, NotificationType};

/// Timer that works in the browser and on native
pub async fn sleep_ms(ms: u32) {
    #[cfg(target_arch = "wasm32")]
    {
        gloo_timers::future::TimeoutFuture::new(ms).await;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::time::sleep(std::time::Duration::from_millis(u64::from(ms))).await;
    }
}

#[component]
pub fn LoadingSpinner() -> Element {
    rsx! {
        div { class: "flex items-center justify-center p-4",
            div { class: "animate-spin rounded-full h-8 w-8 border-b-2 border-blue-600" }
        }
    }
}

/// Toast for the latest notification; errors stay up until dismissed.
#[component]
pub fn Notification() -> Element {
    let notification = UI_STATE.read().notification.clone();

    // Auto-dismiss everything but errors after 4 seconds
    {
        let auto_dismiss = notification
            .as_ref()
            .map(|n| n.notification_type != NotificationType::Error)
            .unwrap_or(false);
        use_effect(use_reactive!(|auto_dismiss| {
            if auto_dismiss {
                spawn(async move {
                    sleep_ms(4000).await;
                    crate::state::clear_notification();
                });
            }
        }));
    }

    if let Some(notif) = notification {
        let color_class = notif.notification_type.color_class();
        let icon = match notif.notification_type {
            NotificationType::Success => "\u{2705}",
            NotificationType::Error => "\u{274C}",
            NotificationType::Warning => "\u{26A0}",
            NotificationType::Info => "\u{2139}",
        };
        rsx! {
            div {
                class: "fixed top-4 right-4 z-50 {color_class} text-white px-6 py-4 rounded-lg shadow-xl max-w-sm animate-slide-in",
                role: "alert",
                div { class: "flex items-start gap-3",
                    span { class: "text-xl flex-shrink-0", "{icon}" }
                    div { class: "flex-1",
                        p { class: "font-medium", "{notif.message}" }
                    }
                    button {
                        class: "ml-2 text-white hover:text-gray-200 flex-shrink-0",
                        onclick: move |_| {
                            crate::state::clear_notification();
                            crate::state::dispatch(crate::state::PhoneEvent::DismissError);
                        },
                        "\u{2715}"
                    }
                }
            }
        }
    } else {
        rsx! {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_sleep_ms_waits() {
        let started = Instant::now();
        sleep_ms(20).await;
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
