//! Softphone - Browser calling with Dioxus and Twilio Voice
//!
//! The same crate builds the web front end (wasm32) and the Axum server that
//! issues access tokens, answers the voice webhook and serves call history.

mod components;
mod models;
mod state;
mod api;

#[cfg(not(target_arch = "wasm32"))]
mod server;

use dioxus::prelude::*;
use components::{
    common::Notification,
    history::CallHistory,
    phone::{CallStatusPanel, DialPad, PhoneDevice},
};
use models::{format_for_display, DEFAULT_COUNTRY_CODE};
use state::PHONE_STATE;

fn main() {
    // On wasm, just run the app
    #[cfg(target_arch = "wasm32")]
    {
        run_app();
    }

    // On native, handle server vs app mode
    #[cfg(not(target_arch = "wasm32"))]
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("softphone=info,tower_http=info")),
            )
            .init();

        // Load environment variables
        dotenvy::dotenv().ok();

        let config = match server::config::AppConfig::from_env() {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Invalid configuration: {}", e);
                std::process::exit(1);
            }
        };

        let args: Vec<String> = std::env::args().collect();

        if args.contains(&"--server".to_string()) {
            // Run server only
            if let Err(e) = run_server(config) {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        } else {
            // Run frontend (desktop mode) with embedded server
            let port = config.port;

            std::thread::spawn(move || {
                tracing::info!("Starting embedded server on port {}", port);
                if let Err(e) = run_server(config) {
                    tracing::error!("Embedded server error: {}", e);
                }
            });

            // Give server time to start
            std::thread::sleep(std::time::Duration::from_millis(500));

            api::init_api_client(&format!("http://localhost:{}", port));
            run_app();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run_server(config: server::config::AppConfig) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(server::run_server(config))
}

fn run_app() {
    // On web, use the same origin as the page (for same-origin API requests)
    #[cfg(target_arch = "wasm32")]
    {
        let api_url = web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_else(|| "http://localhost:3000".to_string());
        api::init_api_client(&api_url);
    }

    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        // Global styles
        style { {include_str!("../assets/styles.css")} }

        // Twilio Voice SDK and the bridge the wasm bindings call into
        document::Script { src: "https://cdn.jsdelivr.net/npm/@twilio/voice-sdk@2.12.3/dist/twilio.min.js" }
        document::Script { {include_str!("../assets/twilio-bridge.js")} }

        // Notification toast
        Notification {}

        PhoneDevice {}
        Home {}
    }
}

#[component]
fn Home() -> Element {
    let caller_number = PHONE_STATE
        .read()
        .caller_number
        .as_deref()
        .map(|n| format_for_display(n, DEFAULT_COUNTRY_CODE));

    rsx! {
        div { class: "min-h-screen bg-gray-100",
            header { class: "bg-white border-b px-6 py-3 flex items-center gap-3",
                span { class: "text-2xl", "\u{1F4DE}" }
                h1 { class: "text-xl font-bold text-gray-800", "Softphone" }
                if let Some(number) = caller_number {
                    span { class: "ml-auto text-sm text-gray-600",
                        "Caller ID: "
                        span { class: "font-mono text-gray-800", "{number}" }
                    }
                }
            }

            main { class: "max-w-4xl mx-auto p-6 grid gap-6 md:grid-cols-2",
                div { class: "flex flex-col gap-6",
                    CallStatusPanel {}
                    DialPad {}
                }
                CallHistory {}
            }
        }
    }
}
