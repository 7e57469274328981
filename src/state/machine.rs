//! Softphone call-state machine
//!
//! SDK callbacks and user actions are turned into [`PhoneEvent`]s and fed
//! through [`transition`], which returns the next [`PhoneState`] together
//! with the [`Effect`]s the device driver has to carry out. Nothing in here
//! touches the SDK or the DOM.

use serde::{Deserialize, Serialize};

use crate::models::{format_e164, DEFAULT_COUNTRY_CODE};

/// Manual retries allowed after a call ends
pub const MAX_RETRIES: u32 = 3;

/// SDK error raised when the gateway tears the connection down during hangup
pub const BENIGN_HANGUP_ERROR: u32 = 31005;

/// The provider needs a moment before a finished call shows up in its log
pub const HISTORY_REFRESH_DELAY_MS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallState {
    #[default]
    Idle,
    Dialing,
    Ringing,
    Incoming,
    InCall,
    Ended,
}

impl CallState {
    pub fn display_name(&self) -> &str {
        match self {
            CallState::Idle => "Ready",
            CallState::Dialing => "Dialing...",
            CallState::Ringing => "Ringing...",
            CallState::Incoming => "Incoming call",
            CallState::InCall => "Connected",
            CallState::Ended => "Call ended",
        }
    }

    /// An outbound or answered call leg exists
    pub fn is_active(&self) -> bool {
        matches!(self, CallState::Dialing | CallState::Ringing | CallState::InCall)
    }

    /// A new call may be placed or received
    pub fn is_available(&self) -> bool {
        matches!(self, CallState::Idle | CallState::Ended)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceStatus {
    #[default]
    Unregistered,
    Initializing,
    Registered,
}

/// Everything the UI knows about the phone
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhoneState {
    pub call_state: CallState,
    pub device: DeviceStatus,
    pub muted: bool,
    pub retry_count: u32,
    /// E.164 number of the last outbound call, used by retry
    pub last_number: Option<String>,
    /// Party on the other end of the current or pending call
    pub remote: Option<String>,
    pub notifications_granted: bool,
    /// This line's own number, as handed out with the access token
    pub caller_number: Option<String>,
    pub error: Option<String>,
}

impl PhoneState {
    pub fn is_ready(&self) -> bool {
        self.device == DeviceStatus::Registered
    }

    pub fn can_retry(&self) -> bool {
        self.call_state == CallState::Ended
            && self.last_number.is_some()
            && self.retry_count < MAX_RETRIES
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PhoneEvent {
    // Device lifecycle
    Initialize,
    TokenFetched { token: String, caller_number: Option<String> },
    TokenFailed(String),
    Registered,
    DeviceError { code: u32, message: String },
    TokenWillExpire,
    NotificationPermission(bool),

    // User actions
    Dial(String),
    HangUp,
    SetMuted(bool),
    AcceptIncoming,
    RejectIncoming,
    Retry,
    DismissError,

    // Call callbacks
    Ringing,
    Accepted,
    Disconnected,
    Rejected,
    Cancelled,
    CallError { code: u32, message: String },
    Incoming { from: String },
}

/// Work the driver performs after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchToken,
    RegisterDevice(String),
    UpdateToken(String),
    Connect { to: String },
    Disconnect,
    Accept,
    Reject,
    Mute(bool),
    Notify { from: String },
    CloseNotification,
    RefreshHistory { delay_ms: u32 },
}

/// Compute the next state and the effects of `event`.
pub fn transition(state: &PhoneState, event: PhoneEvent) -> (PhoneState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match event {
        PhoneEvent::Initialize => {
            if state.device == DeviceStatus::Unregistered {
                next.device = DeviceStatus::Initializing;
                effects.push(Effect::FetchToken);
            }
        }
        PhoneEvent::TokenFetched { token, caller_number } => {
            if caller_number.is_some() {
                next.caller_number = caller_number;
            }
            match state.device {
                DeviceStatus::Initializing => effects.push(Effect::RegisterDevice(token)),
                DeviceStatus::Registered => effects.push(Effect::UpdateToken(token)),
                DeviceStatus::Unregistered => {}
            }
        }
        PhoneEvent::TokenFailed(message) => {
            if state.device == DeviceStatus::Initializing {
                next.device = DeviceStatus::Unregistered;
            }
            next.error = Some(message);
        }
        PhoneEvent::Registered => {
            next.device = DeviceStatus::Registered;
            next.error = None;
            if next.call_state == CallState::Ended {
                next.call_state = CallState::Idle;
            }
        }
        PhoneEvent::DeviceError { code, message } => {
            end_call(state, &mut next, &mut effects);
            if code != BENIGN_HANGUP_ERROR {
                // The device is unusable until it is initialized again
                next.device = DeviceStatus::Unregistered;
                next.call_state = CallState::Ended;
                next.muted = false;
                next.error = Some(message);
            } else if state.device == DeviceStatus::Initializing {
                next.device = DeviceStatus::Unregistered;
            }
        }
        PhoneEvent::TokenWillExpire => {
            if state.device == DeviceStatus::Registered {
                effects.push(Effect::FetchToken);
            }
        }
        PhoneEvent::NotificationPermission(granted) => {
            next.notifications_granted = granted;
        }

        PhoneEvent::Dial(number) => {
            let to = format_e164(&number, DEFAULT_COUNTRY_CODE);
            if !to.chars().any(|c| c.is_ascii_digit()) {
                next.error = Some("Phone number is empty".to_string());
            } else if !state.is_ready() {
                next.error = Some("Device not ready".to_string());
            } else if !state.call_state.is_available() {
                next.error = Some("A call is already in progress".to_string());
            } else {
                next.retry_count = 0;
                start_call(&mut next, to, &mut effects);
            }
        }
        PhoneEvent::HangUp => match state.call_state {
            CallState::Dialing | CallState::Ringing | CallState::InCall => {
                effects.push(Effect::Disconnect);
            }
            CallState::Incoming => reject_incoming(&mut next, &mut effects),
            CallState::Idle | CallState::Ended => {}
        },
        PhoneEvent::SetMuted(muted) => {
            if state.call_state.is_active() {
                next.muted = muted;
                effects.push(Effect::Mute(muted));
            }
        }
        PhoneEvent::AcceptIncoming => {
            if state.call_state == CallState::Incoming {
                next.call_state = CallState::InCall;
                next.error = None;
                effects.push(Effect::CloseNotification);
                effects.push(Effect::Accept);
            }
        }
        PhoneEvent::RejectIncoming => {
            if state.call_state == CallState::Incoming {
                reject_incoming(&mut next, &mut effects);
            }
        }
        PhoneEvent::Retry => {
            if state.call_state == CallState::Ended {
                match state.last_number.clone() {
                    Some(number) if state.retry_count < MAX_RETRIES && state.is_ready() => {
                        next.call_state = CallState::Idle;
                        next.retry_count += 1;
                        start_call(&mut next, number, &mut effects);
                    }
                    Some(_) if state.retry_count < MAX_RETRIES => {
                        next.error = Some("Device not ready".to_string());
                    }
                    _ => {
                        next.error = Some("Maximum retry attempts reached".to_string());
                    }
                }
            }
        }
        PhoneEvent::DismissError => {
            next.error = None;
        }

        PhoneEvent::Ringing => {
            if state.call_state == CallState::Dialing {
                next.call_state = CallState::Ringing;
            }
        }
        PhoneEvent::Accepted => {
            if matches!(state.call_state, CallState::Dialing | CallState::Ringing) {
                next.call_state = CallState::InCall;
                next.error = None;
            }
        }
        PhoneEvent::Disconnected | PhoneEvent::Rejected | PhoneEvent::Cancelled => {
            end_call(state, &mut next, &mut effects);
        }
        PhoneEvent::CallError { code, message } => {
            if code != BENIGN_HANGUP_ERROR {
                next.error = Some(message);
            }
            end_call(state, &mut next, &mut effects);
        }
        PhoneEvent::Incoming { from } => {
            // The SDK rejects calls that arrive while busy; anything that
            // still gets through is ignored.
            if state.call_state.is_available() {
                next.call_state = CallState::Incoming;
                next.remote = Some(from.clone());
                next.error = None;
                next.muted = false;
                if state.notifications_granted {
                    effects.push(Effect::Notify { from });
                }
            }
        }
    }

    (next, effects)
}

fn start_call(next: &mut PhoneState, to: String, effects: &mut Vec<Effect>) {
    next.call_state = CallState::Dialing;
    next.last_number = Some(to.clone());
    next.remote = Some(to.clone());
    next.muted = false;
    next.error = None;
    effects.push(Effect::Connect { to });
}

fn reject_incoming(next: &mut PhoneState, effects: &mut Vec<Effect>) {
    next.call_state = CallState::Idle;
    next.remote = None;
    effects.push(Effect::CloseNotification);
    effects.push(Effect::Reject);
}

/// Terminate whatever call is in flight.
fn end_call(state: &PhoneState, next: &mut PhoneState, effects: &mut Vec<Effect>) {
    match state.call_state {
        CallState::Dialing | CallState::Ringing | CallState::InCall => {
            next.call_state = CallState::Ended;
            next.muted = false;
            effects.push(Effect::RefreshHistory {
                delay_ms: HISTORY_REFRESH_DELAY_MS,
            });
        }
        CallState::Incoming => {
            next.call_state = CallState::Idle;
            next.remote = None;
            effects.push(Effect::CloseNotification);
        }
        CallState::Idle | CallState::Ended => {}
    }
}
