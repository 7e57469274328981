mod call_status;
mod device_events;
mod dial_pad;
#[cfg(target_arch = "wasm32")]
pub mod twilio;

pub use call_status::*;
pub use device_events::*;
pub use dial_pad::*;
