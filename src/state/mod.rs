pub mod device;
pub mod history;
pub mod machine;
pub mod ui;

pub use device::*;
pub use history::*;
pub use machine::{CallState, DeviceStatus, PhoneEvent, MAX_RETRIES};
pub use ui::*;
