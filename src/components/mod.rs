pub mod common;
pub mod history;
pub mod phone;
