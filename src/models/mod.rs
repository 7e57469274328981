pub mod auth;
pub mod call;
pub mod phone;

pub use auth::*;
pub use call::*;
pub use phone::*;
