//! Data models for the agency desk.
//!
//! Field names serialize as camelCase to match the JSON files and the web client.

mod password;
mod request;
mod stats;
mod user;

pub use password::*;
pub use request::*;
pub use stats::*;
pub use user::*;
