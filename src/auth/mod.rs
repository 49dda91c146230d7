//! Authentication: sessions, credentials, and OAuth helpers.

pub mod oauth;
mod session;

pub use session::{AccessMode, Credentials, Session};
