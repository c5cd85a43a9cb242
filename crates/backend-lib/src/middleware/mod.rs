// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the Warden server.

pub mod access;
pub mod session;

pub use access::enforce;
pub use session::{
    clear_session_cookie, extract_session_token, session_cookie, session_layer, CurrentIdentity,
    SignedIn,
};
