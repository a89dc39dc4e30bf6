//! Credential models: redacted token secrets and the session payload issued by the service.

pub mod secret;
pub mod session;

pub use secret::*;
pub use session::*;
