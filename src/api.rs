//! Typed callers for the CallShield service, one module per endpoint group.
//!
//! Every caller is a method on [`ApiClient`](crate::client::ApiClient) and goes through the
//! dispatcher, so bearer attachment and 401 recovery apply uniformly. Non-2xx responses
//! surface as [`Error::Api`]; bodies whose shape the service does not document are returned
//! as [`serde_json::Value`].

pub mod app;
pub mod auth;
pub mod blocked_calls;
pub mod number_check;
pub mod reports;
pub mod settings;
pub mod sync;

pub use app::*;
pub use auth::*;
pub use blocked_calls::*;
pub use reports::*;
pub use settings::*;
pub use sync::*;

// self
use crate::_prelude::*;

/// Acknowledgement body carrying an optional human-readable message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
	/// Message from the service, if any.
	#[serde(default)]
	pub message: Option<String>,
}
