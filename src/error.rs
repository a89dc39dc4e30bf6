//! Client-level error types shared across the store, coordinator, dispatcher, and API callers.

// self
use crate::{_prelude::*, config::ClientConfigError, store::StoreError};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Renders an error and its source chain as `outer: inner: root`, without trailing periods.
pub(crate) fn render_chain(error: &dyn StdError) -> String {
	let mut rendered = error.to_string().trim_end_matches('.').to_owned();
	let mut source = error.source();

	while let Some(cause) = source {
		rendered.push_str(": ");
		rendered.push_str(cause.to_string().trim_end_matches('.'));

		source = cause.source();
	}

	rendered
}

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The session could not be renewed; credentials were purged.
	#[error(transparent)]
	Session(#[from] SessionError),
	/// Response body did not match the expected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Service answered with a non-success status other than a recoverable 401.
	#[error("Service responded with HTTP {status}: {message}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// Message extracted from the response body, or the canonical reason.
		message: String,
	},
}
impl Error {
	/// Returns `true` when the caller should route the user back to authentication.
	pub fn is_session_expired(&self) -> bool {
		matches!(self, Self::Session(_))
	}

	/// HTTP status carried by [`Error::Api`], if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and request-building failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Client configuration failed validation.
	#[error(transparent)]
	Client(#[from] ClientConfigError),
	/// Request path cannot be resolved against the base URL.
	#[error("Request path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be encoded as JSON.
	#[error("Request body could not be encoded as JSON.")]
	EncodeBody(#[source] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded the configured timeout.
	#[error("Request to the service timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Terminal session failures.
///
/// One refresh outcome is delivered to every waiting request, so the type is `Clone` and
/// carries rendered messages instead of boxed sources.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SessionError {
	/// No refresh token is stored, so the session cannot be renewed.
	#[error("No refresh token is stored; the session cannot be renewed.")]
	MissingRefreshToken,
	/// The refresh endpoint refused the refresh token.
	#[error("Refresh endpoint rejected the refresh token with HTTP {status}.")]
	Rejected {
		/// HTTP status returned by the refresh endpoint.
		status: u16,
	},
	/// The refresh exchange failed in transport.
	#[error("Refresh exchange failed: {message}.")]
	Transport {
		/// Rendered transport failure.
		message: String,
	},
	/// The refresh endpoint answered with a body that is not a session payload.
	#[error("Refresh response could not be decoded: {message}.")]
	Decode {
		/// Rendered decoding failure.
		message: String,
	},
	/// The credential store failed while reading or rotating tokens.
	#[error("Credential store failed during refresh: {0}")]
	Storage(StoreError),
	/// The request was rejected again with the renewed access token.
	#[error("Request was rejected again after the session was renewed.")]
	Unauthorized,
	/// The refresh was abandoned before it settled.
	#[error("Token refresh was abandoned before it settled.")]
	Interrupted,
}

/// Response body decoding failure with the JSON path that failed.
#[derive(Debug, ThisError)]
#[error("Response to {request} (HTTP {status}) could not be decoded.")]
pub struct DecodeError {
	/// Request label, e.g. `GET /api/settings`.
	pub request: String,
	/// HTTP status of the decoded response.
	pub status: u16,
	/// Structured parsing failure.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
}
impl DecodeError {
	/// Dotted JSON path at which decoding failed.
	pub fn path(&self) -> String {
		self.source.path().to_string()
	}
}
