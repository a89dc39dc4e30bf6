//! Client configuration with a validating builder.

// std
use std::time::Duration as StdDuration;
// self
use crate::_prelude::*;

/// Errors raised while constructing or validating a [`ClientConfig`].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ClientConfigError {
	/// The base URL must use HTTPS unless insecure HTTP is explicitly allowed.
	#[error("The base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// Base URL that failed validation.
		url: String,
	},
	/// The base URL cannot have paths joined onto it.
	#[error("The base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Requests need a positive timeout so a hung refresh can never wedge the client.
	#[error("The request timeout must be positive.")]
	ZeroTimeout,
	/// The user agent must not be blank.
	#[error("The user agent must not be blank.")]
	BlankUserAgent,
}

/// Connection settings shared by every request, including the refresh exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Service root, e.g. `https://api.callshield.app/`. Always ends with `/`.
	pub base_url: Url,
	/// Per-request timeout in seconds.
	#[serde(default = "ClientConfig::default_timeout_secs")]
	pub request_timeout_secs: u64,
	/// `User-Agent` header sent with every request.
	#[serde(default = "ClientConfig::default_user_agent")]
	pub user_agent: String,
	/// Permits `http://` base URLs (local development and tests).
	#[serde(default)]
	pub allow_insecure_http: bool,
}
impl ClientConfig {
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

	/// Creates a new builder for the provided service root.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Parses a JSON document and validates it.
	pub fn from_json(raw: &str) -> Result<Self, ConfigLoadError> {
		let config: Self = serde_json::from_str(raw).map_err(ConfigLoadError::Parse)?;

		Ok(config.validated()?)
	}

	/// Normalizes the base URL and checks invariants; deserialized configs should pass
	/// through here before use.
	pub fn validated(mut self) -> Result<Self, ClientConfigError> {
		if self.base_url.cannot_be_a_base() {
			return Err(ClientConfigError::CannotBeABase { url: self.base_url.to_string() });
		}
		if self.base_url.scheme() != "https" && !self.allow_insecure_http {
			return Err(ClientConfigError::InsecureBaseUrl { url: self.base_url.to_string() });
		}
		if self.request_timeout_secs == 0 {
			return Err(ClientConfigError::ZeroTimeout);
		}
		if self.user_agent.trim().is_empty() {
			return Err(ClientConfigError::BlankUserAgent);
		}
		if !self.base_url.path().ends_with('/') {
			let path = format!("{}/", self.base_url.path());

			self.base_url.set_path(&path);
		}

		Ok(self)
	}

	/// Per-request timeout as a std duration.
	pub fn request_timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.request_timeout_secs)
	}

	fn default_timeout_secs() -> u64 {
		Self::DEFAULT_TIMEOUT_SECS
	}

	fn default_user_agent() -> String {
		concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into()
	}
}

/// Failure to load a configuration document.
#[derive(Debug, ThisError)]
pub enum ConfigLoadError {
	/// The document is not valid configuration JSON.
	#[error("Configuration document could not be parsed.")]
	Parse(#[source] serde_json::Error),
	/// The document parsed but failed validation.
	#[error(transparent)]
	Invalid(#[from] ClientConfigError),
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Service root.
	pub base_url: Url,
	/// Per-request timeout in seconds.
	pub request_timeout_secs: u64,
	/// `User-Agent` header value.
	pub user_agent: String,
	/// Whether `http://` base URLs are accepted.
	pub allow_insecure_http: bool,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with defaults.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			request_timeout_secs: ClientConfig::DEFAULT_TIMEOUT_SECS,
			user_agent: ClientConfig::default_user_agent(),
			allow_insecure_http: false,
		}
	}

	/// Overrides the per-request timeout, rounded up to whole seconds.
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout_secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);

		self
	}

	/// Overrides the `User-Agent` header.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();

		self
	}

	/// Accepts `http://` base URLs.
	pub fn allow_insecure_http(mut self, allow: bool) -> Self {
		self.allow_insecure_http = allow;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		ClientConfig {
			base_url: self.base_url,
			request_timeout_secs: self.request_timeout_secs,
			user_agent: self.user_agent,
			allow_insecure_http: self.allow_insecure_http,
		}
		.validated()
	}
}
