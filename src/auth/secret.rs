//! Secure token secret wrappers that redact sensitive material.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

macro_rules! def_token {
	($name:ident, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(TokenSecret);
		impl $name {
			/// Wraps a raw token string.
			pub fn new(value: impl Into<String>) -> Self {
				Self(TokenSecret::new(value))
			}

			/// Returns the raw token. Callers must avoid logging this string.
			pub fn expose(&self) -> &str {
				self.0.expose()
			}
		}
		impl From<String> for $name {
			fn from(value: String) -> Self {
				Self::new(value)
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				self.expose()
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.debug_tuple(stringify!($name)).field(&"<redacted>").finish()
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str("<redacted>")
			}
		}
	};
}

def_token!(AccessToken, "Short-lived bearer credential attached to every authorized request.");
def_token!(RefreshToken, "Long-lived credential exchanged only against the refresh endpoint.");

impl AccessToken {
	/// Renders the `Authorization` header value for this token.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.expose())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");

		let access = AccessToken::new("access-secret");
		let refresh = RefreshToken::new("refresh-secret");

		assert_eq!(format!("{access:?}"), "AccessToken(\"<redacted>\")");
		assert_eq!(format!("{refresh}"), "<redacted>");
	}

	#[test]
	fn access_token_renders_bearer_header() {
		assert_eq!(AccessToken::new("T2").bearer(), "Bearer T2");
	}

	#[test]
	fn tokens_serialize_as_plain_strings() {
		let json = serde_json::to_string(&RefreshToken::new("R2"))
			.expect("Refresh token should serialize to JSON.");

		assert_eq!(json, "\"R2\"");
	}
}
