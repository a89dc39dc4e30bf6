//! Session payload returned by the login and refresh endpoints.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, RefreshToken},
};

/// Tokens and identity issued by `POST /api/auth/login` and `POST /api/auth/refresh-token`.
///
/// The service rotates the refresh token on every refresh, so both secrets are always
/// present and always replace the stored pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
	/// Service-side user identifier. Numeric identifiers are kept in their decimal form.
	#[serde(default, deserialize_with = "user_id_from_text_or_number")]
	pub user_id: String,
	/// Display name of the signed-in user.
	#[serde(default)]
	pub full_name: String,
	/// Fresh access token.
	pub access_token: AccessToken,
	/// Rotated refresh token.
	pub refresh_token: RefreshToken,
}

fn user_id_from_text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: serde::Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum UserId {
		Text(String),
		Number(i64),
	}

	Ok(match Option::<UserId>::deserialize(deserializer)? {
		Some(UserId::Text(id)) => id,
		Some(UserId::Number(id)) => id.to_string(),
		None => String::new(),
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn session_decodes_camel_case_payload() {
		let payload = r#"{"userId":"42","fullName":"Ada","accessToken":"T2","refreshToken":"R2"}"#;
		let session: AuthSession =
			serde_json::from_str(payload).expect("Session payload should decode.");

		assert_eq!(session.user_id, "42");
		assert_eq!(session.full_name, "Ada");
		assert_eq!(session.access_token.expose(), "T2");
		assert_eq!(session.refresh_token.expose(), "R2");
	}

	#[test]
	fn numeric_user_ids_are_accepted() {
		let payload = r#"{"userId":42,"accessToken":"T2","refreshToken":"R2"}"#;
		let session: AuthSession =
			serde_json::from_str(payload).expect("Numeric user id should decode.");

		assert_eq!(session.user_id, "42");
		assert!(session.full_name.is_empty());
	}

	#[test]
	fn session_requires_both_tokens() {
		let payload = r#"{"userId":"42","accessToken":"T2"}"#;

		assert!(serde_json::from_str::<AuthSession>(payload).is_err());
	}
}
