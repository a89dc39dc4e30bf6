//! `/api/auth` callers: sign-in, registration, profile, password recovery, and sign-out.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::AuthSession,
	client::ApiClient,
	coordinator::RefreshTokenBody,
	dispatch::ApiRequest,
	error::SessionError,
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const LOGIN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";
const VERIFY_TOKEN_PATH: &str = "/api/auth/verify-token";
const UPDATE_PROFILE_PATH: &str = "/api/auth/update-profile";
const FORGOT_PASSWORD_PATH: &str = "/api/auth/forgot-password";
const RESET_PASSWORD_PATH: &str = "/api/auth/reset-password";
const CONFIRM_EMAIL_PATH: &str = "/api/auth/confirm-email";
const LOGOUT_PATH: &str = "/api/auth/logout";

/// Email and password credentials.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}
impl LoginRequest {
	/// Creates a login request.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}
impl Debug for LoginRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// New account details.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
	/// Display name.
	pub full_name: String,
}
impl Debug for RegisterRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RegisterRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.field("full_name", &self.full_name)
			.finish()
	}
}

/// Profile changes; absent fields are left untouched.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
	/// New display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// New password.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub new_password: Option<String>,
}
impl Debug for UpdateProfileRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UpdateProfileRequest")
			.field("name", &self.name)
			.field("new_password", &self.new_password.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Starts password recovery for an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ForgotPasswordRequest {
	/// Account email.
	pub email: String,
}

/// Completes password recovery with the emailed code.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
	/// Account email.
	pub email: String,
	/// Code delivered by email.
	pub code: String,
	/// Replacement password.
	pub new_password: String,
}
impl Debug for ResetPasswordRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResetPasswordRequest")
			.field("email", &self.email)
			.field("code", &self.code)
			.field("new_password", &"<redacted>")
			.finish()
	}
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Signs in and stores both issued tokens.
	///
	/// Sent without a bearer token; a 401 here means bad credentials and is returned as
	/// [`Error::Api`] without touching the refresh path.
	pub async fn login(&self, request: &LoginRequest) -> Result<AuthSession> {
		let session: AuthSession =
			self.fetch(ApiRequest::post(LOGIN_PATH).public().json(request)?).await?;

		self.store().store_session(&session).await?;

		Ok(session)
	}

	/// Creates an account.
	pub async fn register(&self, request: &RegisterRequest) -> Result<Value> {
		self.fetch(ApiRequest::post(REGISTER_PATH).public().json(request)?).await
	}

	/// Asks the service whether the stored access token is still valid.
	pub async fn verify_token(&self) -> Result<Value> {
		self.fetch(ApiRequest::get(VERIFY_TOKEN_PATH)).await
	}

	/// Updates the signed-in user's profile.
	pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<Value> {
		self.fetch(ApiRequest::put(UPDATE_PROFILE_PATH).json(request)?).await
	}

	/// Sends a password recovery code to `request.email`.
	pub async fn forgot_password(&self, request: &ForgotPasswordRequest) -> Result<Value> {
		self.fetch(ApiRequest::post(FORGOT_PASSWORD_PATH).public().json(request)?).await
	}

	/// Sets a new password using a recovery code.
	pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<Value> {
		self.fetch(ApiRequest::post(RESET_PASSWORD_PATH).public().json(request)?).await
	}

	/// Confirms an email address with the token from the confirmation link.
	pub async fn confirm_email(&self, user_id: &str, token: &str) -> Result<Value> {
		let request = ApiRequest::get(CONFIRM_EMAIL_PATH)
			.public()
			.query("userId", user_id)
			.query("token", token);

		self.fetch(request).await
	}

	/// Signs out.
	///
	/// The server-side revocation is best effort: it is attempted only when a refresh token
	/// is stored and its failure is logged, never returned. Both local tokens are always
	/// purged; only a purge failure is reported.
	pub async fn logout(&self) -> Result<()> {
		const KIND: FlowKind = FlowKind::Logout;

		let span = FlowSpan::new(KIND, "logout");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.logout_and_purge()).await;

		obs::record_flow_outcome(
			KIND,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}

	/// Startup check that decides between the signed-in and sign-in surfaces.
	///
	/// Returns `false` without a network call when no access token is stored. Otherwise the
	/// token is verified (an expired one goes through the normal refresh path first); any
	/// verification failure purges the stored credentials and returns `false`.
	pub async fn restore_session(&self) -> Result<bool> {
		const KIND: FlowKind = FlowKind::RestoreSession;

		let span = FlowSpan::new(KIND, "restore_session");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.verify_stored_session()).await;

		obs::record_flow_outcome(
			KIND,
			if matches!(result, Ok(true)) { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}

	async fn logout_and_purge(&self) -> Result<()> {
		match self.store().get_refresh().await {
			Ok(Some(_)) =>
				if let Err(e) = self.revoke().await {
					obs::warn_event(
						FlowKind::Logout,
						"Server-side logout failed; purging locally.",
						&e,
					);
				},
			Ok(None) =>
				obs::debug_event(FlowKind::Logout, "No refresh token stored; local purge only."),
			Err(e) => obs::warn_event(
				FlowKind::Logout,
				"Refresh token could not be read; purging locally.",
				&e,
			),
		}

		Ok(self.store().clear_all().await?)
	}

	// The body is rebuilt for the resend so a refresh triggered by this call revokes the
	// rotated token rather than the one it replaced.
	async fn revoke(&self) -> Result<()> {
		self.dispatcher().send_rebuilt(|| self.revoke_request()).await?.error_for_status()?;

		Ok(())
	}

	async fn revoke_request(&self) -> Result<ApiRequest> {
		let refresh_token =
			self.store().get_refresh().await?.ok_or(SessionError::MissingRefreshToken)?;

		Ok(ApiRequest::post(LOGOUT_PATH)
			.json(&RefreshTokenBody { refresh_token: refresh_token.expose() })?)
	}

	async fn verify_stored_session(&self) -> Result<bool> {
		if self.store().get_access().await?.is_none() {
			return Ok(false);
		}

		match self.verify_token().await {
			Ok(_) => Ok(true),
			Err(e) => {
				obs::warn_event(
					FlowKind::RestoreSession,
					"Stored session failed verification; purging.",
					&e,
				);
				self.store().clear_all().await?;

				Ok(false)
			},
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn credential_debug_output_is_redacted() {
		let login = LoginRequest::new("ada@example.com", "hunter2");
		let rendered = format!("{login:?}");

		assert!(rendered.contains("ada@example.com"));
		assert!(!rendered.contains("hunter2"));

		let profile =
			UpdateProfileRequest { name: None, new_password: Some("correct horse".into()) };

		assert!(!format!("{profile:?}").contains("correct horse"));
	}

	#[test]
	fn profile_updates_omit_absent_fields() {
		let body = serde_json::to_value(UpdateProfileRequest {
			name: Some("Ada".into()),
			new_password: None,
		})
		.expect("Profile update should serialize.");

		assert_eq!(body, serde_json::json!({ "name": "Ada" }));
	}

	#[test]
	fn registration_uses_camel_case() {
		let body = serde_json::to_value(RegisterRequest {
			email: "ada@example.com".into(),
			password: "pw".into(),
			full_name: "Ada Lovelace".into(),
		})
		.expect("Registration should serialize.");

		assert_eq!(body["fullName"], "Ada Lovelace");
	}
}
