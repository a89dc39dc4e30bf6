//! `/api/app` callers: version, permissions, and legal documents.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, client::ApiClient, dispatch::ApiRequest, http::ApiHttpClient};

const VERSION_PATH: &str = "/api/app/version";
const REQUIRED_PERMISSIONS_PATH: &str = "/api/app/required-permissions";
const VERIFY_PERMISSIONS_PATH: &str = "/api/app/verify-permissions";
const PRIVACY_POLICY_PATH: &str = "/api/app/privacy-policy";

/// Device permission the app needs, with the reason shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredPermission {
	/// Platform permission identifier.
	pub id: String,
	/// Explanation shown to the user.
	#[serde(default)]
	pub reason: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyPermissionsBody<'a> {
	granted_permissions: &'a [String],
}

/// Outcome of a permission check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionStatus {
	/// Overall verdict reported by the service.
	#[serde(default)]
	pub status: String,
	/// Required permissions that were not granted.
	#[serde(default)]
	pub missing: Vec<String>,
}

/// Location of the current privacy policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyPolicy {
	/// Policy document.
	pub url: Url,
	/// Revision date as published by the service.
	#[serde(default)]
	pub last_updated: Option<String>,
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Fetches the latest published app version.
	pub async fn app_version(&self) -> Result<Value> {
		self.fetch(ApiRequest::get(VERSION_PATH)).await
	}

	/// Lists the permissions the app needs.
	pub async fn required_permissions(&self) -> Result<Vec<RequiredPermission>> {
		self.fetch(ApiRequest::get(REQUIRED_PERMISSIONS_PATH)).await
	}

	/// Checks the granted permissions against the required set.
	pub async fn verify_permissions(&self, granted: &[String]) -> Result<PermissionStatus> {
		self.fetch(
			ApiRequest::post(VERIFY_PERMISSIONS_PATH)
				.json(&VerifyPermissionsBody { granted_permissions: granted })?,
		)
		.await
	}

	/// Fetches the privacy policy location.
	pub async fn privacy_policy(&self) -> Result<PrivacyPolicy> {
		self.fetch(ApiRequest::get(PRIVACY_POLICY_PATH)).await
	}
}
