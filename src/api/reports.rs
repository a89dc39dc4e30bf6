//! `/api/reports` callers: spam reports and report helpers.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, client::ApiClient, dispatch::ApiRequest, http::ApiHttpClient};

const REPORTS_PATH: &str = "/api/reports";
const RECENT_CALLS_PATH: &str = "/api/reports/recent-calls";
const SPAM_TYPES_PATH: &str = "/api/reports/spam-types";

/// Number of recent calls offered on the report screen.
pub const RECENT_CALLS_DEFAULT_LIMIT: u32 = 10;

/// Classification picked by the user when reporting a number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpamType {
	/// Sales calls.
	Telemarketing,
	/// Fraud attempts.
	Scam,
	/// Nuisance calls.
	Annoying,
	/// Anything else.
	Other,
}

/// Spam report for one number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportRequest {
	/// Reported number.
	pub phone_number: String,
	/// Classification.
	pub spam_type: SpamType,
	/// Free-form details.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// When the reported call happened.
	#[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<OffsetDateTime>,
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Submits a spam report.
	pub async fn submit_report(&self, report: &SubmitReportRequest) -> Result<Value> {
		self.fetch(ApiRequest::post(REPORTS_PATH).json(report)?).await
	}

	/// Lists up to `limit` recent calls the user may want to report.
	pub async fn recent_calls_for_report(&self, limit: u32) -> Result<Value> {
		self.fetch(ApiRequest::get(RECENT_CALLS_PATH).query("limit", limit)).await
	}

	/// Lists the spam classifications the service accepts.
	pub async fn spam_types(&self) -> Result<Value> {
		self.fetch(ApiRequest::get(SPAM_TYPES_PATH)).await
	}
}
