//! `/api/blocked-calls` callers: call history, statistics, and wrong-block reports.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, client::ApiClient, dispatch::ApiRequest, http::ApiHttpClient};

const BLOCKED_CALLS_PATH: &str = "/api/blocked-calls";
const STATS_PATH: &str = "/api/blocked-calls/stats";

/// Page selector for paginated listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
	/// One-based page number.
	pub page: u32,
	/// Items per page.
	pub limit: u32,
}
impl PageRequest {
	/// Selects `page` with `limit` items per page.
	pub const fn new(page: u32, limit: u32) -> Self {
		Self { page, limit }
	}
}
impl Default for PageRequest {
	fn default() -> Self {
		Self::new(1, 20)
	}
}

/// One blocked incoming call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedCall {
	/// Service-side identifier.
	pub id: String,
	/// Caller's number.
	pub phone_number: String,
	/// When the call was blocked.
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
	/// Call classification, when known.
	#[serde(default)]
	pub call_type: Option<String>,
}

/// One page of blocked calls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockedCallPage {
	/// Calls on this page, newest first.
	#[serde(default)]
	pub calls: Vec<BlockedCall>,
	/// Pagination metadata as reported by the service.
	#[serde(default)]
	pub pagination: Option<Value>,
}

/// Blocked-call counters shown on the dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedCallStats {
	/// Calls blocked today.
	#[serde(default)]
	pub today: u64,
	/// Calls blocked this week.
	#[serde(default)]
	pub this_week: u64,
	/// Calls blocked overall.
	#[serde(default)]
	pub total: u64,
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Lists blocked calls.
	pub async fn blocked_calls(&self, page: PageRequest) -> Result<BlockedCallPage> {
		self.fetch(
			ApiRequest::get(BLOCKED_CALLS_PATH).query("page", page.page).query("limit", page.limit),
		)
		.await
	}

	/// Fetches blocked-call counters.
	pub async fn blocked_call_stats(&self) -> Result<BlockedCallStats> {
		self.fetch(ApiRequest::get(STATS_PATH)).await
	}

	/// Deletes one blocked call from the history.
	pub async fn delete_blocked_call(&self, id: &str) -> Result<Value> {
		self.fetch(ApiRequest::delete(BLOCKED_CALLS_PATH).segment(id)).await
	}

	/// Clears the blocked-call history.
	pub async fn delete_all_blocked_calls(&self) -> Result<Value> {
		self.fetch(ApiRequest::delete(BLOCKED_CALLS_PATH)).await
	}

	/// Reports that a call was blocked by mistake.
	pub async fn report_wrong_block(&self, id: &str) -> Result<Value> {
		self.fetch(ApiRequest::put(BLOCKED_CALLS_PATH).segment(id).segment("report-wrong")).await
	}
}
