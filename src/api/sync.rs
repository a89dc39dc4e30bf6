//! `/api/sync` callers that reconcile on-device state with the service.

// self
use crate::{
	_prelude::*,
	api::{BlockingMode, MessageResponse, WorkingHours},
	client::ApiClient,
	dispatch::ApiRequest,
	http::ApiHttpClient,
};

const LAST_UPDATE_PATH: &str = "/api/sync/last-update";
const BLOCKED_NUMBERS_PATH: &str = "/api/sync/blocked-numbers";
const SETTINGS_PATH: &str = "/api/sync/settings";

/// Server-side modification times used to decide what to sync.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastUpdateTimestamps {
	/// Last settings change.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub settings_timestamp: Option<OffsetDateTime>,
	/// Last blocked-number list change.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub blocked_numbers_timestamp: Option<OffsetDateTime>,
}

/// A number blocked on the device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedNumberSync {
	/// Blocked number.
	pub phone_number: String,
	/// When it was blocked.
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}

/// Batch of device-side blocked numbers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncBlockedNumbersRequest {
	/// Numbers to upload.
	pub numbers: Vec<BlockedNumberSync>,
}

/// Result of a blocked-number upload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBlockedNumbersResponse {
	/// Numbers accepted by the service.
	#[serde(default)]
	pub synced_count: u64,
	/// Message from the service, if any.
	#[serde(default)]
	pub message: Option<String>,
}

/// Device-side settings snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettingsRequest {
	/// Blocking mode.
	pub blocking_mode: BlockingMode,
	/// Blocking schedule.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub working_hours: Option<WorkingHours>,
	/// Whether block notifications are shown.
	pub notifications_enabled: bool,
	/// When the snapshot was taken.
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Fetches server-side modification times.
	pub async fn last_update_timestamps(&self) -> Result<LastUpdateTimestamps> {
		self.fetch(ApiRequest::get(LAST_UPDATE_PATH)).await
	}

	/// Uploads device-side blocked numbers.
	pub async fn sync_blocked_numbers(
		&self,
		request: &SyncBlockedNumbersRequest,
	) -> Result<SyncBlockedNumbersResponse> {
		self.fetch(ApiRequest::post(BLOCKED_NUMBERS_PATH).json(request)?).await
	}

	/// Uploads the device-side settings snapshot.
	pub async fn sync_settings(&self, request: &SyncSettingsRequest) -> Result<MessageResponse> {
		self.fetch(ApiRequest::post(SETTINGS_PATH).json(request)?).await
	}
}
