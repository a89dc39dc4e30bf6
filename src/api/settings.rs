//! `/api/settings` callers: blocking mode, working hours, notifications, and the whitelist.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, client::ApiClient, dispatch::ApiRequest, http::ApiHttpClient};

const SETTINGS_PATH: &str = "/api/settings";
const BLOCKING_MODE_PATH: &str = "/api/settings/blocking-mode";
const WORKING_HOURS_PATH: &str = "/api/settings/working-hours";
const NOTIFICATIONS_PATH: &str = "/api/settings/notifications";
const WHITELIST_PATH: &str = "/api/settings/whitelist";

/// Which incoming calls are blocked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockingMode {
	/// Block every reported spam number.
	All,
	/// Block only numbers known to the service.
	Known,
	/// User-defined rules.
	Custom,
	/// Mode introduced by a newer service version.
	#[serde(other)]
	Unknown,
}

/// When blocking is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkingHoursMode {
	/// Around the clock.
	#[serde(rename = "24/7")]
	AlwaysOn,
	/// Between [`WorkingHours::start_time`] and [`WorkingHours::end_time`].
	#[serde(rename = "custom")]
	Custom,
	/// Mode introduced by a newer service version.
	#[serde(other)]
	Unknown,
}

/// Blocking schedule. Times are `HH:MM` in the device's local time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
	/// Schedule mode.
	pub mode: WorkingHoursMode,
	/// Start of the blocking window for [`WorkingHoursMode::Custom`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub start_time: Option<String>,
	/// End of the blocking window for [`WorkingHoursMode::Custom`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub end_time: Option<String>,
}
impl WorkingHours {
	/// Blocking around the clock.
	pub fn always_on() -> Self {
		Self { mode: WorkingHoursMode::AlwaysOn, start_time: None, end_time: None }
	}

	/// Blocking between `start` and `end` (`HH:MM`).
	pub fn custom(start: impl Into<String>, end: impl Into<String>) -> Self {
		Self {
			mode: WorkingHoursMode::Custom,
			start_time: Some(start.into()),
			end_time: Some(end.into()),
		}
	}
}

/// Current user settings. Fields the client does not model are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
	/// Blocking mode.
	#[serde(default)]
	pub blocking_mode: Option<BlockingMode>,
	/// Blocking schedule.
	#[serde(default)]
	pub working_hours: Option<WorkingHours>,
	/// Whether block notifications are shown.
	#[serde(default)]
	pub notifications_enabled: Option<bool>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, Value>,
}

/// Whitelisted number, as sent when adding and as listed by the service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
	/// Phone number.
	pub number: String,
	/// Optional contact label.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

#[derive(Serialize)]
struct ModeBody {
	mode: BlockingMode,
}

#[derive(Serialize)]
struct NotificationsBody {
	enabled: bool,
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Fetches the current settings.
	pub async fn settings(&self) -> Result<Settings> {
		self.fetch(ApiRequest::get(SETTINGS_PATH)).await
	}

	/// Changes which calls are blocked.
	pub async fn update_blocking_mode(&self, mode: BlockingMode) -> Result<Value> {
		self.fetch(ApiRequest::put(BLOCKING_MODE_PATH).json(&ModeBody { mode })?).await
	}

	/// Changes when blocking is active.
	pub async fn update_working_hours(&self, hours: &WorkingHours) -> Result<Value> {
		self.fetch(ApiRequest::put(WORKING_HOURS_PATH).json(hours)?).await
	}

	/// Turns block notifications on or off.
	pub async fn update_notifications(&self, enabled: bool) -> Result<Value> {
		self.fetch(ApiRequest::put(NOTIFICATIONS_PATH).json(&NotificationsBody { enabled })?)
			.await
	}

	/// Lists whitelisted numbers.
	pub async fn whitelist(&self) -> Result<Vec<WhitelistEntry>> {
		self.fetch(ApiRequest::get(WHITELIST_PATH)).await
	}

	/// Adds a number to the whitelist.
	pub async fn add_to_whitelist(&self, entry: &WhitelistEntry) -> Result<Value> {
		self.fetch(ApiRequest::post(WHITELIST_PATH).json(entry)?).await
	}

	/// Removes a number from the whitelist. The number is percent-encoded into the path.
	pub async fn remove_from_whitelist(&self, number: &str) -> Result<Value> {
		self.fetch(ApiRequest::delete(WHITELIST_PATH).segment(number)).await
	}
}
