//! Number reputation callers used by the call screener.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, client::ApiClient, dispatch::ApiRequest, http::ApiHttpClient};

const CHECK_NUMBER_PATH: &str = "/api/check-number";
const INCOMING_CALL_PATH: &str = "/api/incoming-call";
const NUMBER_PATH: &str = "/api/number";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckNumberBody<'a> {
	phone_number: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IncomingCallBody<'a> {
	phone_number: &'a str,
	#[serde(with = "time::serde::rfc3339")]
	timestamp: OffsetDateTime,
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Looks up the spam verdict for a number.
	pub async fn check_number(&self, phone_number: &str) -> Result<Value> {
		self.fetch(ApiRequest::post(CHECK_NUMBER_PATH).json(&CheckNumberBody { phone_number })?)
			.await
	}

	/// Reports an incoming call and returns whether it should be blocked.
	pub async fn check_incoming_call(
		&self,
		phone_number: &str,
		received_at: OffsetDateTime,
	) -> Result<Value> {
		self.fetch(
			ApiRequest::post(INCOMING_CALL_PATH)
				.json(&IncomingCallBody { phone_number, timestamp: received_at })?,
		)
		.await
	}

	/// Fetches details about a number. The number is percent-encoded into the path.
	pub async fn number_info(&self, phone_number: &str) -> Result<Value> {
		self.fetch(ApiRequest::get(NUMBER_PATH).segment(phone_number).segment("info")).await
	}
}
