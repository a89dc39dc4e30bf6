//! Logical request and response values that flow through the dispatcher.

// crates.io
use http::{
	HeaderMap, HeaderValue, Method, StatusCode,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::{ConfigError, DecodeError},
	http::{HttpRequest, HttpResponse},
};

const JSON: &str = "application/json";

/// How a request is authorized and whether it may recover from a 401.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RequestAuth {
	/// Attach the stored access token; a first 401 triggers refresh-and-retry.
	#[default]
	Bearer,
	/// Anonymous endpoint (login, register, password reset). A 401 here is a credential
	/// error and is returned as-is.
	Public,
	/// The refresh endpoint itself. Never carries a bearer token and never recurses into
	/// recovery.
	RefreshExchange,
}
impl RequestAuth {
	/// Whether the stored access token is attached and 401 recovery applies.
	pub const fn is_bearer(self) -> bool {
		matches!(self, Self::Bearer)
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Bearer => "bearer",
			Self::Public => "public",
			Self::RefreshExchange => "refresh_exchange",
		}
	}
}

/// One logical service call: method, path, query, optional JSON body, and auth mode.
///
/// The value is immutable once dispatched; a retry rebuilds the wire request from it with
/// the renewed token instead of mutating shared headers.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the configured base URL, e.g. `/api/settings`.
	pub path: String,
	/// Extra path segments, percent-encoded when the URL is built.
	pub segments: Vec<String>,
	/// Query parameters in insertion order.
	pub query: Vec<(String, String)>,
	/// Encoded JSON body, if any.
	pub body: Option<Vec<u8>>,
	/// Authorization mode.
	pub auth: RequestAuth,
}
impl ApiRequest {
	/// Creates a bearer-authorized request without a body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			segments: Vec::new(),
			query: Vec::new(),
			body: None,
			auth: RequestAuth::Bearer,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Appends a path segment that is percent-encoded when the URL is built.
	pub fn segment(mut self, segment: impl Into<String>) -> Self {
		self.segments.push(segment.into());

		self
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Encodes `body` as the JSON request body.
	pub fn json<T>(mut self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body).map_err(ConfigError::EncodeBody)?);

		Ok(self)
	}

	/// Marks the request as anonymous.
	pub fn public(mut self) -> Self {
		self.auth = RequestAuth::Public;

		self
	}

	/// Marks the request as the refresh exchange.
	pub fn refresh_exchange(mut self) -> Self {
		self.auth = RequestAuth::RefreshExchange;

		self
	}

	/// Human-readable label such as `GET /api/settings`; never includes query values.
	pub fn label(&self) -> String {
		let mut label = format!("{} {}", self.method, self.path);

		for segment in &self.segments {
			label.push('/');
			label.push_str(segment);
		}

		label
	}

	/// Resolves the request URL against `base`.
	pub fn url(&self, base: &Url) -> Result<Url, ConfigError> {
		let relative = self.path.trim_start_matches('/');
		let mut url = base
			.join(relative)
			.map_err(|source| ConfigError::InvalidPath { path: self.path.clone(), source })?;

		if !self.segments.is_empty() {
			// Joined URLs always have a hierarchical path because the base is validated.
			if let Ok(mut path) = url.path_segments_mut() {
				path.pop_if_empty().extend(&self.segments);
			}
		}
		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&self.query);
		}

		Ok(url)
	}

	/// Builds the wire request, attaching `bearer` when provided.
	pub fn to_http(
		&self,
		base: &Url,
		bearer: Option<&AccessToken>,
	) -> Result<HttpRequest, ConfigError> {
		let url = self.url(base)?;
		let mut builder = http::Request::builder()
			.method(self.method.clone())
			.uri(url.as_str())
			.header(ACCEPT, JSON);

		if self.body.is_some() {
			builder = builder.header(CONTENT_TYPE, JSON);
		}
		if let Some(token) = bearer {
			let mut value = HeaderValue::try_from(token.bearer()).map_err(http::Error::from)?;

			value.set_sensitive(true);
			builder = builder.header(AUTHORIZATION, value);
		}

		Ok(builder.body(self.body.clone().unwrap_or_default())?)
	}
}

/// Service response passed back unchanged by the dispatcher.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	request: String,
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl ApiResponse {
	/// Wraps a transport response produced for the request labelled `request`.
	pub fn from_http(request: impl Into<String>, response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { request: request.into(), status: parts.status, headers: parts.headers, body }
	}

	/// HTTP status.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw response body.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Whether the status is 2xx.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Whether the status is 401.
	pub fn is_unauthorized(&self) -> bool {
		self.status == StatusCode::UNAUTHORIZED
	}

	/// Converts non-2xx responses into [`Error::Api`].
	pub fn error_for_status(self) -> Result<Self> {
		if self.is_success() {
			Ok(self)
		} else {
			Err(Error::Api { status: self.status.as_u16(), message: self.error_message() })
		}
	}

	/// Decodes the body as JSON. An empty body decodes as JSON `null`.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let body: &[u8] =
			if self.body.iter().all(u8::is_ascii_whitespace) { b"null" } else { &self.body };
		let de = &mut serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(de).map_err(|source| DecodeError {
			request: self.request.clone(),
			status: self.status.as_u16(),
			source,
		})
	}

	fn error_message(&self) -> String {
		#[derive(Deserialize)]
		struct ErrorBody {
			message: Option<String>,
			title: Option<String>,
			error: Option<String>,
		}

		const MAX_PREVIEW: usize = 200;

		if let Some(text) = serde_json::from_slice::<ErrorBody>(&self.body)
			.ok()
			.and_then(|ErrorBody { message, title, error }| message.or(error).or(title))
		{
			return text;
		}

		let text = String::from_utf8_lossy(&self.body);
		let text = text.trim();

		if text.is_empty() {
			return self.status.canonical_reason().unwrap_or("unknown status").into();
		}

		text.chars().take(MAX_PREVIEW).collect()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn base() -> Url {
		Url::parse("https://api.example.com/").expect("Base URL should parse.")
	}

	fn response(status: u16, body: &str) -> ApiResponse {
		let mut http_response = HttpResponse::new(body.as_bytes().to_vec());

		*http_response.status_mut() =
			StatusCode::from_u16(status).expect("Fixture status should be valid.");

		ApiResponse::from_http("GET /api/test", http_response)
	}

	#[test]
	fn bearer_requests_carry_authorization_header() {
		let token = AccessToken::new("T2");
		let request = ApiRequest::get("/api/settings")
			.to_http(&base(), Some(&token))
			.expect("Request should build.");

		assert_eq!(request.uri().to_string(), "https://api.example.com/api/settings");
		assert_eq!(
			request.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok()),
			Some("Bearer T2")
		);
		assert!(request.headers().get(CONTENT_TYPE).is_none());
	}

	#[test]
	fn missing_token_still_builds_request() {
		let request =
			ApiRequest::get("/api/settings").to_http(&base(), None).expect("Request should build.");

		assert!(request.headers().get(AUTHORIZATION).is_none());
	}

	#[test]
	fn segments_and_query_are_encoded() {
		let request = ApiRequest::get("/api/number")
			.segment("+1 555/0100")
			.segment("info")
			.query("page", 2)
			.query("limit", 20);
		let url = request.url(&base()).expect("URL should build.");

		assert_eq!(
			url.as_str(),
			"https://api.example.com/api/number/+1%20555%2F0100/info?page=2&limit=20"
		);
		assert_eq!(request.label(), "GET /api/number/+1 555/0100/info");
	}

	#[test]
	fn base_path_prefix_is_preserved() {
		let base = Url::parse("https://api.example.com/v2/").expect("Base URL should parse.");
		let url = ApiRequest::get("/api/settings").url(&base).expect("URL should build.");

		assert_eq!(url.as_str(), "https://api.example.com/v2/api/settings");
	}

	#[test]
	fn json_body_sets_content_type() {
		let request = ApiRequest::post("/api/check-number")
			.json(&serde_json::json!({ "phoneNumber": "+15550100" }))
			.expect("Body should encode.")
			.to_http(&base(), None)
			.expect("Request should build.");

		assert_eq!(
			request.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()),
			Some("application/json")
		);
		assert_eq!(request.body().as_slice(), br#"{"phoneNumber":"+15550100"}"#);
	}

	#[test]
	fn empty_body_decodes_as_null() {
		let value: serde_json::Value = response(200, "").json().expect("Empty body should decode.");

		assert!(value.is_null());
	}

	#[test]
	fn error_for_status_prefers_message_fields() {
		let err = response(409, r#"{"message":"Number already whitelisted"}"#)
			.error_for_status()
			.expect_err("409 should surface as an API error.");

		assert!(matches!(
			err,
			Error::Api { status: 409, ref message } if message == "Number already whitelisted"
		));

		let err = response(502, "").error_for_status().expect_err("502 should surface.");

		assert!(matches!(err, Error::Api { status: 502, ref message } if message == "Bad Gateway"));
	}
}
