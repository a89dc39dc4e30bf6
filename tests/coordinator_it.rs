// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use http::{HeaderValue, StatusCode, header::AUTHORIZATION};
use parking_lot::Mutex;
use tokio::{sync::Semaphore, task::JoinHandle, time};
// self
use callshield_client::{
	auth::{AccessToken, RefreshToken},
	client::ApiClient,
	config::ClientConfig,
	coordinator::SessionListener,
	dispatch::{ApiRequest, ApiResponse},
	error::{Error, Result, SessionError, TransportError},
	http::{ApiHttpClient, HttpFuture, HttpRequest, HttpResponse},
	store::{ACCESS_TOKEN_SLOT, CredentialStore, MemoryBackend},
	url::Url,
};

const REFRESH_PATH: &str = "/api/auth/refresh-token";
const ALWAYS_UNAUTHORIZED_PATH: &str = "/api/always-unauthorized";
const BROKEN_PATH: &str = "/api/broken";

#[derive(Clone, Debug)]
enum RefreshReply {
	Rotate { access: &'static str, refresh: &'static str },
	Status(u16),
	Garbage,
	NetworkDown,
}

#[derive(Clone, Debug)]
struct Seen {
	path: String,
	authorization: Option<String>,
	stored_access: Option<String>,
}

// Scripted service: accepts exactly one bearer token, rotates it on refresh, and holds
// refresh responses until the test releases the gate.
struct FakeService {
	valid_token: Mutex<String>,
	refresh_reply: Mutex<RefreshReply>,
	refresh_gate: Semaphore,
	refresh_bodies: Mutex<Vec<serde_json::Value>>,
	refresh_calls: AtomicUsize,
	seen: Mutex<Vec<Seen>>,
	plain: MemoryBackend,
}
impl FakeService {
	fn new(valid_token: &str, reply: RefreshReply, plain: MemoryBackend) -> Arc<Self> {
		Arc::new(Self {
			valid_token: Mutex::new(valid_token.into()),
			refresh_reply: Mutex::new(reply),
			refresh_gate: Semaphore::new(0),
			refresh_bodies: Mutex::new(Vec::new()),
			refresh_calls: AtomicUsize::new(0),
			seen: Mutex::new(Vec::new()),
			plain,
		})
	}

	fn open_gate(&self) {
		self.refresh_gate.add_permits(Semaphore::MAX_PERMITS / 2);
	}

	fn refresh_calls(&self) -> usize {
		self.refresh_calls.load(Ordering::SeqCst)
	}

	fn seen(&self) -> Vec<Seen> {
		self.seen.lock().clone()
	}

	fn respond(status: u16, body: impl Into<Vec<u8>>) -> HttpResponse {
		let mut response = HttpResponse::new(body.into());

		*response.status_mut() =
			StatusCode::from_u16(status).expect("Fixture status should be valid.");

		response
	}

	async fn refresh(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
		self.refresh_calls.fetch_add(1, Ordering::SeqCst);
		self.refresh_bodies.lock().push(
			serde_json::from_slice(request.body()).expect("Refresh body should be JSON."),
		);
		self.refresh_gate.acquire().await.expect("Refresh gate should stay open.").forget();

		let reply = self.refresh_reply.lock().clone();

		match reply {
			RefreshReply::Rotate { access, refresh } => {
				*self.valid_token.lock() = access.into();

				Ok(Self::respond(
					200,
					serde_json::json!({
						"userId": 7,
						"fullName": "Test User",
						"accessToken": access,
						"refreshToken": refresh
					})
					.to_string(),
				))
			},
			RefreshReply::Status(status) =>
				Ok(Self::respond(status, r#"{"error":"invalid_grant"}"#)),
			RefreshReply::Garbage => Ok(Self::respond(200, r#"{"unexpected":true}"#)),
			RefreshReply::NetworkDown => Err(TransportError::network(std::io::Error::other(
				"connection reset by peer",
			))),
		}
	}

	fn resource(&self, request: &HttpRequest) -> HttpResponse {
		let path = request.uri().path().to_owned();
		let authorization = request
			.headers()
			.get(AUTHORIZATION)
			.and_then(|value: &HeaderValue| value.to_str().ok())
			.map(str::to_owned);
		let stored_access = self.plain.snapshot().get(ACCESS_TOKEN_SLOT).cloned();
		let expected = format!("Bearer {}", self.valid_token.lock());

		self.seen.lock().push(Seen {
			path: path.clone(),
			authorization: authorization.clone(),
			stored_access,
		});

		if path == BROKEN_PATH {
			return Self::respond(500, r#"{"message":"database offline"}"#);
		}
		if path == ALWAYS_UNAUTHORIZED_PATH || authorization.as_deref() != Some(expected.as_str()) {
			return Self::respond(401, "");
		}

		Self::respond(200, serde_json::json!({ "path": path }).to_string())
	}
}
impl ApiHttpClient for FakeService {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			if request.uri().path() == REFRESH_PATH {
				self.refresh(request).await
			} else {
				Ok(self.resource(&request))
			}
		})
	}
}

#[derive(Default)]
struct CountingListener {
	reasons: Mutex<Vec<SessionError>>,
}
impl CountingListener {
	fn count(&self) -> usize {
		self.reasons.lock().len()
	}
}
impl SessionListener for CountingListener {
	fn session_expired(&self, reason: &SessionError) {
		self.reasons.lock().push(reason.clone());
	}
}

struct Harness {
	client: Arc<ApiClient<FakeService>>,
	service: Arc<FakeService>,
	listener: Arc<CountingListener>,
	store: Arc<CredentialStore>,
}
impl Harness {
	async fn new(
		access: Option<&str>,
		refresh: Option<&str>,
		valid: &str,
		reply: RefreshReply,
	) -> Self {
		let plain = MemoryBackend::default();
		let store = Arc::new(CredentialStore::new(
			Arc::new(plain.clone()),
			Arc::new(MemoryBackend::default()),
		));

		if let Some(access) = access {
			store
				.store_access(&AccessToken::new(access))
				.await
				.expect("Seeding access should succeed.");
		}
		if let Some(refresh) = refresh {
			store
				.store_refresh(&RefreshToken::new(refresh))
				.await
				.expect("Seeding refresh should succeed.");
		}

		let service = FakeService::new(valid, reply, plain);
		let listener = Arc::new(CountingListener::default());
		let base_url = Url::parse("http://callshield.test").expect("URL should parse.");
		let config = ClientConfig::builder(base_url)
			.allow_insecure_http(true)
			.build()
			.expect("Config should validate.");
		let client =
			ApiClient::<FakeService>::with_http_client(config, store.clone(), service.clone())
				.with_session_listener(listener.clone());

		Self { client: Arc::new(client), service, listener, store }
	}

	fn spawn_get(&self, path: &'static str) -> JoinHandle<Result<ApiResponse>> {
		let client = self.client.clone();

		tokio::spawn(async move { client.send(ApiRequest::get(path)).await })
	}

	async fn stored_pair(&self) -> (Option<String>, Option<String>) {
		let access = self.store.get_access().await.expect("Access read should succeed.");
		let refresh = self.store.get_refresh().await.expect("Refresh read should succeed.");

		(access.map(|t| t.expose().to_owned()), refresh.map(|t| t.expose().to_owned()))
	}
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
	time::timeout(Duration::from_secs(5), async {
		while !condition() {
			time::sleep(Duration::from_millis(2)).await;
		}
	})
	.await
	.expect("Condition should hold before the deadline.");
}

async fn join(handle: JoinHandle<Result<ApiResponse>>) -> Result<ApiResponse> {
	handle.await.expect("Request task should not panic.")
}

#[tokio::test]
async fn consecutive_refreshes_use_the_latest_refresh_token() {
	let harness = Harness::new(
		Some("T1"),
		Some("R1"),
		"T2",
		RefreshReply::Rotate { access: "T2", refresh: "R2" },
	)
	.await;

	harness.service.open_gate();

	join(harness.spawn_get("/api/a")).await.expect("First recovery should succeed.");

	assert_eq!(harness.stored_pair().await, (Some("T2".into()), Some("R2".into())));

	// The service revokes T2 and will rotate the pair again.
	*harness.service.valid_token.lock() = "T3".into();
	*harness.service.refresh_reply.lock() = RefreshReply::Rotate { access: "T3", refresh: "R3" };

	join(harness.spawn_get("/api/b")).await.expect("Second recovery should succeed.");

	assert_eq!(harness.service.refresh_calls(), 2);
	assert_eq!(
		harness.service.refresh_bodies.lock().as_slice(),
		&[
			serde_json::json!({ "refreshToken": "R1" }),
			serde_json::json!({ "refreshToken": "R2" }),
		]
	);
	assert_eq!(harness.stored_pair().await, (Some("T3".into()), Some("R3".into())));
	assert_eq!(harness.client.refresh_metrics().successes(), 2);
	assert_eq!(harness.listener.count(), 0);
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
	let harness = Harness::new(
		Some("T1"),
		Some("R1"),
		"T2",
		RefreshReply::Rotate { access: "T2", refresh: "R2" },
	)
	.await;
	let coordinator = harness.client.coordinator();
	let a = harness.spawn_get("/api/a");
	let b = harness.spawn_get("/api/b");
	let c = harness.spawn_get("/api/c");

	wait_until(|| coordinator.waiting() == 2).await;

	assert!(coordinator.is_refreshing());
	assert_eq!(harness.service.refresh_calls(), 1);

	harness.service.open_gate();

	for handle in [a, b, c] {
		let response = join(handle).await.expect("Retried request should succeed.");

		assert_eq!(response.status(), StatusCode::OK);
	}

	assert!(!coordinator.is_refreshing());
	assert_eq!(coordinator.waiting(), 0);
	assert_eq!(harness.service.refresh_calls(), 1);
	assert_eq!(
		harness.service.refresh_bodies.lock().as_slice(),
		&[serde_json::json!({ "refreshToken": "R1" })]
	);
	assert_eq!(harness.stored_pair().await, (Some("T2".into()), Some("R2".into())));
	assert_eq!(harness.listener.count(), 0);

	let metrics = harness.client.refresh_metrics();

	assert_eq!((metrics.attempts(), metrics.exchanges(), metrics.successes()), (1, 1, 1));

	let seen = harness.service.seen();
	let retried: Vec<_> =
		seen.iter().filter(|s| s.authorization.as_deref() == Some("Bearer T2")).collect();

	assert_eq!(seen.len(), 6);
	assert_eq!(retried.len(), 3);
	// Waiters are released only after the rotated access token is persisted.
	assert!(retried.iter().all(|s| s.stored_access.as_deref() == Some("T2")));
}

#[tokio::test]
async fn rejected_refresh_fans_out_one_failure() {
	let harness =
		Harness::new(Some("T1"), Some("R1"), "T2", RefreshReply::Status(401)).await;
	let coordinator = harness.client.coordinator();
	let handles =
		[harness.spawn_get("/api/a"), harness.spawn_get("/api/b"), harness.spawn_get("/api/c")];

	wait_until(|| coordinator.waiting() == 2).await;
	harness.service.open_gate();

	for handle in handles {
		let err = join(handle).await.expect_err("Every request should fail with the session.");

		assert!(err.is_session_expired());
		assert!(matches!(err, Error::Session(SessionError::Rejected { status: 401 })));
	}

	assert!(!coordinator.is_refreshing());
	assert_eq!(harness.service.refresh_calls(), 1);
	assert_eq!(harness.stored_pair().await, (None, None));
	assert_eq!(harness.listener.count(), 1);
	assert_eq!(harness.client.refresh_metrics().failures(), 1);
	// Nothing was retried.
	assert_eq!(harness.service.seen().len(), 3);
}

#[tokio::test]
async fn refresh_transport_failure_clears_flag_and_rejects_waiters() {
	let harness = Harness::new(Some("T1"), Some("R1"), "T2", RefreshReply::NetworkDown).await;
	let coordinator = harness.client.coordinator();
	let a = harness.spawn_get("/api/a");
	let b = harness.spawn_get("/api/b");

	wait_until(|| coordinator.waiting() == 1).await;
	harness.service.open_gate();

	for handle in [a, b] {
		let err = join(handle).await.expect_err("Requests should fail with the session.");

		assert!(matches!(
			err,
			Error::Session(SessionError::Transport { ref message })
				if message.contains("connection reset")
		));
	}

	assert!(!coordinator.is_refreshing());
	assert_eq!(harness.stored_pair().await, (None, None));
	assert_eq!(harness.listener.count(), 1);
}

#[tokio::test]
async fn undecodable_refresh_body_ends_session() {
	let harness = Harness::new(Some("T1"), Some("R1"), "T2", RefreshReply::Garbage).await;

	harness.service.open_gate();

	let err = harness
		.client
		.send(ApiRequest::get("/api/a"))
		.await
		.expect_err("Garbage refresh body should end the session.");

	assert!(matches!(err, Error::Session(SessionError::Decode { .. })));
	assert_eq!(harness.stored_pair().await, (None, None));
	assert_eq!(harness.listener.count(), 1);
}

#[tokio::test]
async fn missing_refresh_token_skips_network_and_signals_expiry() {
	let harness = Harness::new(
		Some("T1"),
		None,
		"T2",
		RefreshReply::Rotate { access: "T2", refresh: "R2" },
	)
	.await;
	let err = harness
		.client
		.send(ApiRequest::get("/api/a"))
		.await
		.expect_err("Request should fail without a refresh token.");

	assert!(matches!(err, Error::Session(SessionError::MissingRefreshToken)));
	assert_eq!(harness.service.refresh_calls(), 0);
	assert_eq!(harness.client.refresh_metrics().exchanges(), 0);
	assert_eq!(harness.stored_pair().await, (None, None));
	assert_eq!(harness.listener.count(), 1);
	assert!(!harness.client.coordinator().is_refreshing());
}

#[tokio::test]
async fn cancelled_leader_releases_waiters_and_coordinator() {
	let harness = Harness::new(
		Some("T1"),
		Some("R1"),
		"T2",
		RefreshReply::Rotate { access: "T2", refresh: "R2" },
	)
	.await;
	let coordinator = harness.client.coordinator();
	let leader = harness.spawn_get("/api/a");

	wait_until(|| coordinator.is_refreshing()).await;

	let waiter = harness.spawn_get("/api/b");

	wait_until(|| coordinator.waiting() == 1).await;
	leader.abort();

	let err = join(waiter).await.expect_err("Waiter should observe the abandoned refresh.");

	assert!(matches!(err, Error::Session(SessionError::Interrupted)));
	assert!(!coordinator.is_refreshing());
	assert_eq!(harness.listener.count(), 0);

	harness.service.open_gate();

	let response = harness
		.client
		.send(ApiRequest::get("/api/c"))
		.await
		.expect("A later request should refresh normally.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(harness.stored_pair().await, (Some("T2".into()), Some("R2".into())));
}

#[tokio::test]
async fn already_rotated_token_is_returned_without_exchange() {
	let harness = Harness::new(
		Some("T2"),
		Some("R2"),
		"T2",
		RefreshReply::Rotate { access: "T3", refresh: "R3" },
	)
	.await;
	let coordinator = harness.client.coordinator();
	let token = coordinator
		.ensure_fresh_token(Some(&AccessToken::new("T1")))
		.await
		.expect("Stale rejection should resolve to the stored token.");

	assert_eq!(token.expose(), "T2");
	assert_eq!(harness.service.refresh_calls(), 0);
	assert_eq!(coordinator.metrics().attempts(), 1);
	assert_eq!(coordinator.metrics().exchanges(), 0);

	harness.service.open_gate();

	let token = coordinator
		.ensure_fresh_token(Some(&AccessToken::new("T2")))
		.await
		.expect("Rejection of the current token should refresh.");

	assert_eq!(token.expose(), "T3");
	assert_eq!(harness.service.refresh_calls(), 1);
	assert_eq!(harness.stored_pair().await, (Some("T3".into()), Some("R3".into())));
}

#[tokio::test]
async fn second_unauthorized_after_refresh_purges_session() {
	let harness = Harness::new(
		Some("T1"),
		Some("R1"),
		"T2",
		RefreshReply::Rotate { access: "T2", refresh: "R2" },
	)
	.await;

	harness.service.open_gate();

	let err = harness
		.client
		.send(ApiRequest::get(ALWAYS_UNAUTHORIZED_PATH))
		.await
		.expect_err("A second 401 should end the session.");

	assert!(matches!(err, Error::Session(SessionError::Unauthorized)));
	assert_eq!(harness.service.refresh_calls(), 1);
	assert_eq!(harness.stored_pair().await, (None, None));
	assert_eq!(harness.listener.count(), 1);

	let seen = harness.service.seen();

	assert_eq!(seen.len(), 2);
	assert!(seen.iter().all(|s| s.path == ALWAYS_UNAUTHORIZED_PATH));
	assert_eq!(seen[1].authorization.as_deref(), Some("Bearer T2"));
}

#[tokio::test]
async fn public_requests_never_refresh() {
	let harness = Harness::new(
		Some("T1"),
		Some("R1"),
		"T2",
		RefreshReply::Rotate { access: "T2", refresh: "R2" },
	)
	.await;
	let response = harness
		.client
		.send(ApiRequest::post("/api/auth/login").public())
		.await
		.expect("Public 401 should pass through.");

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(harness.service.refresh_calls(), 0);
	assert_eq!(harness.service.seen()[0].authorization, None);
	assert_eq!(harness.stored_pair().await, (Some("T1".into()), Some("R1".into())));
}

#[tokio::test]
async fn non_unauthorized_errors_pass_through_untouched() {
	let harness = Harness::new(
		Some("T2"),
		Some("R2"),
		"T2",
		RefreshReply::Rotate { access: "T3", refresh: "R3" },
	)
	.await;
	let response = harness
		.client
		.send(ApiRequest::get(BROKEN_PATH))
		.await
		.expect("Server errors are responses, not dispatcher failures.");

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(response.body(), br#"{"message":"database offline"}"#);
	assert_eq!(harness.service.refresh_calls(), 0);
	assert_eq!(harness.service.seen().len(), 1);
}

#[tokio::test]
async fn request_without_stored_token_recovers_through_refresh() {
	let harness = Harness::new(
		None,
		Some("R1"),
		"T2",
		RefreshReply::Rotate { access: "T2", refresh: "R2" },
	)
	.await;

	harness.service.open_gate();

	let response = harness
		.client
		.send(ApiRequest::get("/api/a"))
		.await
		.expect("Refresh should recover a request sent without a token.");
	let seen = harness.service.seen();

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(seen[0].authorization, None);
	assert_eq!(seen[1].authorization.as_deref(), Some("Bearer T2"));
}
