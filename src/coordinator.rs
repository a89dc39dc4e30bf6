//! Refresh-token orchestration with a single in-flight exchange and fan-out delivery.
//!
//! [`RefreshCoordinator::ensure_fresh_token`] is called by the dispatcher after a 401. The
//! first caller flips the coordinator from idle to refreshing and leads the cycle; callers
//! that arrive while a cycle is running park on a one-shot channel and receive the very
//! same outcome. A cycle either rotates both tokens in the [`CredentialStore`] and then
//! releases every waiter with the new access token, or purges the store, fires the
//! [`SessionListener`], and rejects every waiter with the same [`SessionError`].
//!
//! The refresh exchange goes straight to the transport, so a 401 from the refresh endpoint
//! can never re-enter the dispatcher's recovery path.

mod listener;
mod metrics;

pub use listener::*;
pub use metrics::RefreshMetrics;

// std
use std::mem;
// crates.io
use futures::channel::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AuthSession, RefreshToken},
	config::ClientConfig,
	dispatch::{ApiRequest, ApiResponse},
	error::{self, SessionError},
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::CredentialStore,
};

/// Path of the refresh-token exchange.
pub const REFRESH_TOKEN_PATH: &str = "/api/auth/refresh-token";

type RefreshOutcome = Result<AccessToken, SessionError>;
type Waiter = oneshot::Sender<RefreshOutcome>;

enum RefreshState {
	Idle,
	Refreshing { waiters: Vec<Waiter> },
}

/// `{refreshToken}` body shared by the refresh and logout endpoints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshTokenBody<'a> {
	pub(crate) refresh_token: &'a str,
}

/// Coordinates refresh cycles for one credential store.
pub struct RefreshCoordinator<C>
where
	C: ?Sized + ApiHttpClient,
{
	http_client: Arc<C>,
	config: Arc<ClientConfig>,
	store: Arc<CredentialStore>,
	listener: Arc<dyn SessionListener>,
	metrics: RefreshMetrics,
	state: Mutex<RefreshState>,
}
impl<C> RefreshCoordinator<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates an idle coordinator.
	pub fn new(
		http_client: Arc<C>,
		config: Arc<ClientConfig>,
		store: Arc<CredentialStore>,
		listener: Arc<dyn SessionListener>,
	) -> Self {
		Self {
			http_client,
			config,
			store,
			listener,
			metrics: RefreshMetrics::default(),
			state: Mutex::new(RefreshState::Idle),
		}
	}

	/// Counters for led cycles, exchanges, and outcomes.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Whether a refresh cycle is in flight.
	pub fn is_refreshing(&self) -> bool {
		matches!(*self.state.lock(), RefreshState::Refreshing { .. })
	}

	/// Number of callers parked behind the in-flight cycle.
	pub fn waiting(&self) -> usize {
		match &*self.state.lock() {
			RefreshState::Refreshing { waiters } => waiters.len(),
			RefreshState::Idle => 0,
		}
	}

	/// Returns an access token that is newer than `rejected`, refreshing at most once
	/// across all concurrent callers.
	///
	/// `rejected` is the token the caller's request was refused with (`None` when the
	/// request went out without one). If the store already holds a different access token,
	/// another cycle finished in the meantime and that token is returned without an
	/// exchange.
	pub async fn ensure_fresh_token(
		&self,
		rejected: Option<&AccessToken>,
	) -> Result<AccessToken, SessionError> {
		const KIND: FlowKind = FlowKind::Refresh;

		let parked = {
			let mut state = self.state.lock();

			if let RefreshState::Refreshing { waiters } = &mut *state {
				let (tx, rx) = oneshot::channel();

				waiters.push(tx);

				Some(rx)
			} else {
				*state = RefreshState::Refreshing { waiters: Vec::new() };

				None
			}
		};

		if let Some(rx) = parked {
			return rx.await.unwrap_or(Err(SessionError::Interrupted));
		}

		let flight = InFlight { state: &self.state, armed: true };
		let span = FlowSpan::new(KIND, "ensure_fresh_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_attempt();

		let outcome = span.instrument(self.lead(rejected)).await;

		match &outcome {
			Ok(_) => {
				self.metrics.record_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(_) => {
				self.metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		flight.settle(&outcome);

		outcome
	}

	/// Purges both tokens and fires the session-expired signal.
	///
	/// A purge failure is logged; the signal fires regardless and `reason` is handed back
	/// for propagation.
	pub async fn expire_session(&self, reason: SessionError) -> SessionError {
		if let Err(e) = self.store.clear_all().await {
			obs::warn_event(FlowKind::Refresh, "Credential purge failed after session loss.", &e);
		}

		obs::warn_event(FlowKind::Refresh, "Session expired.", &reason);
		self.listener.session_expired(&reason);

		reason
	}

	async fn lead(&self, rejected: Option<&AccessToken>) -> RefreshOutcome {
		let refresh_token = match self.store.get_refresh().await {
			Ok(Some(token)) => token,
			Ok(None) => return Err(self.expire_session(SessionError::MissingRefreshToken).await),
			Err(e) => return Err(self.expire_session(SessionError::Storage(e)).await),
		};

		match self.store.get_access().await {
			Ok(Some(current)) if rejected != Some(&current) => {
				obs::debug_event(
					FlowKind::Refresh,
					"Access token already rotated; exchange skipped.",
				);

				return Ok(current);
			},
			Ok(_) => {},
			Err(e) => return Err(self.expire_session(SessionError::Storage(e)).await),
		}

		let session = match self.exchange(&refresh_token).await {
			Ok(session) => session,
			Err(e) => return Err(self.expire_session(e).await),
		};

		// Waiters are released only after both slots hold the rotated pair.
		if let Err(e) = self.store.store_session(&session).await {
			return Err(self.expire_session(SessionError::Storage(e)).await);
		}

		obs::debug_event(FlowKind::Refresh, "Refresh settled with rotated credentials.");

		Ok(session.access_token)
	}

	async fn exchange(&self, refresh_token: &RefreshToken) -> Result<AuthSession, SessionError> {
		let transport =
			|e: &dyn StdError| SessionError::Transport { message: error::render_chain(e) };
		let request = ApiRequest::post(REFRESH_TOKEN_PATH)
			.refresh_exchange()
			.json(&RefreshTokenBody { refresh_token: refresh_token.expose() })
			.map_err(|e| transport(&e))?;
		let http_request =
			request.to_http(&self.config.base_url, None).map_err(|e| transport(&e))?;

		self.metrics.record_exchange();

		let response =
			self.http_client.execute(http_request).await.map_err(|e| transport(&e))?;
		let response = ApiResponse::from_http(request.label(), response);

		if !response.is_success() {
			return Err(SessionError::Rejected { status: response.status().as_u16() });
		}

		response
			.json::<AuthSession>()
			.map_err(|e| SessionError::Decode { message: error::render_chain(&e) })
	}
}
impl<C> Debug for RefreshCoordinator<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("refreshing", &self.is_refreshing())
			.field("waiting", &self.waiting())
			.finish()
	}
}

// Returns the coordinator to idle on every exit path of the leading caller. Dropping it
// armed (the leading future was cancelled) closes every waiter's channel, which they
// observe as `SessionError::Interrupted`.
struct InFlight<'a> {
	state: &'a Mutex<RefreshState>,
	armed: bool,
}
impl InFlight<'_> {
	fn take_waiters(&self) -> Vec<Waiter> {
		match mem::replace(&mut *self.state.lock(), RefreshState::Idle) {
			RefreshState::Refreshing { waiters } => waiters,
			RefreshState::Idle => Vec::new(),
		}
	}

	fn settle(mut self, outcome: &RefreshOutcome) {
		self.armed = false;

		for waiter in self.take_waiters() {
			// A waiter whose request was cancelled has dropped its receiver.
			let _ = waiter.send(outcome.clone());
		}
	}
}
impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		if self.armed {
			drop(self.take_waiters());
		}
	}
}
