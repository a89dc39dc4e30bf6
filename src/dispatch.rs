//! Single entry point for outbound service calls.
//!
//! [`Dispatcher::send`] attaches the stored access token to bearer requests, passes every
//! non-401 response back untouched, and recovers from a first 401 by asking the
//! [`RefreshCoordinator`] for a fresh token and resending once. The retry is structural:
//! the resend happens on a separate code path that never re-enters recovery.

mod request;

pub use request::*;

// std
use std::{borrow::Borrow, future};
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	config::ClientConfig,
	coordinator::RefreshCoordinator,
	error::SessionError,
	http::ApiHttpClient,
	obs::{self, DispatchPath, FlowKind, FlowOutcome, FlowSpan},
	store::CredentialStore,
};

/// Sends [`ApiRequest`]s with bearer attachment and one-shot 401 recovery.
pub struct Dispatcher<C>
where
	C: ?Sized + ApiHttpClient,
{
	http_client: Arc<C>,
	config: Arc<ClientConfig>,
	store: Arc<CredentialStore>,
	coordinator: Arc<RefreshCoordinator<C>>,
}
impl<C> Dispatcher<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a dispatcher that shares the coordinator's store and transport.
	pub fn new(
		http_client: Arc<C>,
		config: Arc<ClientConfig>,
		store: Arc<CredentialStore>,
		coordinator: Arc<RefreshCoordinator<C>>,
	) -> Self {
		Self { http_client, config, store, coordinator }
	}

	/// Sends `request` and returns the service response.
	///
	/// Non-2xx statuses are returned as `Ok`; only a bearer request that stays unauthorized
	/// after recovery turns into [`Error::Session`]. Transport failures are returned as
	/// [`Error::Transport`] without retrying.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		self.send_rebuilt(|| future::ready(Ok(&request))).await
	}

	/// Like [`send`](Self::send), but calls `build` before each attempt.
	///
	/// The resend after a refresh carries whatever `build` reads once the rotated tokens are
	/// stored, so a body that embeds credential state never goes out stale.
	pub async fn send_rebuilt<F, Fut, R>(&self, build: F) -> Result<ApiResponse>
	where
		F: Fn() -> Fut,
		Fut: Future<Output = Result<R>>,
		R: Borrow<ApiRequest>,
	{
		const KIND: FlowKind = FlowKind::Dispatch;

		let built = build().await?;
		let request: &ApiRequest = built.borrow();
		let span = FlowSpan::new(KIND, request.auth.as_str());

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.send_with_recovery(request, &build)).await;

		obs::record_flow_outcome(
			KIND,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}

	async fn send_with_recovery<F, Fut, R>(
		&self,
		request: &ApiRequest,
		build: &F,
	) -> Result<ApiResponse>
	where
		F: Fn() -> Fut,
		Fut: Future<Output = Result<R>>,
		R: Borrow<ApiRequest>,
	{
		let auth = request.auth;

		if !auth.is_bearer() {
			obs::record_dispatch_path(auth, DispatchPath::Direct);

			return self.send_once(request, None).await;
		}

		let token = self.store.get_access().await?;
		let response = self.send_once(request, token.as_ref()).await?;

		if !response.is_unauthorized() {
			obs::record_dispatch_path(auth, DispatchPath::Direct);

			return Ok(response);
		}

		let renewed = self.coordinator.ensure_fresh_token(token.as_ref()).await?;
		let rebuilt = build().await?;
		let retried = self.send_once(rebuilt.borrow(), Some(&renewed)).await?;

		if retried.is_unauthorized() {
			obs::record_dispatch_path(auth, DispatchPath::Expired);

			return Err(self.coordinator.expire_session(SessionError::Unauthorized).await.into());
		}

		obs::record_dispatch_path(auth, DispatchPath::Retried);

		Ok(retried)
	}

	async fn send_once(
		&self,
		request: &ApiRequest,
		bearer: Option<&AccessToken>,
	) -> Result<ApiResponse> {
		let http_request = request.to_http(&self.config.base_url, bearer)?;
		let response = self.http_client.execute(http_request).await?;

		Ok(ApiResponse::from_http(request.label(), response))
	}
}
impl<C> Debug for Dispatcher<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("base_url", &self.config.base_url.as_str())
			.field("coordinator", &self.coordinator)
			.finish()
	}
}
