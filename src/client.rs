//! [`ApiClient`] facade that owns the transport, credential store, refresh coordinator,
//! and dispatcher, and exposes every domain call as a method.

// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	coordinator::{NoopSessionListener, RefreshCoordinator, RefreshMetrics, SessionListener},
	dispatch::{ApiRequest, ApiResponse, Dispatcher},
	http::ApiHttpClient,
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Client type backed by the default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestApiClient = ApiClient<ReqwestHttpClient>;

/// Session-aware client for the CallShield service.
///
/// One instance owns one [`RefreshCoordinator`]; clone the surrounding `Arc` rather than
/// building a second client over the same store, otherwise two coordinators could refresh
/// concurrently.
pub struct ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	config: Arc<ClientConfig>,
	store: Arc<CredentialStore>,
	http_client: Arc<C>,
	coordinator: Arc<RefreshCoordinator<C>>,
	dispatcher: Dispatcher<C>,
}
impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a client over a caller-provided transport.
	pub fn with_http_client(
		config: ClientConfig,
		store: impl Into<Arc<CredentialStore>>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self::assemble(
			Arc::new(config),
			store.into(),
			http_client.into(),
			Arc::new(NoopSessionListener),
		)
	}

	/// Replaces the session-expired listener.
	///
	/// Must be called before the client is shared; the coordinator is rebuilt idle.
	pub fn with_session_listener(self, listener: Arc<dyn SessionListener>) -> Self {
		Self::assemble(self.config, self.store, self.http_client, listener)
	}

	fn assemble(
		config: Arc<ClientConfig>,
		store: Arc<CredentialStore>,
		http_client: Arc<C>,
		listener: Arc<dyn SessionListener>,
	) -> Self {
		let coordinator = Arc::new(RefreshCoordinator::new(
			http_client.clone(),
			config.clone(),
			store.clone(),
			listener,
		));
		let dispatcher = Dispatcher::new(
			http_client.clone(),
			config.clone(),
			store.clone(),
			coordinator.clone(),
		);

		Self { config, store, http_client, coordinator, dispatcher }
	}

	/// Connection settings.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Credential store shared with the coordinator.
	pub fn store(&self) -> &Arc<CredentialStore> {
		&self.store
	}

	/// Refresh coordinator.
	pub fn coordinator(&self) -> &RefreshCoordinator<C> {
		&self.coordinator
	}

	/// Request dispatcher.
	pub fn dispatcher(&self) -> &Dispatcher<C> {
		&self.dispatcher
	}

	/// Refresh counters.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		self.coordinator.metrics()
	}

	/// Sends a raw request through the dispatcher; non-2xx responses are returned as `Ok`.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		self.dispatcher.send(request).await
	}

	pub(crate) async fn fetch<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.send(request).await?.error_for_status()?;

		Ok(response.json()?)
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestHttpClient> {
	/// Creates a client with a reqwest transport configured from `config`.
	pub fn new(config: ClientConfig, store: impl Into<Arc<CredentialStore>>) -> Result<Self> {
		let http_client = ReqwestHttpClient::from_config(&config)?;

		Ok(Self::with_http_client(config, store, http_client))
	}

	/// Creates a reqwest-backed client whose credentials live only in memory.
	pub fn in_memory(config: ClientConfig) -> Result<Self> {
		Self::new(config, CredentialStore::in_memory())
	}
}
impl<C> Debug for ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("config", &self.config)
			.field("store", &self.store)
			.field("coordinator", &self.coordinator)
			.finish()
	}
}
