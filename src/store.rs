//! Credential store contracts and built-in slot backends.
//!
//! The access token and the refresh token live in different compartments. The access
//! token goes to a plain [`SlotBackend`] (preferences-style key-value storage), while the
//! refresh token can only be handed to a [`SecureSlotBackend`] (OS keychain or an
//! equivalent protected primitive). [`CredentialStore`] is the single source of truth for
//! both; nothing else in the crate keeps a token longer than one dispatched request.

pub mod file;
#[cfg(feature = "keyring")] pub mod keychain;
pub mod memory;

#[cfg(feature = "keyring")] pub use keychain::KeyringBackend;
pub use file::FileBackend;
pub use memory::MemoryBackend;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AuthSession, RefreshToken},
};

/// Slot holding the access token in the plain backend.
pub const ACCESS_TOKEN_SLOT: &str = "userToken";
/// Slot holding the refresh token in the secure backend.
pub const REFRESH_TOKEN_SLOT: &str = "refreshTokenService";

/// Boxed future returned by slot backends.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Single-value storage primitive addressed by a fixed slot name.
pub trait SlotBackend
where
	Self: Send + Sync,
{
	/// Reads the slot; an empty slot is `Ok(None)`, never an error.
	fn load<'a>(&'a self, slot: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Overwrites the slot unconditionally.
	fn save<'a>(&'a self, slot: &'a str, value: String) -> StoreFuture<'a, ()>;

	/// Clears the slot. Clearing an empty slot succeeds.
	fn remove<'a>(&'a self, slot: &'a str) -> StoreFuture<'a, ()>;
}

/// Marker for backends that use the most protected storage primitive of the platform.
///
/// Only these backends may hold refresh tokens.
pub trait SecureSlotBackend: SlotBackend {}

/// Error type produced by slot backends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Access/refresh token store over split backends.
pub struct CredentialStore {
	plain: Arc<dyn SlotBackend>,
	secure: Arc<dyn SecureSlotBackend>,
	// Serializes mutations so a purge never interleaves with a session rotation.
	write_gate: AsyncMutex<()>,
}
impl CredentialStore {
	/// Creates a store that keeps the access token in `plain` and the refresh token in
	/// `secure`.
	pub fn new(plain: Arc<dyn SlotBackend>, secure: Arc<dyn SecureSlotBackend>) -> Self {
		Self { plain, secure, write_gate: AsyncMutex::new(()) }
	}

	/// Creates a store backed by two independent in-memory backends.
	pub fn in_memory() -> Self {
		Self::new(Arc::new(MemoryBackend::default()), Arc::new(MemoryBackend::default()))
	}

	/// Returns the stored access token, if any.
	pub async fn get_access(&self) -> Result<Option<AccessToken>, StoreError> {
		Ok(self.plain.load(ACCESS_TOKEN_SLOT).await?.map(AccessToken::new))
	}

	/// Returns the stored refresh token, if any.
	pub async fn get_refresh(&self) -> Result<Option<RefreshToken>, StoreError> {
		Ok(self.secure.load(REFRESH_TOKEN_SLOT).await?.map(RefreshToken::new))
	}

	/// Overwrites the access token.
	pub async fn store_access(&self, token: &AccessToken) -> Result<(), StoreError> {
		let _gate = self.write_gate.lock().await;

		self.plain.save(ACCESS_TOKEN_SLOT, token.expose().to_owned()).await
	}

	/// Overwrites the refresh token.
	pub async fn store_refresh(&self, token: &RefreshToken) -> Result<(), StoreError> {
		let _gate = self.write_gate.lock().await;

		self.secure.save(REFRESH_TOKEN_SLOT, token.expose().to_owned()).await
	}

	/// Writes both tokens of a freshly issued session, access token first.
	pub async fn store_session(&self, session: &AuthSession) -> Result<(), StoreError> {
		let _gate = self.write_gate.lock().await;

		self.plain.save(ACCESS_TOKEN_SLOT, session.access_token.expose().to_owned()).await?;
		self.secure.save(REFRESH_TOKEN_SLOT, session.refresh_token.expose().to_owned()).await
	}

	/// Removes both tokens. Succeeds when either or both are already absent.
	///
	/// Both slots are always attempted; the first failure is reported.
	pub async fn clear_all(&self) -> Result<(), StoreError> {
		let _gate = self.write_gate.lock().await;
		let access = self.plain.remove(ACCESS_TOKEN_SLOT).await;
		let refresh = self.secure.remove(REFRESH_TOKEN_SLOT).await;

		access.and(refresh)
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("CredentialStore(..)")
	}
}
