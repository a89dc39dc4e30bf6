//! OS keyring [`SecureSlotBackend`] (macOS Keychain, Windows Credential Manager, Secret
//! Service on Linux).

// crates.io
use ::keyring::{Entry, Error as KeyringError};
// self
use crate::{
	_prelude::*,
	store::{SecureSlotBackend, SlotBackend, StoreError, StoreFuture},
};

/// Keyring-backed slots. Each slot is a keyring service; the account name is shared.
#[derive(Clone, Debug)]
pub struct KeyringBackend {
	account: String,
}
impl KeyringBackend {
	const DEFAULT_ACCOUNT: &'static str = "callshield";

	/// Creates a backend that stores every slot under the provided account name.
	pub fn new(account: impl Into<String>) -> Self {
		Self { account: account.into() }
	}

	fn entry(&self, slot: &str) -> Result<Entry, StoreError> {
		Entry::new(slot, &self.account).map_err(|e| StoreError::Backend {
			message: format!("Failed to open keyring entry {slot}: {e}"),
		})
	}
}
impl Default for KeyringBackend {
	fn default() -> Self {
		Self::new(Self::DEFAULT_ACCOUNT)
	}
}
impl SlotBackend for KeyringBackend {
	fn load<'a>(&'a self, slot: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move {
			match self.entry(slot)?.get_password() {
				Ok(value) => Ok(Some(value)),
				Err(KeyringError::NoEntry) => Ok(None),
				Err(e) => Err(StoreError::Backend {
					message: format!("Failed to read keyring entry {slot}: {e}"),
				}),
			}
		})
	}

	fn save<'a>(&'a self, slot: &'a str, value: String) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.entry(slot)?.set_password(&value).map_err(|e| StoreError::Backend {
				message: format!("Failed to write keyring entry {slot}: {e}"),
			})
		})
	}

	fn remove<'a>(&'a self, slot: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			match self.entry(slot)?.delete_credential() {
				Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
				Err(e) => Err(StoreError::Backend {
					message: format!("Failed to delete keyring entry {slot}: {e}"),
				}),
			}
		})
	}
}
impl SecureSlotBackend for KeyringBackend {}
