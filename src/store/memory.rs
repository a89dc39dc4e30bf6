//! Thread-safe in-memory [`SlotBackend`] for tests and demos.

// self
use crate::{
	_prelude::*,
	store::{SecureSlotBackend, SlotBackend, StoreError, StoreFuture},
};

type SlotMap = Arc<RwLock<HashMap<String, String>>>;

/// Storage backend that keeps slots in-process.
///
/// Nothing is ever written to disk, so it also qualifies as a secure backend for tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend(SlotMap);
impl MemoryBackend {
	/// Copies the current slot contents.
	pub fn snapshot(&self) -> HashMap<String, String> {
		self.0.read().clone()
	}

	fn save_now(map: SlotMap, slot: &str, value: String) -> Result<(), StoreError> {
		map.write().insert(slot.to_owned(), value);

		Ok(())
	}
}
impl SlotBackend for MemoryBackend {
	fn load<'a>(&'a self, slot: &'a str) -> StoreFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(slot).cloned()) })
	}

	fn save<'a>(&'a self, slot: &'a str, value: String) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(map, slot, value) })
	}

	fn remove<'a>(&'a self, slot: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().remove(slot);

			Ok(())
		})
	}
}
impl SecureSlotBackend for MemoryBackend {}
