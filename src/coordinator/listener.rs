//! Session-expired notification seam consumed by the UI layer.

// self
use crate::{_prelude::*, error::SessionError};

/// Receives the session-expired signal after credentials have been purged.
///
/// The UI typically resets navigation to its login surface here. Called once per failed
/// refresh cycle (not once per waiting request) and once per request rejected again after
/// a successful refresh.
pub trait SessionListener
where
	Self: Send + Sync,
{
	/// Invoked after the local credential purge completed (or failed and was logged).
	fn session_expired(&self, reason: &SessionError);
}

/// Listener that ignores the signal.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSessionListener;
impl SessionListener for NoopSessionListener {
	fn session_expired(&self, _: &SessionError) {}
}

/// Adapts a closure into a [`SessionListener`].
pub struct FnSessionListener<F>(pub F);
impl<F> SessionListener for FnSessionListener<F>
where
	F: Fn(&SessionError) + Send + Sync,
{
	fn session_expired(&self, reason: &SessionError) {
		(self.0)(reason)
	}
}
impl<F> Debug for FnSessionListener<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnSessionListener(..)")
	}
}
