// self
use crate::{
	dispatch::RequestAuth,
	obs::{FlowKind, FlowOutcome},
};

/// Route a dispatched request took through 401 recovery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchPath {
	/// Answered on the first attempt, or never eligible for recovery.
	Direct,
	/// Rejected once, then resent with a renewed access token.
	Retried,
	/// Still unauthorized after the resend; the session was purged.
	Expired,
}
impl DispatchPath {
	/// Returns a stable label suitable for metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			DispatchPath::Direct => "direct",
			DispatchPath::Retried => "retried",
			DispatchPath::Expired => "expired",
		}
	}
}

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"callshield_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts dispatched requests by auth mode and recovery path (when enabled).
///
/// Requests that never reach the service (transport or store failures) are not counted.
pub fn record_dispatch_path(auth: RequestAuth, path: DispatchPath) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"callshield_dispatch_total",
			"auth" => auth.as_str(),
			"path" => path.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (auth, path);
	}
}
