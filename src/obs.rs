//! Optional observability helpers for relay stages.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run each stage inside a span named `oauth2_relay.stage`
//!   with the `stage` field identifying the relay phase.
//! - Enable `metrics` to increment the `oauth2_relay_stage_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`.

// self
use crate::_prelude::*;

/// Relay phases observed per request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
	/// Bearer extraction plus external token validation.
	Authenticate,
	/// Credential derivation for the downstream audience.
	Exchange,
	/// The single downstream resource call.
	Invoke,
}
impl StageKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageKind::Authenticate => "authenticate",
			StageKind::Exchange => "exchange",
			StageKind::Invoke => "invoke",
		}
	}
}
impl Display for StageKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a relay stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_stage_outcome(kind: StageKind, outcome: StageOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_relay_stage_total",
			"stage" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Runs one relay stage with attempt/success/failure accounting.
///
/// The future is awaited inside a stage span when tracing is enabled; without the
/// features this is a plain passthrough.
pub async fn observe<T>(kind: StageKind, fut: impl Future<Output = Result<T>>) -> Result<T> {
	record_stage_outcome(kind, StageOutcome::Attempt);

	#[cfg(feature = "tracing")]
	let fut = {
		use tracing::Instrument;

		fut.instrument(tracing::info_span!("oauth2_relay.stage", stage = kind.as_str()))
	};

	let result = fut.await;

	match &result {
		Ok(_) => record_stage_outcome(kind, StageOutcome::Success),
		Err(_) => record_stage_outcome(kind, StageOutcome::Failure),
	}

	result
}
