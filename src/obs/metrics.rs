// self
use crate::obs::{SyncKind, SyncOutcome};

/// Records a sync outcome via the global metrics recorder (when enabled).
pub fn record_sync_outcome(kind: SyncKind, outcome: SyncOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"auth_relay_sync_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_sync_outcome_noop_without_metrics() {
		record_sync_outcome(SyncKind::Login, SyncOutcome::Failure);
	}
}
