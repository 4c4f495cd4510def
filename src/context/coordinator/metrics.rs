// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for relay activity.
#[derive(Debug, Default)]
pub struct RelayMetrics {
	logins: AtomicU64,
	logouts: AtomicU64,
	rejected_payloads: AtomicU64,
	refresh_demands: AtomicU64,
}
impl RelayMetrics {
	/// Returns the number of logins persisted and announced.
	pub fn logins(&self) -> u64 {
		self.logins.load(Ordering::Relaxed)
	}

	/// Returns the number of logouts persisted and announced.
	pub fn logouts(&self) -> u64 {
		self.logouts.load(Ordering::Relaxed)
	}

	/// Returns the number of login reports refused during validation.
	pub fn rejected_payloads(&self) -> u64 {
		self.rejected_payloads.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh demands raised for aging credentials.
	pub fn refresh_demands(&self) -> u64 {
		self.refresh_demands.load(Ordering::Relaxed)
	}

	pub(crate) fn record_login(&self) {
		self.logins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_logout(&self) {
		self.logouts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rejected_payload(&self) {
		self.rejected_payloads.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_demand(&self) {
		self.refresh_demands.fetch_add(1, Ordering::Relaxed);
	}
}
