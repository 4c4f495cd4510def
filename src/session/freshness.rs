//! Expiry and refresh-window classification for stored records.

// self
use crate::{_prelude::*, session::record::SessionRecord};

/// How to treat records that carry no expiry instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingExpiry {
	/// The record never expires and never becomes refresh-eligible.
	#[default]
	NeverExpires,
	/// The record is unusable until the provider supplies an expiry.
	TreatAsExpired,
}

/// Freshness of a stored record at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenFreshness {
	/// Usable, with comfortable remaining lifetime.
	Valid,
	/// Usable, but close enough to expiry that renewal should start.
	NeedsRefresh,
	/// Past its expiry instant; must not be attached to requests.
	Expired,
}
impl TokenFreshness {
	/// Static label used in metrics and spans.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::Valid => "valid",
			Self::NeedsRefresh => "needs_refresh",
			Self::Expired => "expired",
		}
	}
}
impl Display for TokenFreshness {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Pure classification policy applied to stored records.
///
/// The policy never consults the record's `active` flag; only the expiry
/// instant and the configured window matter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessPolicy {
	/// Remaining lifetime below which renewal should start.
	pub refresh_window: Duration,
	/// Behavior for records without an expiry instant.
	pub missing_expiry: MissingExpiry,
}
impl FreshnessPolicy {
	/// Default remaining lifetime that triggers a refresh demand.
	pub const DEFAULT_REFRESH_WINDOW: Duration = Duration::minutes(15);

	/// Builds a policy from explicit parts.
	pub const fn new(refresh_window: Duration, missing_expiry: MissingExpiry) -> Self {
		Self { refresh_window, missing_expiry }
	}

	/// Classifies a record at the provided instant.
	///
	/// A record expires the moment `now` reaches `expires_at`; it needs a
	/// refresh while the remaining lifetime is strictly below the window.
	pub fn classify(&self, record: &SessionRecord, now: OffsetDateTime) -> TokenFreshness {
		let Some(expires_at) = record.expires_at else {
			return match self.missing_expiry {
				MissingExpiry::NeverExpires => TokenFreshness::Valid,
				MissingExpiry::TreatAsExpired => TokenFreshness::Expired,
			};
		};

		if now >= expires_at {
			return TokenFreshness::Expired;
		}
		if expires_at - now < self.refresh_window {
			return TokenFreshness::NeedsRefresh;
		}

		TokenFreshness::Valid
	}
}
impl Default for FreshnessPolicy {
	fn default() -> Self {
		Self::new(Self::DEFAULT_REFRESH_WINDOW, MissingExpiry::NeverExpires)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::ids::SubjectId;

	const NOW: OffsetDateTime = macros::datetime!(2025-06-01 12:00 UTC);

	fn record_expiring_at(expires_at: Option<OffsetDateTime>) -> SessionRecord {
		let builder = SessionRecord::builder(
			SubjectId::new("u1").expect("Subject fixture should be valid."),
		)
		.token("tok123");
		let builder = match expires_at {
			Some(instant) => builder.expires_at(instant),
			None => builder,
		};

		builder.build().expect("Record fixture should build successfully.")
	}

	#[test]
	fn classification_tracks_the_expiry_instant() {
		let policy = FreshnessPolicy::default();

		assert_eq!(
			policy.classify(&record_expiring_at(Some(NOW + Duration::hours(1))), NOW),
			TokenFreshness::Valid,
		);
		assert_eq!(
			policy.classify(&record_expiring_at(Some(NOW - Duration::seconds(1))), NOW),
			TokenFreshness::Expired,
		);
		assert_eq!(
			policy.classify(&record_expiring_at(Some(NOW)), NOW),
			TokenFreshness::Expired,
			"A record expires the moment the clock reaches its expiry.",
		);
	}

	#[test]
	fn refresh_window_boundary_is_strict() {
		let policy = FreshnessPolicy::default();
		let window = FreshnessPolicy::DEFAULT_REFRESH_WINDOW;

		assert_eq!(
			policy.classify(&record_expiring_at(Some(NOW + window - Duration::seconds(1))), NOW),
			TokenFreshness::NeedsRefresh,
		);
		assert_eq!(
			policy.classify(&record_expiring_at(Some(NOW + window)), NOW),
			TokenFreshness::Valid,
			"Remaining lifetime equal to the window is still comfortable.",
		);
		assert_eq!(
			policy.classify(&record_expiring_at(Some(NOW + window + Duration::seconds(1))), NOW),
			TokenFreshness::Valid,
		);
	}

	#[test]
	fn missing_expiry_follows_the_configured_behavior() {
		let lenient = FreshnessPolicy::default();
		let strict = FreshnessPolicy::new(
			FreshnessPolicy::DEFAULT_REFRESH_WINDOW,
			MissingExpiry::TreatAsExpired,
		);
		let record = record_expiring_at(None);

		assert_eq!(lenient.classify(&record, NOW), TokenFreshness::Valid);
		assert_eq!(strict.classify(&record, NOW), TokenFreshness::Expired);
	}

	#[test]
	fn active_flag_does_not_influence_classification() {
		let policy = FreshnessPolicy::default();
		let mut record = record_expiring_at(Some(NOW + Duration::hours(1)));

		record.active = false;

		assert_eq!(policy.classify(&record, NOW), TokenFreshness::Valid);
	}
}
