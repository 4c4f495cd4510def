//! Provider profile and relay configuration consumed by every context.

// self
use crate::{_prelude::*, error::ConfigError, session::FreshnessPolicy};

const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "[::1]"];

/// Errors raised while constructing or validating provider profiles.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProfileError {
	/// The provider origin must use HTTPS; plain HTTP is allowed for local
	/// development hosts only.
	#[error("The provider origin must use HTTPS: {url}.")]
	InsecureOrigin {
		/// Origin URL that failed validation.
		url: String,
	},
	/// The provider origin must carry a host component.
	#[error("The provider origin is missing a host: {url}.")]
	MissingHost {
		/// Origin URL that failed validation.
		url: String,
	},
	/// The observed session-storage key cannot be empty.
	#[error("The observed session key cannot be empty.")]
	EmptySessionKey,
	/// The automation service base must use HTTPS as well.
	#[error("The API base must use HTTPS: {url}.")]
	InsecureApiBase {
		/// API base URL that failed validation.
		url: String,
	},
}

/// Immutable description of the identity-provider site a relay observes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
	/// Provider site origin; window messages and tab forwarding are restricted
	/// to it.
	pub origin: Url,
	/// Session-storage key observed and mirrored on provider pages.
	pub session_key: String,
	/// Optional base URL of the automation service called through the gate.
	pub api_base: Option<Url>,
}
impl ProviderProfile {
	/// Creates a new builder seeded with the provider origin.
	pub fn builder(origin: Url) -> ProviderProfileBuilder {
		ProviderProfileBuilder::new(origin)
	}

	/// Canonical origin compared against inbound window messages.
	pub fn trusted_origin(&self) -> url::Origin {
		self.origin.origin()
	}

	/// Host component of the provider origin.
	pub fn host(&self) -> &str {
		self.origin.host_str().unwrap_or_default()
	}
}

/// Builder for [`ProviderProfile`] values.
#[derive(Debug)]
pub struct ProviderProfileBuilder {
	/// Provider site origin.
	pub origin: Url,
	/// Observed session-storage key.
	pub session_key: Option<String>,
	/// Optional automation service base URL.
	pub api_base: Option<Url>,
}
impl ProviderProfileBuilder {
	fn new(origin: Url) -> Self {
		Self { origin, session_key: None, api_base: None }
	}

	/// Sets the observed session-storage key.
	pub fn session_key(mut self, key: impl Into<String>) -> Self {
		self.session_key = Some(key.into());

		self
	}

	/// Sets the automation service base URL.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting profile.
	pub fn build(self) -> Result<ProviderProfile, ProfileError> {
		let session_key = self.session_key.unwrap_or_default();

		if session_key.trim().is_empty() {
			return Err(ProfileError::EmptySessionKey);
		}

		validate_origin(&self.origin)?;

		if let Some(api_base) = self.api_base.as_ref() {
			if api_base.scheme() != "https" && !is_local_host(api_base) {
				return Err(ProfileError::InsecureApiBase { url: api_base.to_string() });
			}
		}

		Ok(ProviderProfile { origin: self.origin, session_key, api_base: self.api_base })
	}
}

/// Tunable relay behavior shared by the coordinator and view contexts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
	/// Deadline for a pending login attempt before it is declared failed.
	pub login_deadline: Duration,
	/// Freshness policy applied to stored records.
	pub freshness: FreshnessPolicy,
}
impl RelayConfig {
	/// Default time a login attempt may stay pending.
	pub const DEFAULT_LOGIN_DEADLINE: Duration = Duration::seconds(120);

	/// Overrides the pending-login deadline; the deadline must be positive.
	pub fn with_login_deadline(self, deadline: Duration) -> Result<Self, ConfigError> {
		if !deadline.is_positive() {
			return Err(ConfigError::NonPositiveDeadline);
		}

		Ok(Self { login_deadline: deadline, ..self })
	}

	/// Overrides the freshness policy.
	pub fn with_freshness(mut self, policy: FreshnessPolicy) -> Self {
		self.freshness = policy;

		self
	}
}
impl Default for RelayConfig {
	fn default() -> Self {
		Self { login_deadline: Self::DEFAULT_LOGIN_DEADLINE, freshness: FreshnessPolicy::default() }
	}
}

fn validate_origin(origin: &Url) -> Result<(), ProfileError> {
	if origin.host_str().is_none_or(str::is_empty) {
		return Err(ProfileError::MissingHost { url: origin.to_string() });
	}
	if origin.scheme() != "https" && !is_local_host(origin) {
		return Err(ProfileError::InsecureOrigin { url: origin.to_string() });
	}

	Ok(())
}

fn is_local_host(url: &Url) -> bool {
	url.scheme() == "http" && url.host_str().is_some_and(|host| LOCAL_HOSTS.contains(&host))
}
