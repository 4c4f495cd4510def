//! Immutable session record struct and its builder.

// self
use crate::{_prelude::*, ids::SubjectId, session::secret::*};

/// Errors produced by [`SessionRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum RecordBuilderError {
	/// Issued when no session token value was provided.
	#[error("Session token is required.")]
	MissingToken,
	/// Issued when the provided token failed validation.
	#[error(transparent)]
	InvalidToken(#[from] TokenError),
}

/// Immutable record describing one authenticated session.
///
/// The serialized shape uses the provider's raw field names (`user_id`,
/// `auth_id`, `expired`, `is_active`) so snapshots and login payloads share
/// one layout; `expired` is encoded as unix seconds.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
	/// Opaque user identifier issued by the provider.
	#[serde(rename = "user_id")]
	pub subject: SubjectId,
	/// Contact address reported at login, when the provider supplies one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Bearer secret attached to outbound service calls.
	#[serde(rename = "auth_id")]
	pub token: SessionToken,
	/// Provider-reported active flag, stored verbatim. Expiry decisions use
	/// `expires_at`, never this flag.
	#[serde(rename = "is_active", default = "default_active")]
	pub active: bool,
	/// Authoritative expiry instant; `None` defers to the freshness policy.
	#[serde(
		rename = "expired",
		with = "time::serde::timestamp::option",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub expires_at: Option<OffsetDateTime>,
}
impl SessionRecord {
	/// Returns a builder for constructing validated records.
	pub fn builder(subject: SubjectId) -> SessionRecordBuilder {
		SessionRecordBuilder::new(subject)
	}
}
impl Debug for SessionRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionRecord")
			.field("subject", &self.subject)
			.field("email", &self.email)
			.field("token", &"<redacted>")
			.field("active", &self.active)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`SessionRecord`].
#[derive(Clone, Debug)]
pub struct SessionRecordBuilder {
	subject: SubjectId,
	email: Option<String>,
	token: Option<String>,
	active: bool,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl SessionRecordBuilder {
	fn new(subject: SubjectId) -> Self {
		Self { subject, email: None, token: None, active: true, expires_at: None, expires_in: None }
	}

	/// Sets the contact address.
	pub fn email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());

		self
	}

	/// Provides the session token value.
	pub fn token(mut self, token: impl Into<String>) -> Self {
		self.token = Some(token.into());

		self
	}

	/// Overrides the provider-reported active flag.
	pub fn active(mut self, active: bool) -> Self {
		self.active = active;

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the current clock.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a [`SessionRecord`].
	pub fn build(self) -> Result<SessionRecord, RecordBuilderError> {
		let token = SessionToken::new(self.token.ok_or(RecordBuilderError::MissingToken)?)?;
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => Some(instant),
			(None, Some(delta)) => Some(OffsetDateTime::now_utc() + delta),
			(None, None) => None,
		};

		Ok(SessionRecord {
			subject: self.subject,
			email: self.email,
			token,
			active: self.active,
			expires_at,
		})
	}
}

fn default_active() -> bool {
	true
}
