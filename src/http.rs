//! Credential-gated transport for application service calls.
//!
//! The module exposes [`BearerSigner`] so downstream crates can integrate custom HTTP stacks, plus
//! a reqwest-backed [`GatedClient`] that loads the stored credential before every call, refuses to
//! send without a usable one, and clears relay state when the service rejects the credential.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::{Method, RequestBuilder, Response, StatusCode};
// self
use crate::{_prelude::*, session::SessionRecord};
#[cfg(feature = "reqwest")]
use crate::{
	context::CoordinatorHandle,
	error::TransportError,
	obs::{self, SyncKind, SyncOutcome, SyncSpan},
	session::{FreshnessPolicy, TokenFreshness},
	store::CredentialStore,
};

/// Applies a stored credential to an outbound request.
///
/// The trait is the relay's only coupling to an HTTP stack: implement it for
/// your client's request type and the rest of the relay stays transport
/// agnostic. Implementations must not log or otherwise expose the raw token.
pub trait BearerSigner<R>
where
	Self: Send + Sync,
{
	/// Returns the request with the credential attached.
	fn sign(&self, request: R, record: &SessionRecord) -> R;
}

/// [`BearerSigner`] for reqwest's builder, using the `Authorization: Bearer` scheme.
#[cfg(feature = "reqwest")]
#[derive(Clone, Copy, Debug, Default)]
pub struct ReqwestBearerSigner;
#[cfg(feature = "reqwest")]
impl BearerSigner<RequestBuilder> for ReqwestBearerSigner {
	fn sign(&self, request: RequestBuilder, record: &SessionRecord) -> RequestBuilder {
		request.bearer_auth(record.token.expose())
	}
}

/// HTTP client that only sends requests a stored credential can authorize.
///
/// Every call runs the same gate: load the credential, refuse when none is
/// stored, clear and refuse when it has expired, and nudge the coordinator
/// when it is close enough to expiry that renewal should start. A `401
/// Unauthorized` answer clears the stored credential so every context snaps
/// back to signed-out instead of retrying a dead token.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct GatedClient {
	/// Underlying reqwest client used for every outbound call.
	pub client: ReqwestClient,
	store: Arc<dyn CredentialStore>,
	policy: FreshnessPolicy,
	coordinator: Option<CoordinatorHandle>,
}
#[cfg(feature = "reqwest")]
impl GatedClient {
	/// Creates a gated client over the store the relay coordinator writes.
	pub fn new(
		client: ReqwestClient,
		store: Arc<dyn CredentialStore>,
		policy: FreshnessPolicy,
	) -> Self {
		Self { client, store, policy, coordinator: None }
	}

	/// Attaches a coordinator handle so aging credentials raise refresh demands.
	pub fn with_coordinator(mut self, coordinator: CoordinatorHandle) -> Self {
		self.coordinator = Some(coordinator);

		self
	}

	/// Starts a plain request builder for `method` + `url`.
	///
	/// The credential is attached by [`GatedClient::execute`], not here.
	pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
		self.client.request(method, url)
	}

	/// Executes an authorized `GET` against `url`.
	pub async fn get(&self, url: Url) -> Result<Response> {
		self.execute(self.client.get(url)).await
	}

	/// Loads the stored credential and applies the freshness gate.
	///
	/// Refuses when nothing is stored or the record has expired (clearing
	/// the expired record). A record inside the refresh window is still
	/// returned, with a refresh demand raised on the side.
	pub async fn authorize(&self) -> Result<SessionRecord> {
		let Some(record) = self.store.fetch().await? else {
			return Err(Error::InvalidCredential { reason: "no credential is stored".into() });
		};

		match self.policy.classify(&record, OffsetDateTime::now_utc()) {
			TokenFreshness::Expired => {
				self.store.clear().await?;

				Err(Error::InvalidCredential { reason: "the stored credential has expired".into() })
			},
			TokenFreshness::NeedsRefresh => {
				if let Some(coordinator) = &self.coordinator {
					coordinator.request_refresh();
				}

				Ok(record)
			},
			TokenFreshness::Valid => Ok(record),
		}
	}

	/// Signs and sends a request, enforcing the credential gate end to end.
	pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
		const KIND: SyncKind = SyncKind::Request;

		let span = SyncSpan::new(KIND, "execute");

		obs::record_sync_outcome(KIND, SyncOutcome::Attempt);

		let result = span
			.instrument(async move {
				let record = self.authorize().await?;
				let response = ReqwestBearerSigner
					.sign(request, &record)
					.send()
					.await
					.map_err(TransportError::from)?;

				if response.status() == StatusCode::UNAUTHORIZED {
					self.store.clear().await?;

					return Err(Error::InvalidCredential {
						reason: "the service rejected the credential".into(),
					});
				}

				Ok(response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_sync_outcome(KIND, SyncOutcome::Success),
			Err(_) => obs::record_sync_outcome(KIND, SyncOutcome::Failure),
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl Debug for GatedClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GatedClient")
			.field("policy", &self.policy)
			.field("coordinator_attached", &self.coordinator.is_some())
			.finish()
	}
}
