//! Demonstrates calling a protected service through the credential gate: the
//! stored session signs the request, and a rejection clears the slot so the
//! relay falls back to signed-out.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use auth_relay::{
	http::GatedClient,
	ids::SubjectId,
	reqwest::Client,
	session::{FreshnessPolicy, SessionRecord},
	store::{CredentialStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer tok-demo");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"plan":"pro"}"#);
		})
		.await;
	let admin_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin");
			then.status(401);
		})
		.await;
	let store = Arc::new(MemoryStore::default());
	let record = SessionRecord::builder(SubjectId::new("demo-user")?)
		.email("demo-user@example.com")
		.token("tok-demo")
		.expires_at(OffsetDateTime::now_utc() + Duration::hours(2))
		.build()?;

	println!("Stored a session whose token fingerprint is {}.", record.token.fingerprint());

	store.save(record).await?;

	let client = GatedClient::new(Client::new(), store.clone(), FreshnessPolicy::default());
	let response = client.get(Url::parse(&server.url("/profile"))?).await?;

	println!("Profile call passed the gate: HTTP {}.", response.status());
	println!("Body: {}.", response.text().await?);

	// The service revokes the credential server-side; the next call fails and
	// drops the stored session.
	let err = client
		.get(Url::parse(&server.url("/admin"))?)
		.await
		.expect_err("The revoked credential should be refused.");

	println!("Admin call was refused: {err}");

	assert!(store.fetch().await?.is_none());

	println!("The rejected credential was dropped from the slot.");

	profile_mock.assert_async().await;
	admin_mock.assert_async().await;

	Ok(())
}
