//! Demonstrates relaying bearer-authenticated requests to a mock downstream
//! resource with the default reqwest transport and the passthrough policy.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use oauth2_relay::{
	auth::{AudienceId, PrincipalDescriptor, ScopeSet, SubjectId},
	config::RelayConfig,
	relay::Relay,
	validator::{StaticTokenValidator, TokenValidator},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let downstream_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/messages")
				.header("authorization", "Bearer demo-inbound-token");
			then.status(200).body("I am a message from the downstream resource server.");
		})
		.await;
	let principal = PrincipalDescriptor::new(
		SubjectId::new("demo-user")?,
		vec![AudienceId::new("demo-relay")?],
		ScopeSet::new(["messages.read"])?,
		"demo-inbound-token",
	);
	let validator: Arc<dyn TokenValidator> = Arc::new(StaticTokenValidator::new([principal]));
	let config = RelayConfig::new(
		Url::parse(&server.url("/api/messages"))?,
		AudienceId::new("downstream-api")?,
	);
	let relay = Relay::new(config, validator)?;

	let accepted = relay.handle(Some("Bearer demo-inbound-token")).await;

	println!("{} {}.", accepted.status, accepted.body);

	let rejected = relay.handle(None).await;

	println!("{} {}.", rejected.status, rejected.body);

	downstream_mock.assert_async().await;

	Ok(())
}
