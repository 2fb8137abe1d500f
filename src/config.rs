//! Relay configuration surface and validation.
//!
//! The downstream resource and audience are a configuration-level binding on
//! purpose: the inbound request never chooses where the relay forwards its
//! credential, which keeps a caller from redirecting the relay to an arbitrary
//! resource.

// self
use crate::{_prelude::*, auth::AudienceId, error::ConfigError};

const DEFAULT_CALL_TIMEOUT_MILLIS: i64 = 5_000;

/// Policy applied when deriving the downstream credential.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangePolicy {
	/// Forwards the inbound bearer value unchanged.
	///
	/// This is a deliberate policy, not an oversight: the downstream resource sees
	/// the original token's audience rather than one narrowed to itself, so it must
	/// trust the relay's validator to have vetted the principal. Deployments that
	/// need audience narrowing use [`ExchangePolicy::FullExchange`].
	#[default]
	Passthrough,
	/// Requests a freshly issued, audience-scoped token from the authorization
	/// server via the RFC 8693 token-exchange grant.
	FullExchange,
}

/// Authorization server coordinates used by the full-exchange policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExchangeEndpoint {
	/// Token endpoint accepting the token-exchange grant.
	pub token_endpoint: Url,
	/// Client identifier posted with the grant, when the server requires one.
	#[serde(default)]
	pub client_id: Option<String>,
	/// Client secret posted with the grant.
	#[serde(default)]
	pub client_secret: Option<String>,
}
impl ExchangeEndpoint {
	/// Creates coordinates for a public client.
	pub fn new(token_endpoint: Url) -> Self {
		Self { token_endpoint, client_id: None, client_secret: None }
	}

	/// Attaches confidential client credentials.
	pub fn with_client(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
		self.client_id = Some(id.into());
		self.client_secret = Some(secret.into());

		self
	}
}

/// Validated relay configuration consumed by [`Relay`](crate::relay::Relay).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
	/// Downstream resource called with the exchanged credential.
	pub downstream_resource_url: Url,
	/// Fixed audience every exchanged credential is scoped to.
	pub downstream_audience: AudienceId,
	/// Budget for each outbound call in milliseconds.
	#[serde(default = "default_call_timeout_millis")]
	pub call_timeout_millis: i64,
	/// Policy used to derive the downstream credential.
	#[serde(default)]
	pub exchange_policy: ExchangePolicy,
	/// Authorization server coordinates; required by the full-exchange policy.
	#[serde(default)]
	pub exchange: Option<ExchangeEndpoint>,
}
impl RelayConfig {
	/// Creates a passthrough configuration with the default call timeout.
	pub fn new(downstream_resource_url: Url, downstream_audience: AudienceId) -> Self {
		Self {
			downstream_resource_url,
			downstream_audience,
			call_timeout_millis: DEFAULT_CALL_TIMEOUT_MILLIS,
			exchange_policy: ExchangePolicy::default(),
			exchange: None,
		}
	}

	/// Overrides the outbound call budget.
	pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
		self.call_timeout_millis = i64::try_from(timeout.whole_milliseconds()).unwrap_or(i64::MAX);

		self
	}

	/// Overrides the exchange policy.
	pub fn with_exchange_policy(mut self, policy: ExchangePolicy) -> Self {
		self.exchange_policy = policy;

		self
	}

	/// Sets the authorization server coordinates and switches to the full-exchange
	/// policy.
	pub fn with_exchange_endpoint(mut self, endpoint: ExchangeEndpoint) -> Self {
		self.exchange = Some(endpoint);
		self.exchange_policy = ExchangePolicy::FullExchange;

		self
	}

	/// Returns the outbound call budget as a [`Duration`].
	pub fn call_timeout(&self) -> Duration {
		Duration::milliseconds(self.call_timeout_millis)
	}

	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.call_timeout_millis <= 0 {
			return Err(ConfigError::NonPositiveTimeout);
		}

		validate_endpoint("downstream resource", &self.downstream_resource_url)?;

		if matches!(self.exchange_policy, ExchangePolicy::FullExchange) {
			let exchange = self.exchange.as_ref().ok_or(ConfigError::MissingTokenEndpoint)?;

			validate_endpoint("token", &exchange.token_endpoint)?;
		}

		Ok(())
	}
}

fn default_call_timeout_millis() -> i64 {
	DEFAULT_CALL_TIMEOUT_MILLIS
}

// Bearer credentials travel on every relayed call, so endpoints must be HTTPS.
// Loopback hosts are exempt: relays routinely front sibling services bound to
// localhost, where TLS adds nothing.
fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.scheme() == "https" {
		return Ok(());
	}
	if url.scheme() == "http" && is_loopback_host(url) {
		return Ok(());
	}

	Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
}

fn is_loopback_host(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(host)) => host == "localhost",
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}
