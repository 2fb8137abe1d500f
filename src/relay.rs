//! Relay endpoint tying authentication, exchange, and downstream invocation
//! together.
//!
//! [`Relay::handle`] is the single entry point. It never panics on remote
//! misbehavior and never returns `Err`: every failure is folded into a
//! [`RelayResponse`] with a distinct outward status and a sanitized body, so an
//! embedding HTTP server can forward it verbatim.

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	config::RelayConfig,
	downstream::{DownstreamInvoker, DownstreamReply},
	exchange::TokenExchangeClient,
	http::RelayHttpClient,
	obs::{StageKind, observe},
	validator::{TokenValidator, extract_bearer},
};
#[cfg(feature = "reqwest")]
use crate::http::ReqwestHttpClient;

/// Marker every outward body starts with, proving the response transited the relay.
pub const RELAY_MARKER: &str = "oauth2-relay";

/// Outward response produced for every relayed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayResponse {
	/// Outward HTTP status.
	pub status: u16,
	/// Outward body; always prefixed with [`RELAY_MARKER`].
	pub body: String,
}

/// Opaque per-request correlation identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RelayRequestId(String);
impl RelayRequestId {
	/// Generates a fresh random identifier.
	pub fn generate() -> Self {
		let value: u128 = rand::rng().random();

		Self(format!("{value:032x}"))
	}

	/// Returns the identifier as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for RelayRequestId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// The relay endpoint.
///
/// Holds no per-request state; one instance serves concurrent requests, each of
/// which runs the authenticate/exchange/invoke sequence independently. Exchanged
/// credentials live inside a single [`Relay::handle`] call and are never shared
/// across requests.
pub struct Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	validator: Arc<dyn TokenValidator>,
	exchanger: TokenExchangeClient<C>,
	invoker: DownstreamInvoker<C>,
	config: RelayConfig,
}
impl<C> Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	/// Builds a relay over a caller-supplied transport.
	///
	/// Fails with [`ConfigError`](crate::error::ConfigError) when the configuration
	/// violates an invariant, e.g. a non-HTTPS endpoint or a missing token endpoint
	/// under the full-exchange policy.
	pub fn with_http_client(
		config: RelayConfig,
		validator: Arc<dyn TokenValidator>,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		config.validate()?;

		let http_client = http_client.into();
		let exchanger = TokenExchangeClient::from_config(&config, http_client.clone());
		let invoker = DownstreamInvoker::from_config(&config, http_client);

		Ok(Self { validator, exchanger, invoker, config })
	}

	/// Relays one inbound request described by its `Authorization` header value.
	///
	/// Runs the full authenticate/exchange/invoke sequence and folds every outcome,
	/// success or failure, into a [`RelayResponse`].
	pub async fn handle(&self, authorization: Option<&str>) -> RelayResponse {
		let request_id = RelayRequestId::generate();

		match self.relay(&request_id, authorization).await {
			Ok(reply) => RelayResponse {
				status: 200,
				body: format!("Relayed by {RELAY_MARKER}: {}", reply.body),
			},
			Err(e) => {
				log_failure(&request_id, &e);

				RelayResponse { status: e.outward_status(), body: format!("{RELAY_MARKER}: {e}") }
			},
		}
	}

	async fn relay(
		&self,
		request_id: &RelayRequestId,
		authorization: Option<&str>,
	) -> Result<DownstreamReply> {
		let principal = observe(StageKind::Authenticate, async {
			let raw_token = extract_bearer(authorization)?;

			self.validator.validate(raw_token).await
		})
		.await?;

		log_authenticated(request_id, &principal);

		let credential = observe(
			StageKind::Exchange,
			self.exchanger.exchange(&principal, &self.config.downstream_audience),
		)
		.await?;

		observe(
			StageKind::Invoke,
			self.invoker.call(&credential, &self.config.downstream_resource_url),
		)
		.await
	}
}
#[cfg(feature = "reqwest")]
impl Relay<ReqwestHttpClient> {
	/// Builds a relay over a default reqwest transport.
	pub fn new(config: RelayConfig, validator: Arc<dyn TokenValidator>) -> Result<Self> {
		Self::with_http_client(config, validator, ReqwestHttpClient::default())
	}
}
impl<C> Debug for Relay<C>
where
	C: ?Sized + RelayHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Relay").field("config", &self.config).finish()
	}
}

/// Reqwest-backed relay type alias.
#[cfg(feature = "reqwest")]
pub type ReqwestRelay = Relay<ReqwestHttpClient>;

// Only subject, audiences, and the token fingerprint reach the log stream; the
// raw token value never does.
fn log_authenticated(request_id: &RelayRequestId, principal: &crate::auth::PrincipalDescriptor) {
	#[cfg(feature = "tracing")]
	tracing::info!(
		request = request_id.as_str(),
		subject = principal.subject.as_ref(),
		audience = principal.audience_label(),
		token_fingerprint = principal.token.fingerprint(),
		"Relaying request for an authenticated principal.",
	);

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (request_id, principal);
	}
}

fn log_failure(request_id: &RelayRequestId, e: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		request = request_id.as_str(),
		status = e.outward_status(),
		error = %e,
		"Relay request failed.",
	);

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (request_id, e);
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::Mutex;
	// self
	use super::*;
	use crate::{
		auth::{AudienceId, PrincipalDescriptor, ScopeSet, SubjectId},
		error::TransportError,
		http::{CallFuture, HttpCall, HttpReply},
		validator::StaticTokenValidator,
	};

	struct ScriptedHttpClient {
		outcome: Box<dyn Fn() -> Result<HttpReply, TransportError> + Send + Sync>,
		calls: Mutex<Vec<HttpCall>>,
	}
	impl ScriptedHttpClient {
		fn replying(status: u16, body: &str) -> Self {
			let body = body.to_owned();

			Self {
				outcome: Box::new(move || Ok(HttpReply { status, body: body.clone() })),
				calls: Mutex::new(Vec::new()),
			}
		}

		fn failing() -> Self {
			Self {
				outcome: Box::new(|| Err(TransportError::TimedOut)),
				calls: Mutex::new(Vec::new()),
			}
		}

		fn call_count(&self) -> usize {
			self.calls.lock().expect("Call log lock should not be poisoned.").len()
		}
	}
	impl RelayHttpClient for ScriptedHttpClient {
		fn execute<'a>(&'a self, call: HttpCall) -> CallFuture<'a> {
			Box::pin(async move {
				self.calls.lock().expect("Call log lock should not be poisoned.").push(call);

				(self.outcome)()
			})
		}
	}

	fn principal() -> PrincipalDescriptor {
		PrincipalDescriptor::new(
			SubjectId::new("alice").expect("Subject fixture should be valid."),
			vec![AudienceId::new("relay").expect("Audience fixture should be valid.")],
			ScopeSet::new(["profile.read"]).expect("Scope fixture should be valid."),
			"inbound-token",
		)
	}

	fn config() -> RelayConfig {
		RelayConfig::new(
			Url::parse("https://downstream.example.com/api/messages")
				.expect("Fixture URL should parse successfully."),
			AudienceId::new("downstream-api").expect("Audience fixture should be valid."),
		)
	}

	fn relay_over(client: Arc<ScriptedHttpClient>) -> Relay<ScriptedHttpClient> {
		Relay::with_http_client(
			config(),
			Arc::new(StaticTokenValidator::new([principal()])),
			client,
		)
		.expect("Fixture configuration should validate.")
	}

	#[tokio::test]
	async fn missing_bearer_answers_401_without_outbound_calls() {
		let client = Arc::new(ScriptedHttpClient::replying(200, "unused"));
		let relay = relay_over(client.clone());

		for authorization in [None, Some("Basic dXNlcg=="), Some("Bearer   ")] {
			let response = relay.handle(authorization).await;

			assert_eq!(response.status, 401);
			assert!(response.body.starts_with(RELAY_MARKER));
		}
		assert_eq!(client.call_count(), 0, "Rejected requests must not reach the network.");
	}

	#[tokio::test]
	async fn unknown_tokens_answer_401_without_outbound_calls() {
		let client = Arc::new(ScriptedHttpClient::replying(200, "unused"));
		let relay = relay_over(client.clone());
		let response = relay.handle(Some("Bearer unknown-token")).await;

		assert_eq!(response.status, 401);
		assert_eq!(client.call_count(), 0);
	}

	#[tokio::test]
	async fn success_wraps_the_downstream_body_with_the_marker() {
		let client = Arc::new(ScriptedHttpClient::replying(200, "hello"));
		let relay = relay_over(client.clone());
		let response = relay.handle(Some("Bearer inbound-token")).await;

		assert_eq!(response.status, 200);
		assert_eq!(response.body, format!("Relayed by {RELAY_MARKER}: hello"));
		assert_eq!(client.call_count(), 1, "Passthrough relays make exactly one call.");
	}

	#[tokio::test]
	async fn passthrough_forwards_the_inbound_bearer_value() {
		let client = Arc::new(ScriptedHttpClient::replying(200, "hello"));
		let relay = relay_over(client.clone());

		relay.handle(Some("Bearer inbound-token")).await;

		let calls = client.calls.lock().expect("Call log lock should not be poisoned.");
		let bearer = calls
			.first()
			.and_then(|call| call.bearer.as_ref())
			.expect("The downstream call must carry a bearer credential.");

		assert_eq!(bearer.expose(), "inbound-token");
	}

	#[tokio::test]
	async fn downstream_rejections_propagate_the_status_without_the_body() {
		let client = Arc::new(ScriptedHttpClient::replying(403, "internal detail"));
		let relay = relay_over(client.clone());
		let response = relay.handle(Some("Bearer inbound-token")).await;

		assert_eq!(response.status, 403);
		assert!(response.body.starts_with(RELAY_MARKER));
		assert!(!response.body.contains("internal detail"));
	}

	#[tokio::test]
	async fn transport_failures_answer_503() {
		let client = Arc::new(ScriptedHttpClient::failing());
		let relay = relay_over(client.clone());
		let response = relay.handle(Some("Bearer inbound-token")).await;

		assert_eq!(response.status, 503);
		assert!(response.body.starts_with(RELAY_MARKER));
	}

	#[tokio::test]
	async fn each_request_triggers_its_own_downstream_call() {
		let client = Arc::new(ScriptedHttpClient::replying(200, "hello"));
		let relay = relay_over(client.clone());

		relay.handle(Some("Bearer inbound-token")).await;
		relay.handle(Some("Bearer inbound-token")).await;

		assert_eq!(client.call_count(), 2, "Credentials are never cached across requests.");
	}

	#[test]
	fn request_ids_are_random_hex() {
		let a = RelayRequestId::generate();
		let b = RelayRequestId::generate();

		assert_eq!(a.as_str().len(), 32);
		assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
		assert_ne!(a, b);
	}
}
