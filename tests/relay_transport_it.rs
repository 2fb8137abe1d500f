// std
use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};
// self
use oauth2_relay::{
	auth::{AudienceId, BearerSecret, ExchangedCredential, PrincipalDescriptor, ScopeSet, SubjectId},
	config::{ExchangeEndpoint, ExchangePolicy},
	downstream::DownstreamInvoker,
	error::{Error, TransportError},
	exchange::TokenExchangeClient,
	http::{CallFuture, HttpCall, HttpReply, RelayHttpClient},
	url::Url,
};
use time::Duration;

struct FakeHttpClient {
	outcome: Mutex<Box<dyn FnMut() -> Result<HttpReply, TransportError> + Send>>,
	calls: AtomicUsize,
}
impl FakeHttpClient {
	fn timing_out() -> Self {
		Self { outcome: Mutex::new(Box::new(|| Err(TransportError::TimedOut))), calls: AtomicUsize::new(0) }
	}

	fn replying(status: u16, body: &str) -> Self {
		let body = body.to_owned();

		Self {
			outcome: Mutex::new(Box::new(move || Ok(HttpReply { status, body: body.clone() }))),
			calls: AtomicUsize::new(0),
		}
	}

	fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl RelayHttpClient for FakeHttpClient {
	fn execute<'a>(&'a self, _call: HttpCall) -> CallFuture<'a> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			(self.outcome.lock().expect("Outcome lock should not be poisoned."))()
		})
	}
}

fn principal() -> PrincipalDescriptor {
	PrincipalDescriptor::new(
		SubjectId::new("alice").expect("Subject identifier should be valid."),
		vec![AudienceId::new("relay").expect("Audience identifier should be valid.")],
		ScopeSet::new(["messages.read"]).expect("Scope set should be valid."),
		"inbound-token",
	)
}

fn audience() -> AudienceId {
	AudienceId::new("downstream-api").expect("Audience identifier should be valid.")
}

fn endpoint() -> ExchangeEndpoint {
	ExchangeEndpoint::new(
		Url::parse("https://as.example.com/token")
			.expect("Token endpoint should parse successfully."),
	)
}

#[tokio::test]
async fn downstream_timeouts_surface_as_unreachable() {
	let invoker = DownstreamInvoker::<FakeHttpClient>::new(
		Duration::seconds(1),
		Arc::new(FakeHttpClient::timing_out()),
	);
	let credential = ExchangedCredential::new(BearerSecret::new("inbound-token"), audience(), None);
	let resource = Url::parse("https://downstream.example.com/api/messages")
		.expect("Resource URL should parse successfully.");
	let err = invoker
		.call(&credential, &resource)
		.await
		.expect_err("A timed-out transport must surface as unreachable.");

	assert!(matches!(
		err,
		Error::DownstreamUnreachable { source: TransportError::TimedOut },
	));
}

#[tokio::test]
async fn exchange_transport_failures_surface_as_unavailable() {
	let exchanger = TokenExchangeClient::<FakeHttpClient>::new(
		ExchangePolicy::FullExchange,
		Some(endpoint()),
		Duration::seconds(1),
		Arc::new(FakeHttpClient::timing_out()),
	);
	let err = exchanger
		.exchange(&principal(), &audience())
		.await
		.expect_err("A timed-out token endpoint must surface as unavailable.");

	assert!(matches!(err, Error::ExchangeUnavailable { source: Some(_), .. }));
}

#[tokio::test]
async fn exchange_denials_surface_with_the_oauth_error() {
	let exchanger = TokenExchangeClient::<FakeHttpClient>::new(
		ExchangePolicy::FullExchange,
		Some(endpoint()),
		Duration::seconds(1),
		Arc::new(FakeHttpClient::replying(400, "{\"error\":\"invalid_grant\"}")),
	);
	let err = exchanger
		.exchange(&principal(), &audience())
		.await
		.expect_err("A 4xx token endpoint answer must surface as a denial.");

	match err {
		Error::ExchangeDenied { audience, reason } => {
			assert_eq!(audience, "downstream-api");
			assert_eq!(reason, "invalid_grant");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
}

#[tokio::test]
async fn passthrough_exchange_never_touches_the_transport() {
	let client = Arc::new(FakeHttpClient::replying(200, "unused"));
	let exchanger = TokenExchangeClient::<FakeHttpClient>::new(
		ExchangePolicy::Passthrough,
		None,
		Duration::seconds(1),
		client.clone(),
	);
	let credential = exchanger
		.exchange(&principal(), &audience())
		.await
		.expect("Passthrough exchange should always succeed.");

	assert_eq!(credential.bearer.expose(), "inbound-token");
	assert_eq!(client.call_count(), 0);
}
