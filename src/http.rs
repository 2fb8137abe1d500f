//! Transport primitives shared by the exchange client and downstream invoker.
//!
//! The module exposes [`RelayHttpClient`] so embedders can integrate custom HTTP
//! stacks. Implementations receive a fully described [`HttpCall`] (method, URL,
//! optional bearer credential, form body, timeout budget) and resolve to an
//! [`HttpReply`] or a classified [`TransportError`]; the relay layers above map
//! those into the error taxonomy without ever seeing transport-native failures.

// std
use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	auth::BearerSecret,
	error::{ConfigError, TransportError},
};

/// Future returned by [`RelayHttpClient::execute`].
pub type CallFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpReply, TransportError>> + 'a + Send>>;

/// HTTP method used for an outbound relay call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallMethod {
	/// Plain GET; the form body is ignored.
	Get,
	/// POST with an `application/x-www-form-urlencoded` body.
	PostForm,
}

/// Single outbound HTTP call description.
#[derive(Clone, Debug)]
pub struct HttpCall {
	/// Method to use.
	pub method: CallMethod,
	/// Endpoint to call.
	pub url: Url,
	/// Bearer credential attached as an `Authorization` header, when present.
	pub bearer: Option<BearerSecret>,
	/// Form parameters for [`CallMethod::PostForm`] calls.
	pub form: Vec<(String, String)>,
	/// Budget for the whole call, connection establishment included.
	pub timeout: Duration,
}
impl HttpCall {
	/// Describes a bearer-authenticated GET.
	pub fn get(url: Url, bearer: Option<BearerSecret>, timeout: Duration) -> Self {
		Self { method: CallMethod::Get, url, bearer, form: Vec::new(), timeout }
	}

	/// Describes an unauthenticated form POST.
	pub fn post_form(url: Url, form: Vec<(String, String)>, timeout: Duration) -> Self {
		Self { method: CallMethod::PostForm, url, bearer: None, form, timeout }
	}
}

/// Status and body of a completed outbound call.
#[derive(Clone, Debug)]
pub struct HttpReply {
	/// HTTP status code returned by the remote endpoint.
	pub status: u16,
	/// Response body decoded as text.
	pub body: String,
}
impl HttpReply {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP transports capable of executing relay calls.
///
/// The trait is the relay's only dependency on an HTTP stack. Implementations must
/// be `Send + Sync + 'static` so one transport can serve concurrent relay
/// executions, and the returned future must be `Send`.
///
/// # Contract
///
/// - Honor `call.timeout`: a call that cannot complete within the budget must
///   resolve with [`TransportError::TimedOut`] instead of blocking indefinitely.
/// - Dropping the returned future must cancel the in-flight request rather than
///   letting it run to completion with a discarded result.
/// - Classify failures into [`TransportError`]; never panic on remote misbehavior.
pub trait RelayHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes a single outbound call.
	fn execute<'a>(&'a self, call: HttpCall) -> CallFuture<'a>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Relay calls should not follow redirects: a downstream resource or token endpoint
/// that answers with a redirect would otherwise receive the bearer credential at an
/// address the configuration never vetted. Configure any custom [`ReqwestClient`]
/// accordingly.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client from a caller-tuned [`reqwest::ClientBuilder`].
	pub fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self, ConfigError> {
		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl RelayHttpClient for ReqwestHttpClient {
	fn execute<'a>(&'a self, call: HttpCall) -> CallFuture<'a> {
		let client = self.0.clone();

		Box::pin(async move {
			// Config validation rejects non-positive timeouts before a call is built.
			let timeout =
				std::time::Duration::try_from(call.timeout).unwrap_or(std::time::Duration::ZERO);
			let mut request = match call.method {
				CallMethod::Get => client.get(call.url.clone()),
				CallMethod::PostForm => client.post(call.url.clone()).form(&call.form),
			};

			if let Some(bearer) = &call.bearer {
				request = request.bearer_auth(bearer.expose());
			}

			let response = request.timeout(timeout).send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.text().await.map_err(TransportError::from)?;

			Ok(HttpReply { status, body })
		})
	}
}
