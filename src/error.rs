//! Relay-wide error taxonomy shared across validation, exchange, and downstream calls.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
///
/// Every variant is recoverable at the relay boundary: [`Error::outward_status`]
/// maps it onto a distinct outward HTTP status, and each `Display` message is safe
/// to return to callers (no raw token material, no downstream error bodies).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// Inbound request carried no usable bearer credentials.
	#[error("Request carries no valid bearer credentials: {reason}.")]
	Unauthenticated {
		/// Why the `Authorization` header was rejected.
		reason: String,
	},
	/// Inbound token failed signature or expiry validation.
	#[error("Inbound token failed validation: {reason}.")]
	InvalidToken {
		/// Validator-supplied reason string.
		reason: String,
	},
	/// Authorization server refused to mint a token for the requested audience.
	#[error("Token exchange was denied for audience `{audience}`: {reason}.")]
	ExchangeDenied {
		/// Audience the exchange was attempted for.
		audience: String,
		/// Summary of the OAuth error response, never echoing token material.
		reason: String,
	},
	/// Authorization server could not be reached or answered abnormally.
	#[error("Authorization server is unavailable: {reason}.")]
	ExchangeUnavailable {
		/// Summary of the failure.
		reason: String,
		/// Underlying transport or parse failure, when one exists.
		#[source]
		source: Option<BoxError>,
	},
	/// Downstream resource could not be reached within the configured timeout.
	#[error("Downstream resource is unreachable.")]
	DownstreamUnreachable {
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
	/// Downstream resource rejected the relayed request.
	///
	/// The downstream body is intentionally dropped; it may carry detail the relay
	/// must not expose to its own callers.
	#[error("Downstream resource rejected the relayed request with status {status}.")]
	DownstreamRejected {
		/// HTTP status returned by the downstream resource.
		status: u16,
	},
}
impl Error {
	/// Maps the error onto the outward HTTP status returned by the relay boundary.
	pub fn outward_status(&self) -> u16 {
		match self {
			Self::Config(_) => 500,
			Self::Unauthenticated { .. } | Self::InvalidToken { .. } => 401,
			Self::ExchangeDenied { .. } => 403,
			Self::ExchangeUnavailable { .. } => 502,
			Self::DownstreamUnreachable { .. } => 503,
			Self::DownstreamRejected { status } => *status,
		}
	}
}

/// Configuration and validation failures raised by the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS (or HTTP on loopback): {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Outbound calls need a positive timeout budget.
	#[error("Call timeout must be positive.")]
	NonPositiveTimeout,
	/// The full-exchange policy cannot run without an authorization server.
	#[error("The full_exchange policy requires an authorization server token endpoint.")]
	MissingTokenEndpoint,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The call did not complete within the configured timeout.
	#[error("The call did not complete within the configured timeout.")]
	TimedOut,
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::TimedOut } else { Self::network(e) }
	}
}
