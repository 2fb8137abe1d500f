//! Downstream resource invoker.

// self
use crate::{
	_prelude::*,
	auth::ExchangedCredential,
	config::RelayConfig,
	http::{HttpCall, RelayHttpClient},
};

/// Successful downstream response handed back to the relay.
#[derive(Clone, Debug)]
pub struct DownstreamReply {
	/// HTTP status code returned by the downstream resource.
	pub status: u16,
	/// Response body decoded as text.
	pub body: String,
}

/// Calls the configured downstream resource with an exchanged credential.
///
/// Exactly one attempt per relay request; retrying on failure is the caller's
/// decision, never the invoker's.
pub struct DownstreamInvoker<C>
where
	C: ?Sized + RelayHttpClient,
{
	http_client: Arc<C>,
	call_timeout: Duration,
}
impl<C> DownstreamInvoker<C>
where
	C: ?Sized + RelayHttpClient,
{
	/// Creates an invoker with an explicit call budget.
	pub fn new(call_timeout: Duration, http_client: impl Into<Arc<C>>) -> Self {
		Self { http_client: http_client.into(), call_timeout }
	}

	pub(crate) fn from_config(config: &RelayConfig, http_client: Arc<C>) -> Self {
		Self::new(config.call_timeout(), http_client)
	}

	/// Performs the single authenticated GET against the downstream resource.
	pub async fn call(
		&self,
		credential: &ExchangedCredential,
		resource_url: &Url,
	) -> Result<DownstreamReply> {
		let call = HttpCall::get(
			resource_url.clone(),
			Some(credential.bearer.clone()),
			self.call_timeout,
		);
		let reply = self
			.http_client
			.execute(call)
			.await
			.map_err(|source| Error::DownstreamUnreachable { source })?;

		if !reply.is_success() {
			// A rejection body can carry downstream-internal detail; only the
			// status travels outward.
			return Err(Error::DownstreamRejected { status: reply.status });
		}

		Ok(DownstreamReply { status: reply.status, body: reply.body })
	}
}
impl<C> Debug for DownstreamInvoker<C>
where
	C: ?Sized + RelayHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DownstreamInvoker").field("call_timeout", &self.call_timeout).finish()
	}
}
