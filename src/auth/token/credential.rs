//! Exchanged credential model scoped to a single downstream audience.

// self
use crate::{
	_prelude::*,
	auth::{AudienceId, token::secret::BearerSecret},
};

/// Credential derived from a validated principal for one downstream call.
///
/// Owned exclusively by the relay request that created it; the relay never caches
/// or shares it across requests, and the bearer value must only ever be presented
/// to the resource named by `audience`.
#[derive(Clone, Debug)]
pub struct ExchangedCredential {
	/// Bearer value presented to the downstream resource; callers must avoid logging it.
	pub bearer: BearerSecret,
	/// The single downstream audience the credential is scoped to.
	pub audience: AudienceId,
	/// Expiry instant reported by the authorization server, when one was issued.
	///
	/// `None` under the passthrough policy: the relay does not inspect the inbound
	/// token's claims, so its lifetime is the validator's concern.
	pub expires_at: Option<OffsetDateTime>,
}
impl ExchangedCredential {
	/// Creates a credential scoped to the provided audience.
	pub fn new(bearer: BearerSecret, audience: AudienceId, expires_at: Option<OffsetDateTime>) -> Self {
		Self { bearer, audience, expires_at }
	}

	/// Returns `true` if the credential is known to be expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expiry| instant >= expiry)
	}
}
