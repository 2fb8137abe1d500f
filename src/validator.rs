//! Inbound bearer extraction and the external token-validator contract.

// self
use crate::{_prelude::*, auth::PrincipalDescriptor};

/// Future returned by [`TokenValidator::validate`].
pub type ValidationFuture<'a> = Pin<Box<dyn Future<Output = Result<PrincipalDescriptor>> + 'a + Send>>;

/// Contract implemented by the external token validator.
///
/// The relay never re-implements signature or expiry verification; it hands the raw
/// token value (authorization scheme already stripped) to an implementation of this
/// trait and consumes the resulting [`PrincipalDescriptor`]. Implementations fail
/// with [`Error::InvalidToken`] for signature, expiry, or claim problems.
pub trait TokenValidator
where
	Self: 'static + Send + Sync,
{
	/// Verifies a raw bearer token and produces the principal it represents.
	fn validate<'a>(&'a self, raw_token: &'a str) -> ValidationFuture<'a>;
}

/// Extracts the bearer token value from an `Authorization` header.
///
/// A missing header, a non-bearer scheme, or an empty value maps to
/// [`Error::Unauthenticated`]; the relay answers those without any outbound call.
pub fn extract_bearer(authorization: Option<&str>) -> Result<&str> {
	let header = authorization
		.ok_or_else(|| Error::Unauthenticated { reason: "missing Authorization header".into() })?;
	let (scheme, value) = header
		.split_once(' ')
		.ok_or_else(|| Error::Unauthenticated { reason: "malformed Authorization header".into() })?;

	if !scheme.eq_ignore_ascii_case("bearer") {
		return Err(Error::Unauthenticated {
			reason: format!("unsupported authorization scheme `{scheme}`"),
		});
	}

	let value = value.trim();

	if value.is_empty() {
		return Err(Error::Unauthenticated { reason: "empty bearer value".into() });
	}

	Ok(value)
}

/// Validator backed by a pre-shared token table.
///
/// Every known raw token maps to a fixed principal descriptor. Useful for demos and
/// tests where a full JWT validator would be overkill; production embedders plug in
/// their own [`TokenValidator`] instead.
pub struct StaticTokenValidator {
	principals: HashMap<String, PrincipalDescriptor>,
}
impl StaticTokenValidator {
	/// Builds a validator from the provided principals, keyed by raw token value.
	pub fn new(principals: impl IntoIterator<Item = PrincipalDescriptor>) -> Self {
		Self {
			principals: principals
				.into_iter()
				.map(|principal| (principal.token.expose().to_owned(), principal))
				.collect(),
		}
	}
}
impl TokenValidator for StaticTokenValidator {
	fn validate<'a>(&'a self, raw_token: &'a str) -> ValidationFuture<'a> {
		Box::pin(async move {
			self.principals
				.get(raw_token)
				.cloned()
				.ok_or_else(|| Error::InvalidToken { reason: "token is not recognized".into() })
		})
	}
}
