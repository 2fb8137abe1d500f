//! Validated principal descriptor produced by the external token validator.

// self
use crate::{
	_prelude::*,
	auth::{AudienceId, ScopeSet, SubjectId, token::secret::BearerSecret},
};

/// Immutable descriptor for an authenticated inbound principal.
///
/// Produced once per request by the external validator after signature and expiry
/// checks; the relay never re-validates it. Only `subject` and `audience` are safe
/// to record in logs; the raw token stays wrapped inside [`BearerSecret`].
#[derive(Clone, Debug)]
pub struct PrincipalDescriptor {
	/// Subject the inbound token was issued to.
	pub subject: SubjectId,
	/// Audiences the inbound token was issued for.
	pub audience: Vec<AudienceId>,
	/// Scopes granted to the inbound token.
	pub scope: ScopeSet,
	/// Raw inbound token value; callers must avoid logging it.
	pub token: BearerSecret,
}
impl PrincipalDescriptor {
	/// Creates a descriptor for a validated inbound token.
	pub fn new(
		subject: SubjectId,
		audience: Vec<AudienceId>,
		scope: ScopeSet,
		token: impl Into<String>,
	) -> Self {
		Self { subject, audience, scope, token: BearerSecret::new(token) }
	}

	/// Space-joined audience list suitable for log fields.
	pub fn audience_label(&self) -> String {
		self.audience.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn principal() -> PrincipalDescriptor {
		PrincipalDescriptor::new(
			SubjectId::new("alice").expect("Subject fixture should be valid."),
			vec![
				AudienceId::new("relay").expect("Audience fixture should be valid."),
				AudienceId::new("reporting").expect("Audience fixture should be valid."),
			],
			ScopeSet::new(["profile.read"]).expect("Scope fixture should be valid."),
			"raw-inbound-token",
		)
	}

	#[test]
	fn debug_output_redacts_the_raw_token() {
		let rendered = format!("{:?}", principal());

		assert!(rendered.contains("alice"));
		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("raw-inbound-token"));
	}

	#[test]
	fn audience_label_joins_entries() {
		assert_eq!(principal().audience_label(), "relay reporting");
	}
}
