//! OAuth 2.0 token-exchange relay: authenticate an inbound bearer token, derive a
//! downstream-scoped credential, and call the protected resource with transport-aware
//! error mapping and redaction-safe observability.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod downstream;
pub mod error;
pub mod exchange;
pub mod http;
pub mod obs;
pub mod relay;
pub mod validator;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AudienceId, PrincipalDescriptor, ScopeSet, SubjectId},
		config::RelayConfig,
		http::ReqwestHttpClient,
		relay::Relay,
		validator::{StaticTokenValidator, TokenValidator},
	};

	/// Relay type alias used by reqwest-backed integration tests.
	pub type ReqwestTestRelay = Relay<ReqwestHttpClient>;

	/// Builds a principal descriptor fixture for the provided raw token value.
	pub fn test_principal(token: &str, subject: &str, audience: &str) -> PrincipalDescriptor {
		PrincipalDescriptor::new(
			SubjectId::new(subject).expect("Failed to build test subject identifier."),
			vec![AudienceId::new(audience).expect("Failed to build test audience identifier.")],
			ScopeSet::new(["relay.read"]).expect("Failed to build test scope set."),
			token,
		)
	}

	/// Constructs a [`Relay`] backed by a static validator and the reqwest transport used
	/// across integration tests.
	pub fn build_reqwest_test_relay(
		config: RelayConfig,
		principals: impl IntoIterator<Item = PrincipalDescriptor>,
	) -> ReqwestTestRelay {
		let validator: Arc<dyn TokenValidator> = Arc::new(StaticTokenValidator::new(principals));

		Relay::with_http_client(config, validator, ReqwestHttpClient::default())
			.expect("Failed to build test relay.")
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
