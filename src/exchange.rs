//! Token exchange client deriving the downstream credential.
//!
//! Two policies are supported. Passthrough forwards the inbound bearer value
//! unchanged and performs no outbound call; full exchange posts an RFC 8693
//! token-exchange grant to the configured authorization server and returns the
//! freshly issued, audience-scoped token. Either way a credential lives for
//! exactly one relay request; issued tokens are never cached across requests.

// self
use crate::{
	_prelude::*,
	auth::{AudienceId, BearerSecret, ExchangedCredential, PrincipalDescriptor},
	config::{ExchangeEndpoint, ExchangePolicy, RelayConfig},
	error::ConfigError,
	http::{HttpCall, HttpReply, RelayHttpClient},
};

/// RFC 8693 token-exchange grant type identifier.
pub const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
/// RFC 8693 access-token type URN.
pub const TOKEN_TYPE_ACCESS_TOKEN: &str = "urn:ietf:params:oauth:token-type:access_token";

/// Successful token endpoint payload (RFC 8693 §2.2.1).
#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
	access_token: String,
	#[serde(default)]
	expires_in: Option<i64>,
}

/// OAuth error payload returned on denial (RFC 6749 §5.2).
#[derive(Debug, Default, Deserialize)]
struct TokenEndpointErrorBody {
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
}

/// Derives the downstream-scoped credential for an authenticated principal.
pub struct TokenExchangeClient<C>
where
	C: ?Sized + RelayHttpClient,
{
	http_client: Arc<C>,
	policy: ExchangePolicy,
	endpoint: Option<ExchangeEndpoint>,
	call_timeout: Duration,
}
impl<C> TokenExchangeClient<C>
where
	C: ?Sized + RelayHttpClient,
{
	/// Creates an exchange client with an explicit policy and endpoint.
	pub fn new(
		policy: ExchangePolicy,
		endpoint: Option<ExchangeEndpoint>,
		call_timeout: Duration,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self { http_client: http_client.into(), policy, endpoint, call_timeout }
	}

	pub(crate) fn from_config(config: &RelayConfig, http_client: Arc<C>) -> Self {
		Self::new(
			config.exchange_policy,
			config.exchange.clone(),
			config.call_timeout(),
			http_client,
		)
	}

	/// Derives a credential scoped to `target_audience` for the principal.
	///
	/// Performs at most one outbound call; the passthrough policy performs none.
	pub async fn exchange(
		&self,
		principal: &PrincipalDescriptor,
		target_audience: &AudienceId,
	) -> Result<ExchangedCredential> {
		match self.policy {
			ExchangePolicy::Passthrough =>
				Ok(ExchangedCredential::new(principal.token.clone(), target_audience.clone(), None)),
			ExchangePolicy::FullExchange => self.full_exchange(principal, target_audience).await,
		}
	}

	async fn full_exchange(
		&self,
		principal: &PrincipalDescriptor,
		target_audience: &AudienceId,
	) -> Result<ExchangedCredential> {
		// Relay::with_http_client validates the configuration up front; a missing
		// endpoint here means the client was constructed by hand.
		let endpoint = self.endpoint.as_ref().ok_or(ConfigError::MissingTokenEndpoint)?;
		let form = build_grant_form(principal, target_audience, endpoint);
		let call = HttpCall::post_form(endpoint.token_endpoint.clone(), form, self.call_timeout);
		let reply = self.http_client.execute(call).await.map_err(|source| {
			Error::ExchangeUnavailable {
				reason: "transport failure while calling the token endpoint".into(),
				source: Some(Box::new(source)),
			}
		})?;

		if reply.is_success() {
			let issued = parse_token_response(&reply.body)?;
			let expires_at =
				issued.expires_in.map(|secs| OffsetDateTime::now_utc() + Duration::seconds(secs));
			let credential = ExchangedCredential::new(
				BearerSecret::new(issued.access_token),
				target_audience.clone(),
				expires_at,
			);

			// A non-positive expires_in yields a token that is unusable on arrival.
			if credential.is_expired_at(OffsetDateTime::now_utc()) {
				return Err(Error::ExchangeUnavailable {
					reason: "token endpoint issued an already expired token".into(),
					source: None,
				});
			}

			return Ok(credential);
		}
		if (400..500).contains(&reply.status) {
			return Err(Error::ExchangeDenied {
				audience: target_audience.to_string(),
				reason: denial_reason(&reply),
			});
		}

		Err(Error::ExchangeUnavailable {
			reason: format!("token endpoint returned status {}", reply.status),
			source: None,
		})
	}
}
impl<C> Debug for TokenExchangeClient<C>
where
	C: ?Sized + RelayHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenExchangeClient")
			.field("policy", &self.policy)
			.field("endpoint", &self.endpoint.as_ref().map(|e| e.token_endpoint.as_str()))
			.finish()
	}
}

fn build_grant_form(
	principal: &PrincipalDescriptor,
	target_audience: &AudienceId,
	endpoint: &ExchangeEndpoint,
) -> Vec<(String, String)> {
	let mut form = vec![
		("grant_type".to_owned(), GRANT_TYPE_TOKEN_EXCHANGE.to_owned()),
		("subject_token".to_owned(), principal.token.expose().to_owned()),
		("subject_token_type".to_owned(), TOKEN_TYPE_ACCESS_TOKEN.to_owned()),
		("requested_token_type".to_owned(), TOKEN_TYPE_ACCESS_TOKEN.to_owned()),
		("audience".to_owned(), target_audience.to_string()),
	];

	if !principal.scope.is_empty() {
		form.push(("scope".to_owned(), principal.scope.normalized()));
	}
	if let Some(client_id) = &endpoint.client_id {
		form.push(("client_id".to_owned(), client_id.clone()));
	}
	if let Some(client_secret) = &endpoint.client_secret {
		form.push(("client_secret".to_owned(), client_secret.clone()));
	}

	form
}

fn parse_token_response(body: &str) -> Result<TokenExchangeResponse> {
	let mut deserializer = serde_json::Deserializer::from_str(body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
		Error::ExchangeUnavailable {
			reason: "token endpoint returned malformed JSON".into(),
			source: Some(Box::new(source)),
		}
	})
}

// Only the structured OAuth error fields are summarized; arbitrary bodies are
// reduced to the status code so denial detail never leaks outward unvetted.
fn denial_reason(reply: &HttpReply) -> String {
	let parsed: TokenEndpointErrorBody = serde_json::from_str(&reply.body).unwrap_or_default();

	match (parsed.error, parsed.error_description) {
		(Some(error), Some(description)) => format!("{error}: {description}"),
		(Some(error), None) => error,
		_ => format!("token endpoint returned status {}", reply.status),
	}
}
