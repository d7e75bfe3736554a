//! Connector contract consumed by the surrounding authorization server.
//!
//! The server drives a connector through three operations: build a login redirect
//! ([`CallbackConnector::login_url`]), turn the provider's callback into an [`Identity`]
//! ([`CallbackConnector::handle_callback`]), and later re-resolve that identity from its
//! opaque persisted state ([`RefreshConnector::refresh`]). Connectors keep no state
//! between calls; everything needed for a refresh travels in
//! [`Identity::connector_data`].

// crates.io
use url::form_urlencoded;
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Boxed future returned by connector operations.
pub type ConnectorFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Claims requested by the downstream client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scopes {
	/// The client wants to refresh the identity later, so connector state must be persisted.
	pub offline_access: bool,
	/// The client wants the `groups` claim.
	pub groups: bool,
}

/// Normalized identity produced by a connector on every login or refresh.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
	/// Stable upstream identifier.
	pub user_id: String,
	/// Display name, falling back to the login handle.
	pub username: String,
	/// Upstream login handle.
	pub preferred_username: String,
	/// Resolved email address.
	pub email: String,
	/// Whether the email address is verified upstream.
	pub email_verified: bool,
	/// Ordered, duplicate-free group claims.
	pub groups: Vec<String>,
	/// Opaque state persisted by the server and handed back on refresh.
	pub connector_data: Option<Vec<u8>>,
}

/// Query parameters of the provider's redirect back to the server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackRequest {
	/// Authorization code to exchange.
	pub code: Option<String>,
	/// OAuth error code, when the provider refused the authorization.
	pub error: Option<String>,
	/// Optional OAuth error description.
	pub error_description: Option<String>,
}
impl CallbackRequest {
	/// Creates a callback carrying an authorization code.
	pub fn with_code(code: impl Into<String>) -> Self {
		Self { code: Some(code.into()), ..Default::default() }
	}

	/// Extracts the callback parameters from the full redirect URL.
	pub fn from_url(url: &Url) -> Self {
		Self::from_query(url.query().unwrap_or_default())
	}

	/// Extracts the callback parameters from a raw query string.
	///
	/// Empty values are treated as absent, and the first occurrence of a key wins.
	pub fn from_query(query: &str) -> Self {
		let mut request = Self::default();

		for (key, value) in form_urlencoded::parse(query.as_bytes()) {
			if value.is_empty() {
				continue;
			}

			let slot = match &*key {
				"code" => &mut request.code,
				"error" => &mut request.error,
				"error_description" => &mut request.error_description,
				_ => continue,
			};

			if slot.is_none() {
				*slot = Some(value.into_owned());
			}
		}

		request
	}
}

/// Connector state persisted in [`Identity::connector_data`].
///
/// GitHub OAuth tokens never expire, so the access token alone is enough to refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorState {
	/// Upstream access token.
	#[serde(rename = "accessToken")]
	pub access_token: TokenSecret,
}
impl ConnectorState {
	/// Wraps an access token.
	pub fn new(access_token: TokenSecret) -> Self {
		Self { access_token }
	}

	/// Serializes the state into the opaque JSON bytes stored alongside the identity.
	pub fn encode(&self) -> Result<Vec<u8>> {
		serde_json::to_vec(self).map_err(Error::ConnectorState)
	}

	/// Restores the state from opaque bytes.
	pub fn decode(bytes: &[u8]) -> Result<Self> {
		serde_json::from_slice(bytes).map_err(Error::ConnectorState)
	}
}

/// Connector that authenticates users through a provider redirect.
pub trait CallbackConnector
where
	Self: Send + Sync,
{
	/// Builds the provider URL the end-user is redirected to.
	fn login_url(&self, scopes: &Scopes, callback_url: &str, state: &str) -> Result<Url>;

	/// Resolves the provider's redirect into an identity.
	fn handle_callback<'a>(
		&'a self,
		scopes: &'a Scopes,
		request: &'a CallbackRequest,
	) -> ConnectorFuture<'a, Identity>;
}

/// Connector able to re-resolve a previously issued identity.
pub trait RefreshConnector
where
	Self: Send + Sync,
{
	/// Refreshes `identity` from its persisted connector state.
	fn refresh<'a>(
		&'a self,
		scopes: &'a Scopes,
		identity: Identity,
	) -> ConnectorFuture<'a, Identity>;
}
