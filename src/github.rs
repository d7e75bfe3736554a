//! GitHub connector: endpoint layout, shared state, and the pieces that resolve identities.
//!
//! A [`GitHubConnector`] is built once from a validated
//! [`ConnectorConfig`](crate::config::ConnectorConfig) and is immutable afterwards. Every
//! login or refresh binds a fresh [`ApiClient`] to the user's token and walks the REST API
//! sequentially: profile, emails, and (when required) org membership and teams.

pub mod api;

mod email;
mod flow;
mod groups;

pub use self::{email::domain_matches, groups::GroupFilter};

// crates.io
use oauth2::{
	AuthType, AuthUrl, ClientId, ClientSecret, EndpointNotSet, EndpointSet, RedirectUrl, TokenUrl,
	basic::BasicClient,
};
// self
use crate::{
	_prelude::*,
	auth::{ConnectorId, TokenSecret},
	config::{TeamNameField, UserIdSource},
	connector::Scopes,
	error::ConfigError,
	http::{ApiClient, ReqwestHttpClient},
};

/// REST API root of public GitHub.
pub const PUBLIC_API_URL: &str = "https://api.github.com";
/// Web root of public GitHub, hosting the OAuth endpoints.
pub const PUBLIC_WEB_URL: &str = "https://github.com";
/// Domain of the per-user non-disclosing commit addresses on public GitHub.
pub const NOREPLY_DOMAIN: &str = "users.noreply.github.com";

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Endpoints a connector talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitHubEndpoints {
	/// REST API root, e.g. `https://api.github.com`.
	pub api: Url,
	/// OAuth authorization endpoint.
	pub authorization: Url,
	/// OAuth token endpoint.
	pub token: Url,
}
impl GitHubEndpoints {
	/// Creates an explicit endpoint set.
	pub fn new(api: Url, authorization: Url, token: Url) -> Self {
		Self { api, authorization, token }
	}

	/// Endpoints of public GitHub.
	pub fn public() -> Result<Self, ConfigError> {
		Self::from_roots("github.com", PUBLIC_API_URL, PUBLIC_WEB_URL)
	}

	/// Endpoints of a GitHub Enterprise host, e.g. `github.acme.internal`.
	pub fn enterprise(host: &str) -> Result<Self, ConfigError> {
		if host.contains('/') {
			return Err(ConfigError::HostNameContainsPath { host: host.to_owned() });
		}

		Self::from_roots(host, &format!("https://{host}/api/v3"), &format!("https://{host}"))
	}

	fn from_roots(host: &str, api: &str, web: &str) -> Result<Self, ConfigError> {
		let parse = |raw: String| {
			Url::parse(&raw)
				.map_err(|source| ConfigError::InvalidHostName { host: host.to_owned(), source })
		};

		Ok(Self {
			api: parse(api.to_owned())?,
			authorization: parse(format!("{web}/login/oauth/authorize"))?,
			token: parse(format!("{web}/login/oauth/access_token"))?,
		})
	}
}

/// Validated settings a [`GitHubConnector`] is built from.
pub(crate) struct ConnectorSettings {
	pub(crate) id: ConnectorId,
	pub(crate) client_id: String,
	pub(crate) client_secret: TokenSecret,
	pub(crate) redirect_uri: String,
	pub(crate) host_name: Option<String>,
	pub(crate) endpoints: GitHubEndpoints,
	pub(crate) http: ReqwestHttpClient,
	pub(crate) filter: GroupFilter,
	pub(crate) team_name_field: TeamNameField,
	pub(crate) id_source: UserIdSource,
	pub(crate) preferred_email_domain: Option<String>,
	pub(crate) noreply_private_email: bool,
}

/// Validated, immutable GitHub connector.
#[derive(Clone)]
pub struct GitHubConnector {
	id: ConnectorId,
	redirect_uri: String,
	host_name: Option<String>,
	endpoints: GitHubEndpoints,
	http: ReqwestHttpClient,
	oauth: ConfiguredBasicClient,
	filter: GroupFilter,
	team_name_field: TeamNameField,
	id_source: UserIdSource,
	preferred_email_domain: Option<String>,
	noreply_private_email: bool,
}
impl GitHubConnector {
	pub(crate) fn new(settings: ConnectorSettings) -> Result<Self, ConfigError> {
		let ConnectorSettings {
			id,
			client_id,
			client_secret,
			redirect_uri,
			host_name,
			endpoints,
			http,
			filter,
			team_name_field,
			id_source,
			preferred_email_domain,
			noreply_private_email,
		} = settings;
		let redirect = RedirectUrl::new(redirect_uri.clone())
			.map_err(|source| ConfigError::InvalidRedirect { uri: redirect_uri.clone(), source })?;
		let oauth = BasicClient::new(ClientId::new(client_id))
			.set_client_secret(ClientSecret::new(client_secret.expose().to_owned()))
			.set_auth_uri(AuthUrl::from_url(endpoints.authorization.clone()))
			.set_token_uri(TokenUrl::from_url(endpoints.token.clone()))
			.set_redirect_uri(redirect)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self {
			id,
			redirect_uri,
			host_name,
			endpoints,
			http,
			oauth,
			filter,
			team_name_field,
			id_source,
			preferred_email_domain,
			noreply_private_email,
		})
	}

	/// Replaces the HTTP client used for the token exchange and every REST call.
	///
	/// The replacement must not follow redirects.
	pub fn with_http_client(mut self, http: ReqwestHttpClient) -> Self {
		self.http = http;

		self
	}

	/// Points the connector at different endpoints, keeping every other setting.
	///
	/// The host name still decides enterprise semantics (email verification and the
	/// non-disclosing email shortcut).
	pub fn with_endpoints(mut self, endpoints: GitHubEndpoints) -> Self {
		self.oauth = self
			.oauth
			.set_auth_uri(AuthUrl::from_url(endpoints.authorization.clone()))
			.set_token_uri(TokenUrl::from_url(endpoints.token.clone()));
		self.endpoints = endpoints;

		self
	}

	/// Connector identifier assigned by the server.
	pub fn id(&self) -> &ConnectorId {
		&self.id
	}

	/// Endpoints in use.
	pub fn endpoints(&self) -> &GitHubEndpoints {
		&self.endpoints
	}

	/// Group filter derived from the configuration.
	pub fn group_filter(&self) -> &GroupFilter {
		&self.filter
	}

	/// Returns true if groups must be resolved for a request carrying `scopes`.
	///
	/// Org filters always require groups, since membership gates authorization.
	pub fn groups_required(&self, scopes: &Scopes) -> bool {
		self.filter.groups_required(scopes.groups)
	}

	fn api_client(&self, token: TokenSecret) -> ApiClient {
		ApiClient::new(self.http.clone(), token)
	}

	fn is_public_host(&self) -> bool {
		self.host_name.as_deref().is_none_or(|host| host == "github.com")
	}

	fn api_url(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.endpoints.api.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::InvalidEndpoint { url: self.endpoints.api.to_string() })?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}
}
impl Debug for GitHubConnector {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GitHubConnector")
			.field("id", &self.id)
			.field("redirect_uri", &self.redirect_uri)
			.field("host_name", &self.host_name)
			.field("endpoints", &self.endpoints)
			.field("filter", &self.filter)
			.field("team_name_field", &self.team_name_field)
			.field("id_source", &self.id_source)
			.field("preferred_email_domain", &self.preferred_email_domain)
			.field("noreply_private_email", &self.noreply_private_email)
			.finish_non_exhaustive()
	}
}
