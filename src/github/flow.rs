//! [`CallbackConnector`] and [`RefreshConnector`] for GitHub.

// crates.io
use oauth2::{
	AuthorizationCode, CsrfToken, HttpClientError, RequestTokenError, Scope, TokenResponse,
	basic::{BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, upstream_scopes},
	connector::{
		CallbackConnector, CallbackRequest, ConnectorFuture, ConnectorState, Identity,
		RefreshConnector, Scopes,
	},
	error::{TransportError, UpstreamError},
	github::{GitHubConnector, api::User},
	http::ApiClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl GitHubConnector {
	fn authorize_url(&self, scopes: &Scopes, callback_url: &str, state: &str) -> Result<Url> {
		if callback_url != self.redirect_uri {
			return Err(Error::RedirectMismatch {
				expected: self.redirect_uri.clone(),
				actual: callback_url.to_owned(),
			});
		}

		let (url, _) = self
			.oauth
			.authorize_url(|| CsrfToken::new(state.to_owned()))
			.add_scopes(
				upstream_scopes(self.groups_required(scopes))
					.iter()
					.map(|scope| Scope::new((*scope).to_owned())),
			)
			.url();

		Ok(url)
	}

	async fn exchange_code(&self, code: &str) -> Result<TokenSecret> {
		let response = self
			.oauth
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.request_async(&self.http)
			.await
			.map_err(|e| map_request_error(self.endpoints.token.as_str(), e))?;

		Ok(TokenSecret::new(response.access_token().secret().to_owned()))
	}

	// Fetches the profile and, when required, the groups that go with it.
	async fn resolve(
		&self,
		client: &ApiClient,
		scopes: &Scopes,
	) -> Result<(User, Option<Vec<String>>)> {
		let user = self.user(client).await?;
		let groups = if self.groups_required(scopes) {
			Some(self.groups(client, &user.login, scopes.groups).await?)
		} else {
			None
		};

		Ok((user, groups))
	}

	async fn callback(&self, scopes: &Scopes, request: &CallbackRequest) -> Result<Identity> {
		if let Some(code) = &request.error {
			return Err(Error::OAuth2Callback {
				code: code.clone(),
				description: request.error_description.clone(),
			});
		}

		let code = request.code.as_deref().ok_or(Error::MissingCode)?;
		let token = self.exchange_code(code).await?;
		let client = self.api_client(token.clone());
		let (user, groups) = self.resolve(&client, scopes).await?;
		let connector_data = if scopes.offline_access {
			Some(ConnectorState::new(token).encode()?)
		} else {
			None
		};

		Ok(Identity {
			user_id: self.id_source.user_id(&user),
			username: user.display_name().to_owned(),
			preferred_username: user.login.clone(),
			email: user.email.unwrap_or_default(),
			email_verified: true,
			groups: groups.unwrap_or_default(),
			connector_data,
		})
	}

	// The user id and connector data survive a refresh untouched.
	async fn refresh_identity(&self, scopes: &Scopes, mut identity: Identity) -> Result<Identity> {
		let data = identity
			.connector_data
			.as_deref()
			.filter(|data| !data.is_empty())
			.ok_or(Error::MissingConnectorState)?;
		let state = ConnectorState::decode(data)?;
		let client = self.api_client(state.access_token);
		let (user, groups) = self.resolve(&client, scopes).await?;

		identity.username = user.display_name().to_owned();
		identity.preferred_username = user.login.clone();
		identity.email = user.email.unwrap_or_default();

		if let Some(groups) = groups {
			identity.groups = groups;
		}

		Ok(identity)
	}
}
impl CallbackConnector for GitHubConnector {
	fn login_url(&self, scopes: &Scopes, callback_url: &str, state: &str) -> Result<Url> {
		const KIND: FlowKind = FlowKind::LoginUrl;

		let _guard = FlowSpan::new(KIND, "login_url", &self.id).entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		finish(KIND, self.authorize_url(scopes, callback_url, state))
	}

	fn handle_callback<'a>(
		&'a self,
		scopes: &'a Scopes,
		request: &'a CallbackRequest,
	) -> ConnectorFuture<'a, Identity> {
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND, "handle_callback", &self.id);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		Box::pin(async move {
			let result = span.instrument(self.callback(scopes, request)).await;

			finish(KIND, result)
		})
	}
}
impl RefreshConnector for GitHubConnector {
	fn refresh<'a>(
		&'a self,
		scopes: &'a Scopes,
		identity: Identity,
	) -> ConnectorFuture<'a, Identity> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh", &self.id);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		Box::pin(async move {
			let result = span.instrument(self.refresh_identity(scopes, identity)).await;

			finish(KIND, result)
		})
	}
}

fn finish<T>(kind: FlowKind, result: Result<T>) -> Result<T> {
	match &result {
		Ok(_) => obs::record_flow_outcome(kind, FlowOutcome::Success),
		Err(e) => {
			tracing::warn!(flow = kind.as_str(), error = %e, "connector flow failed");

			obs::record_flow_outcome(kind, FlowOutcome::Failure);
		},
	}

	result
}

// GitHub answers a rejected code with `200 OK` and an error document, which surfaces as a
// parse failure of the token response.
fn map_request_error(
	token_url: &str,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	match err {
		RequestTokenError::ServerResponse(response) =>
			Error::TokenExchange { reason: response.to_string() },
		RequestTokenError::Request(error) => map_transport_error(token_url, error),
		RequestTokenError::Parse(source, body) =>
			match serde_json::from_slice::<BasicErrorResponse>(&body) {
				Ok(response) => Error::TokenExchange { reason: response.to_string() },
				Err(_) => UpstreamError::TokenResponseParse { source }.into(),
			},
		RequestTokenError::Other(message) => Error::TokenExchange { reason: message },
	}
}

fn map_transport_error(token_url: &str, err: HttpClientError<ReqwestError>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(token_url, *inner).into(),
		HttpClientError::Http(inner) => TransportError::Http(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => Error::TokenExchange { reason: message },
		_ => Error::TokenExchange { reason: "unknown transport failure".into() },
	}
}
