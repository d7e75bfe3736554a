#![cfg(feature = "test")]

// std
use std::{collections::HashMap, time::Duration};
// crates.io
use httpmock::prelude::*;
// self
use github_connector::{
	_preludet::test_reqwest_http_client,
	auth::{ConnectorId, TokenSecret},
	config::{ConnectorConfig, OrgFilter},
	connector::{
		CallbackConnector, CallbackRequest, ConnectorState, Identity, RefreshConnector, Scopes,
	},
	error::Error,
	github::{GitHubConnector, GitHubEndpoints},
	url::Url,
};

const CLIENT_ID: &str = "client-it";
const CLIENT_SECRET: &str = "secret-it";
const REDIRECT_URI: &str = "https://dex.example.com/callback";
const USER: &str = r#"{"id":7,"login":"octocat","name":"The Octocat","email":"octocat@github.com"}"#;

fn open(server: &MockServer, config: ConnectorConfig) -> GitHubConnector {
	let url = |path: &str| Url::parse(&server.url(path)).expect("Mock URL should parse.");
	let endpoints = GitHubEndpoints::new(
		url("/"),
		url("/login/oauth/authorize"),
		url("/login/oauth/access_token"),
	);
	let config = ConnectorConfig {
		client_id: CLIENT_ID.into(),
		client_secret: TokenSecret::new(CLIENT_SECRET),
		redirect_uri: REDIRECT_URI.into(),
		..config
	};

	config
		.open(ConnectorId::new("github").expect("Connector identifier should be valid."))
		.expect("Connector configuration should be valid.")
		.with_endpoints(endpoints)
		.with_http_client(test_reqwest_http_client())
}

fn query(url: &Url) -> HashMap<String, String> {
	url.query_pairs().into_owned().collect()
}

async fn mock_token<'a>(server: &'a MockServer, body: &'static str) -> httpmock::Mock<'a> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/login/oauth/access_token");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

async fn mock_user<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
	let bearer = format!("Bearer {token}");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/user").header("authorization", bearer);
			then.status(200).header("content-type", "application/json").body(USER);
		})
		.await
}

#[tokio::test]
async fn login_url_requests_minimal_scopes_without_groups() {
	let server = MockServer::start_async().await;
	let connector = open(&server, ConnectorConfig::default());
	let url = connector
		.login_url(&Scopes::default(), REDIRECT_URI, "state-123")
		.expect("Login URL should build.");
	let pairs = query(&url);

	assert_eq!(url.path(), "/login/oauth/authorize");
	assert_eq!(pairs.get("client_id").map(String::as_str), Some(CLIENT_ID));
	assert_eq!(pairs.get("redirect_uri").map(String::as_str), Some(REDIRECT_URI));
	assert_eq!(pairs.get("state").map(String::as_str), Some("state-123"));
	assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
	assert_eq!(pairs.get("scope").map(String::as_str), Some("user:email"));
}

#[tokio::test]
async fn login_url_adds_org_scope_when_groups_are_required() {
	let server = MockServer::start_async().await;
	let unfiltered = open(&server, ConnectorConfig::default());
	let groups = Scopes { groups: true, ..Default::default() };
	let url = unfiltered.login_url(&groups, REDIRECT_URI, "s").expect("Login URL should build.");
	let scopes = query(&url).remove("scope").expect("Scope parameter should be present.");

	assert!(scopes.split(' ').any(|scope| scope == "read:org"));
	assert!(scopes.split(' ').any(|scope| scope == "user:email"));

	let filtered = open(&server, ConnectorConfig {
		orgs: vec![OrgFilter::new("acme")],
		..Default::default()
	});
	let url = filtered
		.login_url(&Scopes::default(), REDIRECT_URI, "s")
		.expect("Login URL should build.");
	let scopes = query(&url).remove("scope").expect("Scope parameter should be present.");

	assert!(scopes.split(' ').any(|scope| scope == "read:org"));
}

#[tokio::test]
async fn login_url_rejects_foreign_callback() {
	let server = MockServer::start_async().await;
	let connector = open(&server, ConnectorConfig::default());
	let err = connector
		.login_url(&Scopes::default(), "https://evil.example.com/callback", "s")
		.expect_err("Mismatched callbacks must be rejected.");

	match err {
		Error::RedirectMismatch { expected, actual } => {
			assert_eq!(expected, REDIRECT_URI);
			assert_eq!(actual, "https://evil.example.com/callback");
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn callback_error_surfaces_code_and_description() {
	let server = MockServer::start_async().await;
	let connector = open(&server, ConnectorConfig::default());
	let request = CallbackRequest::from_query(
		"error=access_denied&error_description=The+user+has+denied+your+application&state=s",
	);
	let err = connector
		.handle_callback(&Scopes::default(), &request)
		.await
		.expect_err("Callback errors must surface.");

	assert!(matches!(err, Error::OAuth2Callback { .. }));
	assert_eq!(err.to_string(), "access_denied: The user has denied your application");

	let err = connector
		.handle_callback(&Scopes::default(), &CallbackRequest::default())
		.await
		.expect_err("A callback without a code must fail.");

	assert!(matches!(err, Error::MissingCode));
}

#[tokio::test]
async fn callback_exchanges_code_and_persists_offline_state() {
	let server = MockServer::start_async().await;
	let connector = open(&server, ConnectorConfig::default());
	let token = mock_token(&server, r#"{"access_token":"gho_abc","token_type":"bearer"}"#).await;
	let user = mock_user(&server, "gho_abc").await;
	let scopes = Scopes { offline_access: true, ..Default::default() };
	let identity = connector
		.handle_callback(&scopes, &CallbackRequest::with_code("code-123"))
		.await
		.expect("Callback should resolve an identity.");

	token.assert_async().await;
	user.assert_async().await;

	assert_eq!(identity.user_id, "7");
	assert_eq!(identity.username, "The Octocat");
	assert_eq!(identity.preferred_username, "octocat");
	assert_eq!(identity.email, "octocat@github.com");
	assert!(identity.email_verified);
	assert!(identity.groups.is_empty());

	let data = identity.connector_data.expect("Offline access should persist connector state.");
	let state = ConnectorState::decode(&data).expect("Connector state should decode.");

	assert_eq!(state.access_token.expose(), "gho_abc");
}

#[tokio::test]
async fn callback_without_offline_access_keeps_no_state() {
	let server = MockServer::start_async().await;
	let connector = open(&server, ConnectorConfig { use_login_as_id: true, ..Default::default() });
	let _token = mock_token(&server, r#"{"access_token":"gho_abc","token_type":"bearer"}"#).await;
	let _user = mock_user(&server, "gho_abc").await;
	let identity = connector
		.handle_callback(&Scopes::default(), &CallbackRequest::with_code("code-123"))
		.await
		.expect("Callback should resolve an identity.");

	assert_eq!(identity.user_id, "octocat");
	assert!(identity.connector_data.is_none());
}

#[tokio::test]
async fn callback_maps_github_error_document_to_token_exchange_error() {
	let server = MockServer::start_async().await;
	let connector = open(&server, ConnectorConfig::default());
	let _token = mock_token(
		&server,
		r#"{"error":"bad_verification_code","error_description":"The code passed is incorrect or expired."}"#,
	)
	.await;
	let err = connector
		.handle_callback(&Scopes::default(), &CallbackRequest::with_code("stale"))
		.await
		.expect_err("Rejected codes must fail.");

	match err {
		Error::TokenExchange { reason } => assert!(reason.contains("bad_verification_code")),
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn refresh_requires_connector_state() {
	let server = MockServer::start_async().await;
	let connector = open(&server, ConnectorConfig::default());
	let err = connector
		.refresh(&Scopes::default(), Identity { user_id: "7".into(), ..Default::default() })
		.await
		.expect_err("Refresh without state must fail.");

	assert!(matches!(err, Error::MissingConnectorState));

	let err = connector
		.refresh(&Scopes::default(), Identity {
			connector_data: Some(b"not-json".to_vec()),
			..Default::default()
		})
		.await
		.expect_err("Refresh with corrupt state must fail.");

	assert!(matches!(err, Error::ConnectorState(_)));
}

#[tokio::test]
async fn refresh_rewrites_profile_and_keeps_user_id() {
	let server = MockServer::start_async().await;
	let connector = open(&server, ConnectorConfig::default());
	let user = mock_user(&server, "gho_stored").await;
	let data = ConnectorState::new(TokenSecret::new("gho_stored"))
		.encode()
		.expect("Connector state should encode.");
	let previous = Identity {
		user_id: "7".into(),
		username: "Old Name".into(),
		preferred_username: "old-login".into(),
		email: "old@example.com".into(),
		email_verified: true,
		groups: Vec::new(),
		connector_data: Some(data.clone()),
	};
	let refreshed = connector
		.refresh(&Scopes::default(), previous)
		.await
		.expect("Refresh should succeed.");

	user.assert_async().await;

	assert_eq!(refreshed.user_id, "7");
	assert_eq!(refreshed.username, "The Octocat");
	assert_eq!(refreshed.preferred_username, "octocat");
	assert_eq!(refreshed.email, "octocat@github.com");
	assert_eq!(refreshed.connector_data, Some(data));
}

#[tokio::test]
async fn caller_timeout_cancels_slow_login() {
	let server = MockServer::start_async().await;
	let connector = open(&server, ConnectorConfig::default());
	let _token = mock_token(&server, r#"{"access_token":"gho_abc","token_type":"bearer"}"#).await;
	let _user = server
		.mock_async(|when, then| {
			when.method(GET).path("/user");
			then.status(200)
				.header("content-type", "application/json")
				.body(USER)
				.delay(Duration::from_secs(5));
		})
		.await;
	let request = CallbackRequest::with_code("code-123");
	let outcome = tokio::time::timeout(
		Duration::from_millis(300),
		connector.handle_callback(&Scopes::default(), &request),
	)
	.await;

	assert!(outcome.is_err(), "The callback should be cancelled by the caller's deadline.");
}
