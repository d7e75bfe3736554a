//! Transport primitives for GitHub API calls and OAuth token exchanges.
//!
//! [`ReqwestHttpClient`] is the single HTTP stack the connector uses. It never follows
//! redirects (org membership checks report non-membership with a `302`) and, when an
//! enterprise root certificate is configured, trusts only that root. The same client backs
//! the `oauth2` code exchange through its [`AsyncHttpClient`] implementation and the
//! token-bound [`ApiClient`] used for every REST call.

pub mod link;

// std
use std::{fs, ops::Deref, path::Path};
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::{
	Certificate, ClientBuilder, Response, StatusCode,
	header::{ACCEPT, LINK},
	redirect::Policy,
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransportError, UpstreamError},
};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const GITHUB_JSON: &str = "application/vnd.github+json";

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// Configure any custom client to disable redirect following, otherwise membership
	/// checks cannot observe GitHub's `302` non-member answer.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that trusts the platform's built-in roots.
	pub fn new() -> Result<Self, ConfigError> {
		Ok(Self(builder().build()?))
	}

	/// Builds a client that trusts only the certificates in the PEM bundle at `path`.
	pub fn with_root_ca(path: &Path) -> Result<Self, ConfigError> {
		let display = path.display().to_string();
		let pem = fs::read(path)
			.map_err(|source| ConfigError::RootCaRead { path: display.clone(), source })?;
		let certs = Certificate::from_pem_bundle(&pem)?;

		if certs.is_empty() {
			return Err(ConfigError::RootCaEmpty { path: display });
		}

		let mut builder = builder().tls_built_in_root_certs(false);

		for cert in certs {
			builder = builder.add_root_certificate(cert);
		}

		Ok(Self(builder.build()?))
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl<'c> AsyncHttpClient<'c> for ReqwestHttpClient {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// One decoded response plus the URL of the page that follows it, if any.
#[derive(Clone, Debug)]
pub struct Page<T> {
	/// Decoded response body.
	pub items: T,
	/// Next page to fetch; `None` ends the crawl.
	pub next: Option<Url>,
}

/// GitHub REST client bound to a single access token.
///
/// A fresh client is built for every login or refresh from the token that call obtained,
/// so no credential is ever shared between users.
#[derive(Clone)]
pub struct ApiClient {
	http: ReqwestHttpClient,
	token: TokenSecret,
}
impl ApiClient {
	/// Binds `token` to the shared transport.
	pub fn new(http: ReqwestHttpClient, token: TokenSecret) -> Self {
		Self { http, token }
	}

	/// Issues `GET url`, decodes the JSON body, and extracts the next page link.
	///
	/// Non-2xx responses fail with the status line and raw body. Nothing is retried.
	pub async fn get<T>(&self, url: &Url) -> Result<Page<T>>
	where
		T: DeserializeOwned,
	{
		let response = self.send(url).await?;
		let status = response.status();

		if !status.is_success() {
			let body = response
				.text()
				.await
				.map_err(|e| TransportError::network(url.as_str(), e))?;

			return Err(UpstreamError::Status {
				url: url.to_string(),
				status: status.to_string(),
				body,
			}
			.into());
		}

		let links = link_header(&response);
		let bytes =
			response.bytes().await.map_err(|e| TransportError::network(url.as_str(), e))?;
		let mut de = serde_json::Deserializer::from_slice(&bytes);
		let items = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| UpstreamError::Decode { url: url.to_string(), source })?;
		let next = match link::next_page(url, &links) {
			Some(next) => Some(Url::parse(&next).map_err(|source| {
				UpstreamError::InvalidPageLink { url: url.to_string(), link: next.clone(), source }
			})?),
			None => None,
		};

		Ok(Page { items, next })
	}

	/// Follows the page sequence starting at `url` and concatenates every page in order.
	pub async fn get_all<T>(&self, url: Url) -> Result<Vec<T>>
	where
		T: DeserializeOwned,
	{
		let mut items = Vec::new();
		let mut next = Some(url);

		while let Some(url) = next.take() {
			let page = self.get::<Vec<T>>(&url).await?;

			tracing::debug!(url = url.as_str(), count = page.items.len(), "fetched page");

			items.extend(page.items);
			next = page.next;
		}

		Ok(items)
	}

	/// Issues `GET url` and returns only the status code, leaving interpretation to the caller.
	pub async fn status(&self, url: &Url) -> Result<StatusCode> {
		Ok(self.send(url).await?.status())
	}

	async fn send(&self, url: &Url) -> Result<Response> {
		self.http
			.get(url.clone())
			.bearer_auth(self.token.expose())
			.header(ACCEPT, GITHUB_JSON)
			.send()
			.await
			.map_err(|e| TransportError::network(url.as_str(), e).into())
	}
}
impl Debug for ApiClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient").field("token", &self.token).finish()
	}
}

pub(crate) fn builder() -> ClientBuilder {
	ReqwestClient::builder().user_agent(USER_AGENT).redirect(Policy::none())
}

fn link_header(response: &Response) -> String {
	response
		.headers()
		.get_all(LINK)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.collect::<Vec<_>>()
		.join(", ")
}
