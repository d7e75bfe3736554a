//! GitHub upstream-identity connector for identity brokers: OAuth 2.0 login against
//! github.com or GitHub Enterprise, org/team authorization and group claims, and verified
//! email resolution.
//!
//! Build a connector from its JSON configuration, then drive it through the
//! [`CallbackConnector`](connector::CallbackConnector) and
//! [`RefreshConnector`](connector::RefreshConnector) traits:
//!
//! ```no_run
//! use github_connector::{
//! 	auth::ConnectorId,
//! 	config::ConnectorConfig,
//! 	connector::{CallbackConnector, Scopes},
//! };
//!
//! # fn main() -> github_connector::error::Result<()> {
//! let config = ConnectorConfig::from_json(
//! 	r#"{"clientID":"id","clientSecret":"secret","redirectURI":"https://dex.example.com/callback"}"#,
//! )?;
//! let connector = config.open(ConnectorId::new("github").expect("valid id"))?;
//! let url = connector.login_url(
//! 	&Scopes { groups: true, ..Default::default() },
//! 	"https://dex.example.com/callback",
//! 	"state",
//! )?;
//!
//! println!("{url}");
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod connector;
pub mod error;
pub mod github;
pub mod http;
pub mod obs;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::http::{self, ReqwestHttpClient};

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	///
	/// Redirects stay disabled, as in every production client.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = http::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
	};

	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
