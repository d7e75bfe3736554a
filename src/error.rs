//! Connector-level error types shared across configuration, transport, and flows.

// self
use crate::_prelude::*;

/// Connector-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical connector error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Upstream responded, but not in a way the connector can use.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The callback carried an OAuth `error` parameter instead of a code.
	#[error("{}", format_callback_error(.code, .description))]
	OAuth2Callback {
		/// OAuth error code supplied by the provider.
		code: String,
		/// Optional human-readable description.
		description: Option<String>,
	},
	/// The callback carried neither an error nor an authorization code.
	#[error("Callback is missing the authorization code.")]
	MissingCode,
	/// The callback URL supplied by the caller differs from the configured redirect URI.
	#[error(
		"Expected callback URL `{actual}` did not match the configured redirect URI `{expected}`."
	)]
	RedirectMismatch {
		/// Redirect URI from the connector configuration.
		expected: String,
		/// Callback URL supplied by the caller.
		actual: String,
	},
	/// Token endpoint rejected the authorization code.
	#[error("Failed to get token: {reason}.")]
	TokenExchange {
		/// Provider- or connector-supplied reason string.
		reason: String,
	},
	/// User is not a member of any required org or team.
	#[error("User `{user}` is not in the required orgs or teams.")]
	NotAuthorized {
		/// Login of the rejected user.
		user: String,
	},
	/// No verified primary or preferred-domain email could be found.
	#[error("User has no verified, primary email or preferred-domain email.")]
	NoUsableEmail,
	/// Upstream returned an email address without a domain part.
	#[error("Upstream returned an invalid email address `{email}`.")]
	MalformedEmail {
		/// The offending address.
		email: String,
	},
	/// Refresh was requested for an identity without persisted connector state.
	#[error("No upstream access token found.")]
	MissingConnectorState,
	/// Persisted connector state could not be encoded or decoded.
	#[error("Connector state is invalid.")]
	ConnectorState(#[source] serde_json::Error),
}

/// Configuration and validation failures raised while opening a connector.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Raw configuration document could not be parsed.
	#[error("Connector configuration could not be parsed.")]
	Parse(#[source] serde_json::Error),
	/// Legacy `org` and `orgs` were both supplied.
	#[error("Cannot use both `org` and `orgs` fields simultaneously.")]
	ConflictingOrgFilters,
	/// Host name is a URL or path rather than a bare host.
	#[error("Invalid hostname `{host}`: hostname cannot contain `/`.")]
	HostNameContainsPath {
		/// The rejected host name.
		host: String,
	},
	/// Host name cannot be turned into an HTTPS endpoint.
	#[error("Invalid hostname `{host}`.")]
	InvalidHostName {
		/// The rejected host name.
		host: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A root certificate was configured without an enterprise host.
	#[error("Host name field required for a root certificate file.")]
	RootCaWithoutHost,
	/// Root certificate file could not be read.
	#[error("Root certificate file `{path}` could not be read.")]
	RootCaRead {
		/// Path supplied in the configuration.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Root certificate file holds no usable certificate.
	#[error("Root certificate file `{path}` does not contain a PEM certificate.")]
	RootCaEmpty {
		/// Path supplied in the configuration.
		path: String,
	},
	/// Team name projection mode is not one of `name`, `slug`, or `both`.
	#[error("Unsupported team name field value `{value}`.")]
	UnsupportedTeamNameField {
		/// The rejected value.
		value: String,
	},
	/// Preferred email domain glob ends with a wildcard.
	#[error("Invalid preferred email domain `{domain}`: glob pattern cannot end with \"*\".")]
	InvalidPreferredEmailDomain {
		/// The rejected glob.
		domain: String,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI `{uri}` is invalid.")]
	InvalidRedirect {
		/// The rejected URI.
		uri: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint URL cannot be used as an API base.
	#[error("Endpoint `{url}` cannot be used as a base URL.")]
	InvalidEndpoint {
		/// The rejected URL.
		url: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Protocol failures: upstream answered, but the answer is unusable.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Non-2xx response.
	#[error("{status}: {body}")]
	Status {
		/// URL that was requested.
		url: String,
		/// Status line (code and canonical reason).
		status: String,
		/// Raw response body.
		body: String,
	},
	/// Response body could not be decoded into the expected shape.
	#[error("Failed to decode response from `{url}`.")]
	Decode {
		/// URL that was requested.
		url: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A `next` page link is not a valid absolute URL.
	#[error("Page link `{link}` returned by `{url}` is invalid.")]
	InvalidPageLink {
		/// URL that was requested.
		url: String,
		/// Raw link target.
		link: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Org membership check answered with a status that is neither member nor non-member.
	#[error("Unexpected membership status for org `{org}`: {status}.")]
	MembershipStatus {
		/// Org being checked.
		org: String,
		/// Status line returned by upstream.
		status: String,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling `{url}`.")]
	Network {
		/// URL that was requested.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// HTTP request could not be constructed.
	#[error(transparent)]
	Http(#[from] oauth2::http::Error),
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		url: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { url: url.into(), source: Box::new(src) }
	}
}

fn format_callback_error(code: &str, description: &Option<String>) -> String {
	match description {
		Some(description) => format!("{code}: {description}"),
		None => code.to_owned(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn callback_error_formats_code_and_description() {
		let err = Error::OAuth2Callback {
			code: "access_denied".into(),
			description: Some("user declined".into()),
		};

		assert_eq!(err.to_string(), "access_denied: user declined");

		let err = Error::OAuth2Callback { code: "access_denied".into(), description: None };

		assert_eq!(err.to_string(), "access_denied");
	}

	#[test]
	fn status_error_embeds_status_line_and_body() {
		let err: Error = UpstreamError::Status {
			url: "https://api.github.com/user".into(),
			status: "401 Unauthorized".into(),
			body: "{\"message\":\"Bad credentials\"}".into(),
		}
		.into();

		assert_eq!(err.to_string(), "401 Unauthorized: {\"message\":\"Bad credentials\"}");
	}
}
