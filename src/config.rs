//! Connector configuration and the factory that validates it into a [`GitHubConnector`].
//!
//! The document shape matches the JSON accepted by existing GitHub connector deployments:
//!
//! ```json
//! {
//!   "clientID": "...",
//!   "clientSecret": "...",
//!   "redirectURI": "https://dex.example.com/callback",
//!   "orgs": [{ "name": "acme", "teams": ["platform"] }],
//!   "teamNameField": "slug"
//! }
//! ```

// std
use std::path::PathBuf;
// self
use crate::{
	_prelude::*,
	auth::{ConnectorId, TokenSecret},
	error::ConfigError,
	github::{
		ConnectorSettings, GitHubConnector, GitHubEndpoints, GroupFilter,
		api::{Team, User},
	},
	http::ReqwestHttpClient,
};

/// Raw connector configuration, prior to validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectorConfig {
	/// OAuth application client identifier.
	#[serde(rename = "clientID")]
	pub client_id: String,
	/// OAuth application client secret.
	pub client_secret: TokenSecret,
	/// Redirect URI registered with the OAuth application.
	#[serde(rename = "redirectURI")]
	pub redirect_uri: String,
	/// Legacy single-org filter; superseded by [`orgs`](Self::orgs).
	pub org: Option<String>,
	/// Ordered org filters with optional team allow-lists.
	pub orgs: Vec<OrgFilter>,
	/// GitHub Enterprise host name (no scheme, no path).
	pub host_name: Option<String>,
	/// PEM bundle trusted instead of the built-in roots; requires [`host_name`](Self::host_name).
	#[serde(rename = "rootCA")]
	pub root_ca: Option<PathBuf>,
	/// Which team attribute becomes the group claim: `name` (also when empty), `slug`, or
	/// `both`.
	pub team_name_field: String,
	/// Without org filters, load every org and team as groups when the client asks for them.
	pub load_all_groups: bool,
	/// Use the login handle instead of the numeric id as the stable user id.
	#[serde(rename = "useLoginAsID")]
	pub use_login_as_id: bool,
	/// Domain glob preferred among the user's verified emails, e.g. `*.example.com`.
	pub preferred_email_domain: Option<String>,
	/// Use `{id}+{login}@users.noreply.github.com` as the email on public GitHub.
	pub noreply_private_email: bool,
}
impl ConnectorConfig {
	/// Parses a JSON configuration document.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		serde_json::from_str(raw).map_err(ConfigError::Parse)
	}

	/// Validates the configuration and builds an immutable connector.
	///
	/// Nothing is constructed when validation fails.
	pub fn open(self, id: ConnectorId) -> Result<GitHubConnector, ConfigError> {
		let org = non_empty(self.org);

		if org.is_some() {
			if !self.orgs.is_empty() {
				return Err(ConfigError::ConflictingOrgFilters);
			}

			tracing::warn!(
				connector = %id,
				"legacy field `org` being used, switch to the newer `orgs` field structure"
			);
		}

		let host_name = non_empty(self.host_name);
		let endpoints = match host_name.as_deref() {
			Some(host) => GitHubEndpoints::enterprise(host)?,
			None => GitHubEndpoints::public()?,
		};
		let root_ca = self.root_ca.filter(|path| !path.as_os_str().is_empty());
		let http = match root_ca {
			Some(path) => {
				if host_name.is_none() {
					return Err(ConfigError::RootCaWithoutHost);
				}

				ReqwestHttpClient::with_root_ca(&path)?
			},
			None => ReqwestHttpClient::new()?,
		};
		let preferred_email_domain = non_empty(self.preferred_email_domain);

		if let Some(domain) = preferred_email_domain.as_deref().filter(|domain| domain.ends_with('*'))
		{
			return Err(ConfigError::InvalidPreferredEmailDomain { domain: domain.to_owned() });
		}

		let team_name_field = self.team_name_field.parse::<TeamNameField>()?;
		let filter = match org {
			Some(org) => GroupFilter::LegacyOrg(org),
			None if !self.orgs.is_empty() => GroupFilter::Orgs(self.orgs),
			None => GroupFilter::Unfiltered { load_all_groups: self.load_all_groups },
		};
		let id_source =
			if self.use_login_as_id { UserIdSource::Login } else { UserIdSource::NumericId };

		GitHubConnector::new(ConnectorSettings {
			id,
			client_id: self.client_id,
			client_secret: self.client_secret,
			redirect_uri: self.redirect_uri,
			host_name,
			endpoints,
			http,
			filter,
			team_name_field,
			id_source,
			preferred_email_domain,
			noreply_private_email: self.noreply_private_email,
		})
	}
}

/// Org filter with an optional team allow-list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgFilter {
	/// Org login. Only members of this org can authenticate.
	pub name: String,
	/// Team allow-list. When non-empty, members must belong to at least one listed team.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub teams: Vec<String>,
}
impl OrgFilter {
	/// Creates a filter admitting every member of `name`.
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), teams: Vec::new() }
	}

	/// Restricts the filter to the listed teams.
	pub fn with_teams<I, S>(mut self, teams: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.teams = teams.into_iter().map(Into::into).collect();

		self
	}

	/// Returns true if the filter restricts membership to specific teams.
	pub fn is_team_restricted(&self) -> bool {
		!self.teams.is_empty()
	}

	/// Returns true if `claim` is on the team allow-list.
	pub fn allows(&self, claim: &str) -> bool {
		self.teams.iter().any(|allowed| allowed == claim)
	}
}

/// Team attribute(s) projected into group claims.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TeamNameField {
	/// Team display name.
	#[default]
	Name,
	/// URL-safe team slug.
	Slug,
	/// Display name followed by slug, as separate claims.
	Both,
}
impl TeamNameField {
	/// Returns a stable label matching the configuration value.
	pub const fn as_str(self) -> &'static str {
		match self {
			TeamNameField::Name => "name",
			TeamNameField::Slug => "slug",
			TeamNameField::Both => "both",
		}
	}

	/// Projects a team into its claim strings, in emission order.
	pub fn claims(self, team: &Team) -> Vec<&str> {
		match self {
			TeamNameField::Name => vec![team.name.as_str()],
			TeamNameField::Slug => vec![team.slug.as_str()],
			TeamNameField::Both => vec![team.name.as_str(), team.slug.as_str()],
		}
	}
}
impl Display for TeamNameField {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for TeamNameField {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"" | "name" => Ok(TeamNameField::Name),
			"slug" => Ok(TeamNameField::Slug),
			"both" => Ok(TeamNameField::Both),
			other => Err(ConfigError::UnsupportedTeamNameField { value: other.to_owned() }),
		}
	}
}

/// Which upstream attribute becomes [`Identity::user_id`](crate::connector::Identity::user_id).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UserIdSource {
	/// Immutable numeric account id.
	#[default]
	NumericId,
	/// Login handle, which the user may rename.
	Login,
}
impl UserIdSource {
	/// Derives the stable user id for `user`.
	pub fn user_id(self, user: &User) -> String {
		match self {
			UserIdSource::NumericId => user.id.to_string(),
			UserIdSource::Login => user.login.clone(),
		}
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn team(name: &str, slug: &str) -> Team {
		Team {
			name: name.into(),
			slug: slug.into(),
			organization: crate::github::api::Org { login: "acme".into() },
		}
	}

	#[test]
	fn team_name_field_parses_known_values_only() {
		assert_eq!(TeamNameField::from_str("").expect("Empty selects the default."), TeamNameField::Name);
		assert_eq!(TeamNameField::from_str("slug").expect("Slug is supported."), TeamNameField::Slug);
		assert_eq!(TeamNameField::from_str("both").expect("Both is supported."), TeamNameField::Both);
		assert!(matches!(
			TeamNameField::from_str("id"),
			Err(ConfigError::UnsupportedTeamNameField { .. })
		));
	}

	#[test]
	fn team_name_field_projects_claims() {
		let team = team("Platform Team", "platform-team");

		assert_eq!(TeamNameField::Name.claims(&team), ["Platform Team"]);
		assert_eq!(TeamNameField::Slug.claims(&team), ["platform-team"]);
		assert_eq!(TeamNameField::Both.claims(&team), ["Platform Team", "platform-team"]);
	}

	#[test]
	fn org_filter_matches_claims_exactly() {
		let by_slug = OrgFilter::new("acme").with_teams(["platform-team"]);

		assert!(by_slug.is_team_restricted());
		assert!(by_slug.allows("platform-team"));
		assert!(!by_slug.allows("Platform Team"));
		assert!(!OrgFilter::new("acme").is_team_restricted());
	}

	#[test]
	fn config_parses_json_field_names() {
		let config = ConnectorConfig::from_json(
			r#"{
				"clientID": "client",
				"clientSecret": "secret",
				"redirectURI": "https://dex.example.com/callback",
				"orgs": [{"name": "acme", "teams": ["platform"]}, {"name": "initech"}],
				"hostName": "github.acme.internal",
				"teamNameField": "both",
				"useLoginAsID": true,
				"preferredEmailDomain": "*.acme.com"
			}"#,
		)
		.expect("Configuration fixture should parse.");

		assert_eq!(config.client_id, "client");
		assert_eq!(config.client_secret.expose(), "secret");
		assert_eq!(config.orgs, [
			OrgFilter::new("acme").with_teams(["platform"]),
			OrgFilter::new("initech")
		]);
		assert_eq!(config.host_name.as_deref(), Some("github.acme.internal"));
		assert_eq!(config.team_name_field, "both");
		assert!(config.use_login_as_id);
		assert!(!config.load_all_groups);
	}

	#[test]
	fn open_rejects_unknown_team_name_field() {
		let config = ConnectorConfig::from_json(
			r#"{"clientID":"client","redirectURI":"https://dex.example.com/callback","teamNameField":"id"}"#,
		)
		.expect("Unknown values are only checked when opening.");
		let err = config
			.open(ConnectorId::new("github").expect("Connector fixture should be valid."))
			.expect_err("Unknown team name fields must be rejected.");

		match err {
			ConfigError::UnsupportedTeamNameField { value } => assert_eq!(value, "id"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
