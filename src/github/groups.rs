//! Org and team resolution, and the authorization decisions made from them.

// std
use std::collections::HashSet;
// crates.io
use reqwest::StatusCode;
// self
use crate::{
	_prelude::*,
	config::OrgFilter,
	error::UpstreamError,
	github::{
		GitHubConnector,
		api::{Org, Team},
	},
	http::ApiClient,
};

/// Group policy derived from the configuration. Exactly one mode applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupFilter {
	/// Users must belong to at least one listed org (and an allowed team where listed).
	Orgs(Vec<OrgFilter>),
	/// Legacy single-org mode: the user's teams in that org become the groups.
	LegacyOrg(String),
	/// No org filter; every org and team is loaded when enabled and groups are requested.
	Unfiltered {
		/// Load all orgs and teams for the `groups` scope.
		load_all_groups: bool,
	},
}
impl GroupFilter {
	/// Returns true if groups must be resolved, given whether the client asked for them.
	pub fn groups_required(&self, group_scope: bool) -> bool {
		match self {
			GroupFilter::Orgs(_) | GroupFilter::LegacyOrg(_) => true,
			GroupFilter::Unfiltered { .. } => group_scope,
		}
	}
}
impl Default for GroupFilter {
	fn default() -> Self {
		Self::Unfiltered { load_all_groups: false }
	}
}

impl GitHubConnector {
	/// Resolves the user's groups under the configured policy.
	///
	/// The result keeps first-seen order with duplicates removed.
	pub(crate) async fn groups(
		&self,
		client: &ApiClient,
		login: &str,
		group_scope: bool,
	) -> Result<Vec<String>> {
		let groups = match &self.filter {
			GroupFilter::Orgs(orgs) => self.groups_for_orgs(client, login, orgs).await?,
			GroupFilter::LegacyOrg(org) => self.teams_in_org(client, org).await?,
			GroupFilter::Unfiltered { load_all_groups: true } if group_scope =>
				self.user_groups(client).await?,
			GroupFilter::Unfiltered { .. } => Vec::new(),
		};

		Ok(dedup(groups))
	}

	// Authorized iff at least one org admits the user, either without a team restriction or
	// through a non-empty set of allowed team claims.
	async fn groups_for_orgs(
		&self,
		client: &ApiClient,
		login: &str,
		orgs: &[OrgFilter],
	) -> Result<Vec<String>> {
		let mut groups = Vec::new();
		let mut in_unrestricted_org = false;

		for org in orgs {
			if !self.user_in_org(client, login, &org.name).await? {
				continue;
			}
			if !org.is_team_restricted() {
				in_unrestricted_org = true;

				continue;
			}

			let allowed = self
				.teams_in_org(client, &org.name)
				.await?
				.into_iter()
				.filter(|claim| org.allows(claim))
				.map(|claim| format_team_name(&org.name, &claim))
				.collect::<Vec<_>>();

			if allowed.is_empty() {
				tracing::info!(user = login, org = org.name.as_str(), "user in org but no teams");
			}

			groups.extend(allowed);
		}

		if in_unrestricted_org || !groups.is_empty() {
			Ok(groups)
		} else {
			Err(Error::NotAuthorized { user: login.to_owned() })
		}
	}

	// The requester is the user, so a non-member gets a 404 (or a 302 when the app may not
	// read the org).
	async fn user_in_org(&self, client: &ApiClient, login: &str, org: &str) -> Result<bool> {
		let url = self.api_url(&["orgs", org, "members", login])?;

		match client.status(&url).await? {
			StatusCode::NO_CONTENT => Ok(true),
			StatusCode::FOUND | StatusCode::NOT_FOUND => {
				tracing::info!(
					user = login,
					org,
					"user not in org or application not authorized to read org data"
				);

				Ok(false)
			},
			status => Err(UpstreamError::MembershipStatus {
				org: org.to_owned(),
				status: status.to_string(),
			}
			.into()),
		}
	}

	async fn teams_in_org(&self, client: &ApiClient, org: &str) -> Result<Vec<String>> {
		let teams = client.get_all::<Team>(self.api_url(&["user", "teams"])?).await?;

		Ok(teams
			.iter()
			.filter(|team| team.organization.login == org)
			.flat_map(|team| self.team_name_field.claims(team))
			.map(str::to_owned)
			.collect())
	}

	async fn user_groups(&self, client: &ApiClient) -> Result<Vec<String>> {
		let orgs = client.get_all::<Org>(self.api_url(&["user", "orgs"])?).await?;
		let teams = client.get_all::<Team>(self.api_url(&["user", "teams"])?).await?;
		let mut groups = Vec::new();

		for org in orgs {
			groups.push(org.login.clone());

			for team in teams.iter().filter(|team| team.organization.login == org.login) {
				for claim in self.team_name_field.claims(team) {
					groups.push(format_team_name(&org.login, claim));
				}
			}
		}

		Ok(groups)
	}
}

/// Org-qualified group name; team names are only unique within an org.
pub fn format_team_name(org: &str, team: &str) -> String {
	format!("{org}:{team}")
}

fn dedup(mut groups: Vec<String>) -> Vec<String> {
	let mut seen = HashSet::new();

	groups.retain(|group| seen.insert(group.clone()));

	groups
}
