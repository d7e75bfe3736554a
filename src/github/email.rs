//! Profile fetch and email resolution.

// self
use crate::{
	_prelude::*,
	github::{
		GitHubConnector, NOREPLY_DOMAIN,
		api::{User, UserEmail},
	},
	http::ApiClient,
};

impl GitHubConnector {
	/// Fetches the profile and settles on the email the identity carries.
	pub(crate) async fn user(&self, client: &ApiClient) -> Result<User> {
		let url = self.api_url(&["user"])?;
		let mut user = client.get::<User>(&url).await?.items;

		if self.noreply_private_email && self.is_public_host() {
			user.email = Some(format!("{}+{}@{NOREPLY_DOMAIN}", user.id, user.login));

			return Ok(user);
		}

		let has_public_email = user.email.as_deref().is_some_and(|email| !email.is_empty());

		if !has_public_email || self.preferred_email_domain.is_some() {
			user.email = Some(self.user_email(client).await?);
		}

		Ok(user)
	}

	// Pages are walked one at a time so a malformed address stops the crawl early.
	async fn user_email(&self, client: &ApiClient) -> Result<String> {
		let verify_all = self.host_name.is_some();
		let mut primary = None;
		let mut preferred = None;
		let mut next = Some(self.api_url(&["user", "emails"])?);

		while let Some(url) = next.take() {
			let page = client.get::<Vec<UserEmail>>(&url).await?;

			for entry in page.items {
				let verified = verify_all || entry.verified;

				if verified && entry.primary && primary.is_none() {
					primary = Some(entry.email.clone());
				}

				if let Some(pattern) = self.preferred_email_domain.as_deref() {
					let Some((_, domain)) = entry.email.split_once('@') else {
						return Err(Error::MalformedEmail { email: entry.email.clone() });
					};

					if verified && preferred.is_none() && domain_matches(pattern, domain) {
						preferred = Some(entry.email.clone());
					}
				}
			}

			next = page.next;
		}

		preferred.or(primary).ok_or(Error::NoUsableEmail)
	}
}

/// Matches an email domain against a preferred-domain pattern.
///
/// A pattern matches its exact text, or a domain with the same number of labels where every
/// pattern label is either equal to the domain label or `*`.
pub fn domain_matches(pattern: &str, domain: &str) -> bool {
	if pattern == domain {
		return true;
	}
	if pattern.split('.').count() != domain.split('.').count() {
		return false;
	}

	pattern
		.split('.')
		.zip(domain.split('.'))
		.all(|(expected, label)| expected == "*" || expected == label)
}
