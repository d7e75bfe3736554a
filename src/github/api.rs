//! GitHub REST payloads, limited to the fields the connector reads.

// self
use crate::_prelude::*;

/// Authenticated user, as returned by `GET /user`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// Immutable numeric account id.
	pub id: u64,
	/// Login handle.
	pub login: String,
	/// Profile display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Public email; `/user` never returns private addresses.
	#[serde(default)]
	pub email: Option<String>,
}
impl User {
	/// Display name, falling back to the login when unset.
	pub fn display_name(&self) -> &str {
		self.name.as_deref().filter(|name| !name.is_empty()).unwrap_or(&self.login)
	}
}

/// Entry of `GET /user/orgs`, also embedded in team payloads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Org {
	/// Org login.
	pub login: String,
}

/// Entry of `GET /user/teams`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
	/// Team display name.
	pub name: String,
	/// URL-safe team slug.
	pub slug: String,
	/// Owning org.
	pub organization: Org,
}

/// Entry of `GET /user/emails`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEmail {
	/// Address.
	pub email: String,
	/// Whether GitHub verified the address.
	#[serde(default)]
	pub verified: bool,
	/// Whether this is the account's primary address.
	#[serde(default)]
	pub primary: bool,
	/// `public`, `private`, or absent.
	#[serde(default)]
	pub visibility: Option<String>,
}
