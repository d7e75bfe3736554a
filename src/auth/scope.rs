//! Upstream OAuth scopes requested from GitHub.

/// GitHub requires this scope to access `/user` and `/user/emails`.
pub const SCOPE_EMAIL: &str = "user:email";
/// GitHub requires this scope to access `/user/teams`, `/user/orgs`, and org membership.
pub const SCOPE_ORGS: &str = "read:org";

/// Scopes requested from GitHub; `read:org` is only added when groups must be resolved.
pub fn upstream_scopes(groups_required: bool) -> &'static [&'static str] {
	if groups_required { &[SCOPE_EMAIL, SCOPE_ORGS] } else { &[SCOPE_EMAIL] }
}
