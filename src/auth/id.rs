//! Strongly typed connector identifier.

// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Connector identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Connector identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier exceeded the allowed character count.
	#[error("Connector identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Identifier the surrounding server assigned to a connector instance.
///
/// Carried in every span and log event so multiple GitHub connectors (e.g. public and
/// enterprise) can be told apart.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConnectorId(String);
impl ConnectorId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl AsRef<str> for ConnectorId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Debug for ConnectorId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Connector({})", self.0)
	}
}
impl Display for ConnectorId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace);
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_validate() {
		assert!(ConnectorId::new(" github").is_err(), "Leading whitespace must be rejected.");
		assert!(ConnectorId::new("").is_err());
		assert!(ConnectorId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());

		let id = ConnectorId::new("github-enterprise")
			.expect("Connector fixture should be considered valid.");

		assert_eq!(id.as_ref(), "github-enterprise");
		assert_eq!(format!("{id:?}"), "Connector(github-enterprise)");
	}
}
