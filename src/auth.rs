//! Connector identifiers, upstream scope sets, and redacted token secrets.

pub mod id;
pub mod scope;
pub mod secret;

pub use id::*;
pub use scope::*;
pub use secret::*;
