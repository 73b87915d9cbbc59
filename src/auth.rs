//! Auth-domain value types: identifiers, correlation ids, prompt policy, users, scopes, and
//! cached token entries.

pub mod correlation;
pub mod id;
pub mod prompt;
pub mod scope;
pub mod token;
pub mod user;

pub use correlation::*;
pub use id::*;
pub use prompt::*;
pub use scope::*;
pub use token::{entry::*, secret::*};
pub use user::*;
