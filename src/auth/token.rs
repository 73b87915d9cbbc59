//! Token material held by the cache: redacted secrets and immutable cache entries.

pub mod entry;
pub mod secret;
