//! Authority-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated metadata ([`AuthorityDescriptor`]) covering the authority
//! URL, HTTPS-only authorize/token endpoints, enabled grants, and protocol quirks.
//! `strategy` defines [`AuthorityStrategy`], the hook the protocol exchange uses to classify
//! token endpoint failures and decorate outgoing form bodies.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
