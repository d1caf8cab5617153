//! HTTP middleware and extractors.

mod organization;

pub use organization::{OrganizationContext, OrganizationRejection};
