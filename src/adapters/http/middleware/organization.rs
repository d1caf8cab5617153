//! Organization extraction for axum.
//!
//! Requests on the staging surface act on behalf of one organization,
//! identified by the `X-Organization-Id` header. Upstream infrastructure
//! authenticates the caller and stamps the header; this extractor only
//! parses it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::OrganizationId;

pub const ORGANIZATION_HEADER: &str = "X-Organization-Id";

/// Extractor that requires an organization context on the request.
///
/// # Example
///
/// ```ignore
/// async fn my_handler(OrganizationContext(org): OrganizationContext) -> impl IntoResponse {
///     format!("acting for {}", org)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct OrganizationContext(pub OrganizationId);

impl<S> axum::extract::FromRequestParts<S> for OrganizationContext
where
    S: Send + Sync,
{
    type Rejection = OrganizationRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let header = parts
                .headers
                .get(ORGANIZATION_HEADER)
                .and_then(|h| h.to_str().ok())
                .ok_or(OrganizationRejection::Missing)?;

            header
                .parse::<OrganizationId>()
                .map(OrganizationContext)
                .map_err(|_| OrganizationRejection::Malformed)
        })
    }
}

/// Rejection type for a missing or unparseable organization header.
#[derive(Debug, Clone)]
pub enum OrganizationRejection {
    Missing,
    Malformed,
}

impl IntoResponse for OrganizationRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            OrganizationRejection::Missing => (
                StatusCode::UNAUTHORIZED,
                "Missing X-Organization-Id header",
            ),
            OrganizationRejection::Malformed => (
                StatusCode::BAD_REQUEST,
                "X-Organization-Id must be a UUID",
            ),
        };

        (
            status,
            Json(serde_json::json!({
                "error": message,
                "code": "ORGANIZATION_CONTEXT"
            })),
        )
            .into_response()
    }
}
