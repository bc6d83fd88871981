// Request identity extractors
// The upstream gateway authenticates callers and forwards their identity as headers

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// Staff identity for tenant-scoped routes
///
/// Extracted from the `x-tenant-id` and `x-staff-id` headers set by the
/// gateway after it has authenticated the staff member.
#[derive(Debug, Clone)]
pub struct StaffContext {
    pub tenant_id: Uuid,
    pub staff_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for StaffContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant_id = header_uuid(parts, "x-tenant-id")?;
        let staff_id = header_uuid(parts, "x-staff-id")?;

        Ok(StaffContext {
            tenant_id,
            staff_id,
        })
    }
}

/// Client (pet owner) identity for client-facing routes
///
/// Extracted from the `x-client-id` header set by the gateway.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub client_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let client_id = header_uuid(parts, "x-client-id")?;

        Ok(ClientContext { client_id })
    }
}

/// Read a required UUID header, rejecting the request when it is missing or malformed
fn header_uuid(parts: &Parts, name: &str) -> Result<Uuid, ApiError> {
    let raw = parts
        .headers
        .get(name)
        .ok_or_else(|| {
            tracing::debug!("Missing {} header", name);
            ApiError::Unauthorized(format!("Missing {} header", name))
        })?
        .to_str()
        .map_err(|_| ApiError::Unauthorized(format!("Invalid {} header", name)))?;

    Uuid::parse_str(raw).map_err(|_| {
        tracing::debug!("Malformed {} header: {}", name, raw);
        ApiError::Unauthorized(format!("Invalid {} header", name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    // Helper to build request parts with the given headers
    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_staff_context_accepts_valid_headers() {
        let tenant_id = Uuid::new_v4();
        let staff_id = Uuid::new_v4();
        let mut parts = parts_with_headers(&[
            ("x-tenant-id", &tenant_id.to_string()),
            ("x-staff-id", &staff_id.to_string()),
        ]);

        let result = StaffContext::from_request_parts(&mut parts, &()).await;

        assert!(result.is_ok());
        let ctx = result.unwrap();
        assert_eq!(ctx.tenant_id, tenant_id);
        assert_eq!(ctx.staff_id, staff_id);
    }

    #[tokio::test]
    async fn test_staff_context_rejects_missing_tenant_header() {
        let staff_id = Uuid::new_v4();
        let mut parts = parts_with_headers(&[("x-staff-id", &staff_id.to_string())]);

        let result = StaffContext::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_staff_context_rejects_missing_staff_header() {
        let tenant_id = Uuid::new_v4();
        let mut parts = parts_with_headers(&[("x-tenant-id", &tenant_id.to_string())]);

        let result = StaffContext::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_staff_context_rejects_malformed_uuid() {
        let mut parts = parts_with_headers(&[
            ("x-tenant-id", "not-a-uuid"),
            ("x-staff-id", &Uuid::new_v4().to_string()),
        ]);

        let result = StaffContext::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_client_context_accepts_valid_header() {
        let client_id = Uuid::new_v4();
        let mut parts = parts_with_headers(&[("x-client-id", &client_id.to_string())]);

        let result = ClientContext::from_request_parts(&mut parts, &()).await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap().client_id, client_id);
    }

    #[tokio::test]
    async fn test_client_context_rejects_missing_header() {
        let mut parts = parts_with_headers(&[]);

        let result = ClientContext::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }
}
