use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A billable service definition in a tenant clinic's catalog
///
/// `points_awarded` is credited to the client's loyalty account on each paid
/// occurrence. `free_after_threshold`, when set to N, makes every (N+1)th
/// occurrence of the service free for that client.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ServiceType {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[schema(example = "Large Bath")]
    pub name: String,
    #[schema(example = "Full bath and brush for large breeds")]
    pub description: Option<String>,
    #[schema(example = 450)]
    pub price: Decimal,
    #[schema(example = 8, minimum = 0)]
    pub points_awarded: i32,
    /// Paid occurrences before the next one is free; null disables the cycle
    #[schema(example = 4, minimum = 1)]
    pub free_after_threshold: Option<i32>,
    #[schema(example = true)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a service type
///
/// Used for POST /api/service-types requests; the tenant comes from the
/// caller's staff context, never from the body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateServiceType {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    #[schema(example = "Large Bath")]
    pub name: String,
    #[schema(example = "Full bath and brush for large breeds")]
    pub description: Option<String>,
    #[validate(custom = "crate::validation::validate_price")]
    #[schema(example = 450)]
    pub price: Decimal,
    #[validate(custom = "crate::validation::validate_points_awarded")]
    #[serde(default)]
    #[schema(example = 8, minimum = 0)]
    pub points_awarded: i32,
    #[validate(custom = "crate::validation::validate_threshold")]
    #[schema(example = 4, minimum = 1)]
    pub free_after_threshold: Option<i32>,
}

/// Request body for updating a service type
///
/// Used for PUT /api/service-types/{id} requests
/// All fields are optional to support partial updates
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateServiceType {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    #[schema(example = "Updated Name")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "crate::validation::validate_price")]
    #[schema(example = 500)]
    pub price: Option<Decimal>,
    #[validate(custom = "crate::validation::validate_points_awarded")]
    #[schema(example = 10, minimum = 0)]
    pub points_awarded: Option<i32>,
    #[validate(custom = "crate::validation::validate_threshold")]
    #[schema(example = 5, minimum = 1)]
    pub free_after_threshold: Option<i32>,
    #[schema(example = true)]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use validator::Validate;

    #[test]
    fn test_service_type_serialization() {
        let service_type = ServiceType {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Large Bath".to_string(),
            description: Some("Full bath and brush".to_string()),
            price: dec!(450.00),
            points_awarded: 8,
            free_after_threshold: Some(4),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&service_type).expect("Failed to serialize ServiceType");

        assert!(json.contains("\"name\":\"Large Bath\""));
        assert!(json.contains("\"price\":\"450.00\""));
        assert!(json.contains("\"points_awarded\":8"));
        assert!(json.contains("\"free_after_threshold\":4"));
        assert!(json.contains("\"is_active\":true"));
        assert!(json.contains("\"created_at\""));
    }

    #[test]
    fn test_create_service_type_deserialization_defaults() {
        // points_awarded and free_after_threshold may be omitted
        let json = r#"{
            "name": "Nail Trim",
            "price": "120.00"
        }"#;

        let request: CreateServiceType =
            serde_json::from_str(json).expect("Failed to deserialize CreateServiceType");

        assert_eq!(request.name, "Nail Trim");
        assert_eq!(request.price, dec!(120.00));
        assert_eq!(request.points_awarded, 0);
        assert_eq!(request.free_after_threshold, None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_service_type_rejects_empty_name() {
        let request = CreateServiceType {
            name: "".to_string(),
            description: None,
            price: dec!(100.00),
            points_awarded: 0,
            free_after_threshold: None,
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_service_type_rejects_negative_price() {
        let request = CreateServiceType {
            name: "Bath".to_string(),
            description: None,
            price: dec!(-1.00),
            points_awarded: 0,
            free_after_threshold: None,
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_service_type_rejects_zero_threshold() {
        let request = CreateServiceType {
            name: "Bath".to_string(),
            description: None,
            price: dec!(100.00),
            points_awarded: 5,
            free_after_threshold: Some(0),
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_service_type_partial_fields() {
        let json = r#"{
            "price": "500.00",
            "is_active": false
        }"#;

        let request: UpdateServiceType =
            serde_json::from_str(json).expect("Failed to deserialize UpdateServiceType");

        assert_eq!(request.price, Some(dec!(500.00)));
        assert_eq!(request.is_active, Some(false));
        assert_eq!(request.name, None);
        assert_eq!(request.points_awarded, None);
        assert_eq!(request.free_after_threshold, None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_service_type_empty() {
        let json = r#"{}"#;

        let request: UpdateServiceType =
            serde_json::from_str(json).expect("Failed to deserialize UpdateServiceType");

        assert_eq!(request.name, None);
        assert_eq!(request.price, None);
        assert!(request.validate().is_ok());
    }
}
