use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// One performed service instance
///
/// `price` is the amount actually charged: 0 when the loyalty cycle made
/// the visit free.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceRecord {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub tenant_id: Uuid,
    pub service_type_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub service_date: DateTime<Utc>,
    pub price: Decimal,
    pub notes: Option<String>,
    pub is_free: bool,
    pub created_at: DateTime<Utc>,
}

/// Record row joined with its service name for listings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServiceRecordWithName {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub tenant_id: Uuid,
    pub service_type_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub service_date: DateTime<Utc>,
    pub price: Decimal,
    pub notes: Option<String>,
    pub is_free: bool,
    pub created_at: DateTime<Utc>,
    pub service_name: String,
}

/// Fields for inserting a new service record
#[derive(Debug, Clone)]
pub struct NewServiceRecord {
    pub pet_id: Uuid,
    pub tenant_id: Uuid,
    pub service_type_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub service_date: DateTime<Utc>,
    pub price: Decimal,
    pub notes: Option<String>,
    pub is_free: bool,
}

/// Request DTO for creating a record manually, bypassing loyalty processing
#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceRecordRequest {
    pub pet_id: Uuid,
    pub service_type_id: Uuid,
    /// Defaults to now when omitted
    pub service_date: Option<DateTime<Utc>>,
    /// Defaults to the catalog price when omitted
    #[validate(custom = "crate::validation::validate_price")]
    pub price: Option<Decimal>,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_free: bool,
}

/// Pagination metadata for record listings
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

/// Response DTO for the record listing
#[derive(Debug, Serialize)]
pub struct RecordListResponse {
    pub data: Vec<ServiceRecordWithName>,
    pub pagination: Pagination,
}

/// Per-service-type aggregate for the stats endpoint
#[derive(Debug, Serialize, FromRow)]
pub struct ServiceTypeStats {
    pub name: String,
    pub count: i64,
    pub total_revenue: Decimal,
    pub free_count: i64,
}

/// Per-day aggregate for the stats endpoint
#[derive(Debug, Serialize, FromRow)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub count: i64,
    pub revenue: Decimal,
}

/// Overall totals for the stats endpoint
#[derive(Debug, Serialize, FromRow)]
pub struct StatsTotals {
    pub total_services: i64,
    pub total_revenue: Decimal,
    pub free_services: i64,
}

/// Response DTO for GET /api/service-records/stats
#[derive(Debug, Serialize)]
pub struct ServiceStats {
    pub by_type: Vec<ServiceTypeStats>,
    pub daily: Vec<DailyStats>,
    pub totals: StatsTotals,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use validator::Validate;

    #[test]
    fn test_service_record_serialization() {
        let record = ServiceRecord {
            id: Uuid::new_v4(),
            pet_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            service_type_id: Uuid::new_v4(),
            staff_id: Some(Uuid::new_v4()),
            service_date: Utc::now(),
            price: dec!(0.00),
            notes: None,
            is_free: true,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&record).unwrap();

        assert!(json.contains("\"is_free\":true"));
        assert!(json.contains("\"price\":\"0.00\""));
    }

    #[test]
    fn test_create_request_defaults() {
        let json = format!(
            r#"{{"pet_id": "{}", "service_type_id": "{}"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        );

        let request: CreateServiceRecordRequest = serde_json::from_str(&json).unwrap();

        assert_eq!(request.service_date, None);
        assert_eq!(request.price, None);
        assert!(!request.is_free);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_negative_price() {
        let request = CreateServiceRecordRequest {
            pet_id: Uuid::new_v4(),
            service_type_id: Uuid::new_v4(),
            service_date: None,
            price: Some(dec!(-10.00)),
            notes: None,
            is_free: false,
        };

        assert!(request.validate().is_err());
    }
}
