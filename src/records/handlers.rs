// HTTP handlers for the service-record browsing surface

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::context::StaffContext;
use crate::query::{QueryValidator, RecordQueryParams, SQLQueryBuilder};
use crate::records::{
    CreateServiceRecordRequest, NewServiceRecord, Pagination, RecordError, RecordListResponse,
    ServiceRecordWithName, ServiceStats,
};

/// Query parameters for the stats endpoint
/// The date range is applied only when both bounds are present
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Handler for GET /api/service-records
/// Lists a tenant's service records with filters, sorting, and pagination
pub async fn get_service_records_handler(
    State(state): State<crate::AppState>,
    staff: StaffContext,
    Query(params): Query<RecordQueryParams>,
) -> Result<Json<RecordListResponse>, RecordError> {
    tracing::debug!(
        "Listing service records for tenant {} with {:?}",
        staff.tenant_id,
        params
    );

    let validated = QueryValidator::validate(params)
        .map_err(|e| RecordError::ValidationError(e.to_string()))?;

    let mut builder = SQLQueryBuilder::new(staff.tenant_id);

    if let Some(pet_id) = validated.pet_id {
        builder.add_pet_filter(pet_id);
    }
    if let Some(service_type_id) = validated.service_type_id {
        builder.add_service_type_filter(service_type_id);
    }
    builder.add_date_range(validated.start_date, validated.end_date);
    builder.set_sort(validated.sort_field, validated.sort_order);
    builder.set_pagination(validated.page, validated.limit);

    let (query_str, params) = builder.build();

    let mut query = sqlx::query_as::<_, ServiceRecordWithName>(&query_str);
    for param in params {
        query = query.bind(param);
    }

    let records = query.fetch_all(&state.db).await?;

    let total = state.records_repo.count_for_tenant(staff.tenant_id).await?;
    let limit = validated.limit as i64;
    let pages = (total + limit - 1) / limit;

    tracing::debug!("Query returned {} service records", records.len());

    Ok(Json(RecordListResponse {
        data: records,
        pagination: Pagination {
            page: validated.page,
            limit: validated.limit,
            total,
            pages,
        },
    }))
}

/// Handler for POST /api/service-records
/// Creates a record manually, without loyalty processing
pub async fn create_service_record_handler(
    State(state): State<crate::AppState>,
    staff: StaffContext,
    Json(request): Json<CreateServiceRecordRequest>,
) -> Result<(StatusCode, Json<ServiceRecordWithName>), RecordError> {
    request
        .validate()
        .map_err(|e| RecordError::ValidationError(e.to_string()))?;

    // The service type must belong to the calling tenant
    let service_type = state
        .catalog_repo
        .find_for_tenant(request.service_type_id, staff.tenant_id)
        .await?
        .ok_or(RecordError::ServiceTypeNotFound)?;

    let new_record = NewServiceRecord {
        pet_id: request.pet_id,
        tenant_id: staff.tenant_id,
        service_type_id: service_type.id,
        staff_id: Some(staff.staff_id),
        service_date: request.service_date.unwrap_or_else(Utc::now),
        price: request.price.unwrap_or(service_type.price),
        notes: request.notes,
        is_free: request.is_free,
    };

    let mut tx = state.db.begin().await?;
    let record = state.records_repo.insert(&mut tx, &new_record).await?;
    tx.commit().await?;

    let record = state
        .records_repo
        .find_with_name(record.id)
        .await?
        .ok_or(RecordError::NotFound)?;

    tracing::info!(
        "Manually recorded {} for pet {}",
        record.service_name,
        record.pet_id
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// Handler for GET /api/service-records/stats
/// Aggregates per type, per day, and overall for the tenant dashboard
pub async fn get_service_stats_handler(
    State(state): State<crate::AppState>,
    staff: StaffContext,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ServiceStats>, RecordError> {
    let range = parse_range(&query)?;

    let by_type = state.records_repo.stats_by_type(staff.tenant_id, range).await?;
    let daily = state.records_repo.stats_daily(staff.tenant_id, range).await?;
    let totals = state.records_repo.stats_totals(staff.tenant_id, range).await?;

    Ok(Json(ServiceStats {
        by_type,
        daily,
        totals,
    }))
}

/// Parse the stats date range, requiring both bounds to filter
fn parse_range(query: &StatsQuery) -> Result<Option<(NaiveDate, NaiveDate)>, RecordError> {
    let (start_raw, end_raw) = match (&query.start_date, &query.end_date) {
        (Some(start), Some(end)) => (start, end),
        _ => return Ok(None),
    };

    let start = NaiveDate::parse_from_str(start_raw, "%Y-%m-%d").map_err(|_| {
        RecordError::ValidationError("start_date must be a date in YYYY-MM-DD format".to_string())
    })?;
    let end = NaiveDate::parse_from_str(end_raw, "%Y-%m-%d").map_err(|_| {
        RecordError::ValidationError("end_date must be a date in YYYY-MM-DD format".to_string())
    })?;

    if start > end {
        return Err(RecordError::ValidationError(
            "start_date cannot be after end_date".to_string(),
        ));
    }

    Ok(Some((start, end)))
}
