// HTTP handlers for loyalty endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::context::{ClientContext, StaffContext};
use crate::loyalty::{
    AccountSummary, AdjustPointsRequest, CardSummary, LoyaltyAccount, LoyaltyError,
    ProcessServiceRequest, ServiceOutcome,
};

/// Handler for POST /api/loyalty/process-service
/// Runs a performed service through the loyalty cycle
pub async fn process_service_handler(
    State(state): State<crate::AppState>,
    staff: StaffContext,
    Json(request): Json<ProcessServiceRequest>,
) -> Result<Json<ServiceOutcome>, LoyaltyError> {
    request
        .validate()
        .map_err(|e| LoyaltyError::ValidationError(e.to_string()))?;

    let outcome = state
        .loyalty_service
        .process_service(staff.tenant_id, staff.staff_id, request)
        .await?;

    Ok(Json(outcome))
}

/// Handler for POST /api/loyalty/points
/// Manually credits points to a client's account
pub async fn add_points_handler(
    State(state): State<crate::AppState>,
    staff: StaffContext,
    Json(request): Json<AdjustPointsRequest>,
) -> Result<Json<LoyaltyAccount>, LoyaltyError> {
    request
        .validate()
        .map_err(|e| LoyaltyError::ValidationError(e.to_string()))?;

    let account = state
        .loyalty_service
        .add_points(staff.tenant_id, request)
        .await?;

    Ok(Json(account))
}

/// Handler for POST /api/loyalty/redeem
/// Manually deducts points from a client's account
pub async fn redeem_points_handler(
    State(state): State<crate::AppState>,
    staff: StaffContext,
    Json(request): Json<AdjustPointsRequest>,
) -> Result<Json<LoyaltyAccount>, LoyaltyError> {
    request
        .validate()
        .map_err(|e| LoyaltyError::ValidationError(e.to_string()))?;

    let account = state
        .loyalty_service
        .redeem_points(staff.tenant_id, request)
        .await?;

    Ok(Json(account))
}

/// Handler for GET /api/loyalty/clients/{client_id}
/// Staff view of a client's card, counters, and recent transactions
pub async fn get_client_card_handler(
    State(state): State<crate::AppState>,
    staff: StaffContext,
    Path(client_id): Path<Uuid>,
) -> Result<Json<AccountSummary>, LoyaltyError> {
    let summary = state
        .loyalty_service
        .staff_client_summary(staff.tenant_id, client_id)
        .await?;

    Ok(Json(summary))
}

/// Handler for GET /api/loyalty/my-cards
/// All of the calling client's cards across clinics
pub async fn my_cards_handler(
    State(state): State<crate::AppState>,
    client: ClientContext,
) -> Result<Json<Vec<CardSummary>>, LoyaltyError> {
    let cards = state.loyalty_service.client_cards(client.client_id).await?;

    Ok(Json(cards))
}

/// Handler for GET /api/loyalty/my-cards/{tenant_id}
/// The calling client's card at one clinic
pub async fn my_card_handler(
    State(state): State<crate::AppState>,
    client: ClientContext,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<AccountSummary>, LoyaltyError> {
    let summary = state
        .loyalty_service
        .client_card(client.client_id, tenant_id)
        .await?;

    Ok(Json(summary))
}
