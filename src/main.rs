mod context;
mod db;
mod error;
mod loyalty;
mod models;
mod query;
mod records;
mod validation;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;
use validator::Validate;

use context::StaffContext;
use error::ApiError;
use loyalty::handlers::{
    add_points_handler, get_client_card_handler, my_card_handler, my_cards_handler,
    process_service_handler, redeem_points_handler,
};
use loyalty::{
    AccountsRepository, CatalogRepository, CountersRepository, LedgerRepository, LoyaltyService,
};
use models::{CreateServiceType, ServiceType, UpdateServiceType};
use records::handlers::{
    create_service_record_handler, get_service_records_handler, get_service_stats_handler,
};
use records::RecordsRepository;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        create_service_type,
        get_service_types,
        get_service_type_by_id,
        update_service_type,
        delete_service_type,
    ),
    components(
        schemas(ServiceType, CreateServiceType, UpdateServiceType)
    ),
    tags(
        (name = "service-types", description = "Tenant service catalog management endpoints")
    ),
    info(
        title = "VetCare API",
        version = "1.0.0",
        description = "RESTful API for multi-tenant veterinary practice management",
        contact(
            name = "API Support",
            email = "support@vetcareapi.com"
        )
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    db: PgPool,
    loyalty_service: LoyaltyService,
    records_repo: RecordsRepository,
    catalog_repo: CatalogRepository,
}

/// Handler for POST /api/service-types
/// Creates a new service type in the calling tenant's catalog
#[utoipa::path(
    post,
    path = "/api/service-types",
    request_body = CreateServiceType,
    responses(
        (status = 201, description = "Service type created successfully", body = ServiceType),
        (status = 400, description = "Invalid input data"),
        (status = 401, description = "Missing or invalid staff identity"),
        (status = 409, description = "Duplicate service type name"),
        (status = 500, description = "Internal server error")
    ),
    tag = "service-types"
)]
async fn create_service_type(
    State(state): State<AppState>,
    staff: StaffContext,
    Json(payload): Json<CreateServiceType>,
) -> Result<(StatusCode, Json<ServiceType>), ApiError> {
    tracing::debug!("Creating new service type: {}", payload.name);

    // Validate the request using validator crate
    payload.validate()?;

    // Check for duplicate service type name within the tenant
    if db::check_duplicate_service_type(&state.db, staff.tenant_id, &payload.name).await? {
        tracing::warn!("Attempt to create duplicate service type: {}", payload.name);
        return Err(ApiError::Conflict {
            message: format!("Service type with name '{}' already exists", payload.name),
        });
    }

    let service_type = sqlx::query_as::<_, ServiceType>(
        r#"
        INSERT INTO service_types (id, tenant_id, name, description, price, points_awarded, free_after_threshold)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, tenant_id, name, description, price, points_awarded, free_after_threshold, is_active, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(staff.tenant_id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(payload.points_awarded)
    .bind(payload.free_after_threshold)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Successfully created service type with id: {}", service_type.id);
    Ok((StatusCode::CREATED, Json(service_type)))
}

/// Handler for GET /api/service-types
/// Retrieves the calling tenant's service catalog
#[utoipa::path(
    get,
    path = "/api/service-types",
    responses(
        (status = 200, description = "List of the tenant's service types", body = Vec<ServiceType>),
        (status = 401, description = "Missing or invalid staff identity"),
        (status = 500, description = "Internal server error")
    ),
    tag = "service-types"
)]
async fn get_service_types(
    State(state): State<AppState>,
    staff: StaffContext,
) -> Result<Json<Vec<ServiceType>>, ApiError> {
    tracing::debug!("Fetching service types for tenant {}", staff.tenant_id);

    let service_types = sqlx::query_as::<_, ServiceType>(
        r#"
        SELECT id, tenant_id, name, description, price, points_awarded, free_after_threshold, is_active, created_at, updated_at
        FROM service_types
        WHERE tenant_id = $1
        ORDER BY name
        "#,
    )
    .bind(staff.tenant_id)
    .fetch_all(&state.db)
    .await?;

    tracing::debug!("Retrieved {} service types", service_types.len());
    Ok(Json(service_types))
}

/// Handler for GET /api/service-types/:id
/// Retrieves a specific service type by ID
#[utoipa::path(
    get,
    path = "/api/service-types/{id}",
    params(
        ("id" = Uuid, Path, description = "Service type ID")
    ),
    responses(
        (status = 200, description = "Service type found", body = ServiceType),
        (status = 401, description = "Missing or invalid staff identity"),
        (status = 404, description = "Service type not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "service-types"
)]
async fn get_service_type_by_id(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceType>, ApiError> {
    tracing::debug!("Fetching service type with id: {}", id);

    let service_type = state
        .catalog_repo
        .find_for_tenant(id, staff.tenant_id)
        .await?
        .ok_or_else(|| {
            tracing::debug!("Service type with id {} not found", id);
            ApiError::NotFound {
                resource: "ServiceType".to_string(),
                id: id.to_string(),
            }
        })?;

    tracing::debug!("Successfully retrieved service type: {}", service_type.name);
    Ok(Json(service_type))
}

/// Handler for PUT /api/service-types/:id
/// Updates an existing service type
#[utoipa::path(
    put,
    path = "/api/service-types/{id}",
    params(
        ("id" = Uuid, Path, description = "Service type ID")
    ),
    request_body = UpdateServiceType,
    responses(
        (status = 200, description = "Service type updated successfully", body = ServiceType),
        (status = 400, description = "Invalid input data"),
        (status = 401, description = "Missing or invalid staff identity"),
        (status = 404, description = "Service type not found"),
        (status = 409, description = "Duplicate service type name"),
        (status = 500, description = "Internal server error")
    ),
    tag = "service-types"
)]
async fn update_service_type(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServiceType>,
) -> Result<Json<ServiceType>, ApiError> {
    tracing::debug!("Updating service type with id: {}", id);

    // Validate the request using validator crate
    payload.validate()?;

    // Use a transaction so the existence check, duplicate check, and update
    // either all apply or roll back together
    let mut tx = state.db.begin().await?;

    let existing = sqlx::query_as::<_, ServiceType>(
        r#"
        SELECT id, tenant_id, name, description, price, points_awarded, free_after_threshold, is_active, created_at, updated_at
        FROM service_types
        WHERE id = $1 AND tenant_id = $2
        "#,
    )
    .bind(id)
    .bind(staff.tenant_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| {
        tracing::debug!("Service type with id {} not found for update", id);
        ApiError::NotFound {
            resource: "ServiceType".to_string(),
            id: id.to_string(),
        }
    })?;

    // If the name changes, it must stay unique within the tenant
    if let Some(ref new_name) = payload.name {
        if new_name != &existing.name {
            let duplicate_exists: Option<bool> = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM service_types WHERE tenant_id = $1 AND name = $2 AND id != $3)",
            )
            .bind(staff.tenant_id)
            .bind(new_name)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            if duplicate_exists.unwrap_or(false) {
                tracing::warn!(
                    "Attempt to update service type {} to duplicate name: {}",
                    id,
                    new_name
                );
                return Err(ApiError::Conflict {
                    message: format!("Service type with name '{}' already exists", new_name),
                });
            }
        }
    }

    // Update with provided fields, keeping existing values for omitted fields
    let updated = sqlx::query_as::<_, ServiceType>(
        r#"
        UPDATE service_types
        SET name = $1,
            description = $2,
            price = $3,
            points_awarded = $4,
            free_after_threshold = $5,
            is_active = $6,
            updated_at = NOW()
        WHERE id = $7
        RETURNING id, tenant_id, name, description, price, points_awarded, free_after_threshold, is_active, created_at, updated_at
        "#,
    )
    .bind(payload.name.unwrap_or(existing.name))
    .bind(payload.description.or(existing.description))
    .bind(payload.price.unwrap_or(existing.price))
    .bind(payload.points_awarded.unwrap_or(existing.points_awarded))
    .bind(payload.free_after_threshold.or(existing.free_after_threshold))
    .bind(payload.is_active.unwrap_or(existing.is_active))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Successfully updated service type with id: {}", id);
    Ok(Json(updated))
}

/// Handler for DELETE /api/service-types/:id
/// Deletes a service type from the tenant's catalog
#[utoipa::path(
    delete,
    path = "/api/service-types/{id}",
    params(
        ("id" = Uuid, Path, description = "Service type ID")
    ),
    responses(
        (status = 204, description = "Service type deleted successfully"),
        (status = 401, description = "Missing or invalid staff identity"),
        (status = 404, description = "Service type not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "service-types"
)]
async fn delete_service_type(
    State(state): State<AppState>,
    staff: StaffContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!("Deleting service type with id: {}", id);

    let result = sqlx::query("DELETE FROM service_types WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(staff.tenant_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        tracing::debug!("Service type with id {} not found for deletion", id);
        return Err(ApiError::NotFound {
            resource: "ServiceType".to_string(),
            id: id.to_string(),
        });
    }

    tracing::info!("Successfully deleted service type with id: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
fn create_router(db: PgPool) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let accounts = AccountsRepository::new(db.clone());
    let counters = CountersRepository::new(db.clone());
    let ledger = LedgerRepository::new(db.clone());
    let catalog_repo = CatalogRepository::new(db.clone());
    let records_repo = RecordsRepository::new(db.clone());

    let loyalty_service = LoyaltyService::new(
        db.clone(),
        accounts,
        counters,
        ledger,
        catalog_repo.clone(),
        records_repo.clone(),
    );

    let state = AppState {
        db,
        loyalty_service,
        records_repo,
        catalog_repo,
    };

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Service catalog management (staff)
        .route("/api/service-types", post(create_service_type))
        .route("/api/service-types", get(get_service_types))
        .route("/api/service-types/:id", get(get_service_type_by_id))
        .route("/api/service-types/:id", put(update_service_type))
        .route("/api/service-types/:id", delete(delete_service_type))
        // Loyalty ledger (staff)
        .route("/api/loyalty/process-service", post(process_service_handler))
        .route("/api/loyalty/points", post(add_points_handler))
        .route("/api/loyalty/redeem", post(redeem_points_handler))
        .route("/api/loyalty/clients/:client_id", get(get_client_card_handler))
        // Loyalty cards (client)
        .route("/api/loyalty/my-cards", get(my_cards_handler))
        .route("/api/loyalty/my-cards/:tenant_id", get(my_card_handler))
        // Service records (staff)
        .route("/api/service-records", get(get_service_records_handler))
        .route("/api/service-records", post(create_service_record_handler))
        .route("/api/service-records/stats", get(get_service_stats_handler))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    // This enables the error!, warn!, info!, debug!, and trace! macros
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("VetCare API - Starting...");

    // Get configuration from environment variables
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST")
        .unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string());

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // Create the application router
    let app = create_router(db_pool);

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("VetCare API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
