/// Computer inventory endpoints
///
/// # Endpoints
///
/// - `GET   /v1/computers` - List with filters and search
/// - `POST  /v1/computers` - Register a computer (technician+)
/// - `GET   /v1/computers/:id` - Detail with history, maintenance, software
/// - `PATCH /v1/computers/:id/status` - Change status (technician+)
/// - `POST  /v1/computers/:id/assign` - Assign to a user (technician+)
/// - `POST  /v1/computers/:id/unassign` - Clear the assignee (technician+)
/// - `POST  /v1/computers/:id/maintenance` - Log maintenance (technician+)
/// - `POST  /v1/computers/:id/software` - Record installed software (technician+)
///
/// Plain users only see computers assigned to them.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use helpdesk_shared::{
    auth::{
        authorization::{require_owner_or_role, require_role},
        middleware::AuthContext,
    },
    models::{
        assignment::{AssignmentRecord, AssignmentTarget, NewAssignment},
        computer_asset::{
            ComputerAsset, ComputerDetail, ComputerFilter, ComputerStatus, ComputerSummary,
            ComputerType, CreateComputer,
        },
        computer_maintenance::{ComputerMaintenance, CreateMaintenance},
        computer_software::{ComputerSoftware, CreateSoftware},
        user::UserRole,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateComputerRequest {
    #[validate(length(min = 1, max = 50, message = "Asset tag is required"))]
    pub asset_tag: String,

    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[serde(rename = "type")]
    pub computer_type: ComputerType,

    #[validate(length(min = 1, max = 100, message = "Manufacturer is required"))]
    pub manufacturer: String,

    #[validate(length(min = 1, max = 100, message = "Model is required"))]
    pub model: String,

    /// Defaults to active
    pub status: Option<ComputerStatus>,

    pub serial_number: Option<String>,
    pub location: Option<String>,
    pub department: Option<String>,

    /// Free-form JSON object
    pub specifications: Option<serde_json::Value>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ComputerStatus,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub user_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MaintenanceRequest {
    #[validate(length(min = 1, max = 100, message = "Maintenance type is required"))]
    pub maintenance_type: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    pub performed_at: Option<DateTime<Utc>>,

    #[validate(range(min = 0.0, message = "Cost cannot be negative"))]
    pub cost: Option<f64>,

    pub next_maintenance_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SoftwareRequest {
    #[validate(length(min = 1, max = 255, message = "Software name is required"))]
    pub software_name: String,

    pub version: Option<String>,
    pub license_key: Option<String>,
    pub installation_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn ensure_exists(state: &AppState, id: Uuid) -> ApiResult<ComputerAsset> {
    ComputerAsset::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Computer not found".to_string()))
}

pub async fn list_computers(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(mut filter): Query<ComputerFilter>,
) -> ApiResult<Json<Vec<ComputerSummary>>> {
    if !auth.is_staff() {
        filter.assigned_to = Some(auth.user_id);
    }

    Ok(Json(ComputerAsset::list(&state.db, &filter).await?))
}

pub async fn create_computer(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(mut req): Json<CreateComputerRequest>,
) -> ApiResult<(StatusCode, Json<ComputerAsset>)> {
    require_role(&auth, UserRole::Technician)?;

    for field in [
        &mut req.asset_tag,
        &mut req.name,
        &mut req.manufacturer,
        &mut req.model,
    ] {
        *field = field.trim().to_string();
    }
    req.validate()?;

    if let Some(specs) = &req.specifications {
        if !specs.is_object() {
            return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
                "specifications",
                "Specifications must be a JSON object",
            )]));
        }
    }

    let computer = ComputerAsset::create(
        &state.db,
        CreateComputer {
            asset_tag: req.asset_tag,
            serial_number: trimmed(req.serial_number),
            name: req.name,
            computer_type: req.computer_type,
            manufacturer: req.manufacturer,
            model: req.model,
            status: req.status.unwrap_or(ComputerStatus::Active),
            location: trimmed(req.location),
            department: trimmed(req.department),
            specifications: req.specifications,
            notes: trimmed(req.notes),
        },
    )
    .await?;

    tracing::info!(computer_id = %computer.id, asset_tag = %computer.asset_tag, "Computer created");

    Ok((StatusCode::CREATED, Json(computer)))
}

pub async fn get_computer(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ComputerDetail>> {
    let detail = ComputerAsset::detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Computer not found".to_string()))?;

    match detail.computer.computer.assigned_to {
        Some(owner) => require_owner_or_role(&auth, owner, UserRole::Technician)?,
        None => require_role(&auth, UserRole::Technician)?,
    }

    Ok(Json(detail))
}

pub async fn change_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<ComputerAsset>> {
    require_role(&auth, UserRole::Technician)?;

    let computer = ComputerAsset::change_status(&state.db, id, req.status, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Computer not found".to_string()))?;

    tracing::info!(computer_id = %id, status = %computer.status, "Computer status changed");

    Ok(Json(computer))
}

pub async fn assign_computer(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<AssignmentRecord>> {
    require_role(&auth, UserRole::Technician)?;

    let record = AssignmentTarget::Computer
        .reassign(
            &state.db,
            id,
            NewAssignment {
                user_id: req.user_id,
                assigned_by: auth.user_id,
                notes: trimmed(req.notes),
            },
        )
        .await?;

    tracing::info!(computer_id = %id, assignee = %req.user_id, "Computer assigned");

    Ok(Json(record))
}

pub async fn unassign_computer(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&auth, UserRole::Technician)?;

    let was_assigned = AssignmentTarget::Computer.unassign(&state.db, id).await?;
    tracing::info!(computer_id = %id, was_assigned, "Computer unassigned");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_maintenance(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<MaintenanceRequest>,
) -> ApiResult<(StatusCode, Json<ComputerMaintenance>)> {
    require_role(&auth, UserRole::Technician)?;
    req.validate()?;
    ensure_exists(&state, id).await?;

    let record = ComputerMaintenance::create(
        &state.db,
        CreateMaintenance {
            computer_id: id,
            maintenance_type: req.maintenance_type.trim().to_string(),
            description: req.description.trim().to_string(),
            performed_by: Some(auth.user_id),
            performed_at: req.performed_at,
            cost: req.cost,
            next_maintenance_date: req.next_maintenance_date,
            notes: trimmed(req.notes),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn add_software(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<SoftwareRequest>,
) -> ApiResult<(StatusCode, Json<ComputerSoftware>)> {
    require_role(&auth, UserRole::Technician)?;
    req.validate()?;
    ensure_exists(&state, id).await?;

    if let (Some(installed), Some(expires)) = (req.installation_date, req.expiry_date) {
        if expires < installed {
            return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
                "expiry_date",
                "Expiry date cannot be before the installation date",
            )]));
        }
    }

    let software = ComputerSoftware::create(
        &state.db,
        CreateSoftware {
            computer_id: id,
            software_name: req.software_name.trim().to_string(),
            version: trimmed(req.version),
            license_key: trimmed(req.license_key),
            installation_date: req.installation_date,
            expiry_date: req.expiry_date,
            status: trimmed(req.status),
            notes: trimmed(req.notes),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(software)))
}
