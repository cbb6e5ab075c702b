/// Ticket category endpoints
///
/// # Endpoints
///
/// - `GET    /v1/categories?active_only=true` - List categories by name
/// - `POST   /v1/categories` - Create (admin)
/// - `PUT    /v1/categories/:id` - Update (admin)
/// - `DELETE /v1/categories/:id` - Delete (admin); refused while tickets use it

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use helpdesk_shared::{
    auth::{authorization::require_role, middleware::AuthContext},
    models::{
        ticket::TicketType,
        ticket_category::{CreateTicketCategory, TicketCategory, UpdateTicketCategory},
        user::UserRole,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct ListCategoriesQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub description: Option<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default = "default_ticket_type")]
    pub ticket_type: TicketType,
}

/// Absent fields are left as they are; an empty description clears it
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub ticket_type: Option<TicketType>,
}

fn default_active() -> bool {
    true
}

fn default_ticket_type() -> TicketType {
    TicketType::Incident
}

fn blank_to_none(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub async fn list_categories(
    State(state): State<AppState>,
    _auth: AuthContext,
    Query(query): Query<ListCategoriesQuery>,
) -> ApiResult<Json<Vec<TicketCategory>>> {
    Ok(Json(TicketCategory::list(&state.db, query.active_only).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(mut req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<TicketCategory>)> {
    require_role(&auth, UserRole::Admin)?;
    req.name = req.name.trim().to_string();
    req.validate()?;

    let category = TicketCategory::create(
        &state.db,
        CreateTicketCategory {
            name: req.name,
            description: req.description.and_then(blank_to_none),
            is_active: req.is_active,
            ticket_type: req.ticket_type,
        },
    )
    .await?;

    tracing::info!(category_id = %category.id, name = %category.name, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(mut req): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<TicketCategory>> {
    require_role(&auth, UserRole::Admin)?;
    req.name = req.name.map(|n| n.trim().to_string());
    req.validate()?;

    let category = TicketCategory::update(
        &state.db,
        id,
        UpdateTicketCategory {
            name: req.name,
            description: req.description.map(blank_to_none),
            is_active: req.is_active,
            ticket_type: req.ticket_type,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&auth, UserRole::Admin)?;

    if !TicketCategory::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }

    tracing::info!(category_id = %id, "Category deleted");

    Ok(StatusCode::NO_CONTENT)
}
