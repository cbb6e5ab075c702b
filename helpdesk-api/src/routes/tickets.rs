/// Ticket endpoints
///
/// # Endpoints
///
/// - `GET   /v1/tickets` - List with filters and search
/// - `POST  /v1/tickets` - File a ticket
/// - `GET   /v1/tickets/:id` - Detail with comments and assignment history
/// - `PATCH /v1/tickets/:id/status` - Change status
/// - `POST  /v1/tickets/:id/comments` - Add a comment
/// - `POST  /v1/tickets/:id/assign` - Assign to a technician (technician+)
/// - `POST  /v1/tickets/:id/unassign` - Clear the assignee (technician+)
///
/// Plain users only ever see and act on tickets they requested.

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
    auth::{
        authorization::{require_owner_or_role, require_role},
        middleware::AuthContext,
    },
    models::{
        assignment::{AssignmentRecord, AssignmentTarget, NewAssignment},
        ticket::{
            CreateTicket, StatusChange, Ticket, TicketDetail, TicketFilter, TicketPriority,
            TicketStatus, TicketSummary, TicketType,
        },
        ticket_category::TicketCategory,
        ticket_comment::{normalize_content, TicketComment},
        user::{User, UserRole},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[serde(rename = "type")]
    pub ticket_type: TicketType,

    pub priority: TicketPriority,
    pub category_id: Uuid,

    /// Filing on someone else's behalf needs technician or above
    pub requestor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub user_id: Uuid,
    pub notes: Option<String>,
}

async fn load_ticket(state: &AppState, id: Uuid) -> ApiResult<Ticket> {
    Ticket::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))
}

pub async fn list_tickets(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(mut filter): Query<TicketFilter>,
) -> ApiResult<Json<Vec<TicketSummary>>> {
    if !auth.is_staff() {
        filter.requestor_id = Some(auth.user_id);
    }

    Ok(Json(Ticket::list(&state.db, &filter).await?))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(mut req): Json<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    req.title = req.title.trim().to_string();
    req.description = req.description.trim().to_string();
    req.validate()?;

    let requestor_id = match req.requestor_id {
        Some(id) if id != auth.user_id => {
            require_role(&auth, UserRole::Technician)?;
            if User::find_by_id(&state.db, id).await?.is_none() {
                return Err(ApiError::NotFound("User not found".to_string()));
            }
            id
        }
        _ => auth.user_id,
    };

    let category = TicketCategory::find_by_id(&state.db, req.category_id)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| ApiError::BadRequest("Invalid category".to_string()))?;

    let ticket = Ticket::create(
        &state.db,
        CreateTicket {
            title: req.title,
            description: req.description,
            ticket_type: req.ticket_type,
            priority: req.priority,
            category_id: category.id,
            requestor_id,
            created_by: auth.user_id,
        },
    )
    .await?;

    tracing::info!(
        ticket_id = %ticket.id,
        requestor_id = %requestor_id,
        priority = %ticket.priority,
        "Ticket created"
    );

    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TicketDetail>> {
    let detail = Ticket::detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    require_owner_or_role(&auth, detail.ticket.requestor_id, UserRole::Technician)?;

    Ok(Json(detail))
}

/// Any different status is allowed; the current one is rejected
pub async fn change_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<Ticket>> {
    let ticket = load_ticket(&state, id).await?;
    require_owner_or_role(&auth, ticket.requestor_id, UserRole::Technician)?;

    match Ticket::change_status(&state.db, id, req.status, auth.user_id).await? {
        StatusChange::Changed(updated) => {
            tracing::info!(
                ticket_id = %id,
                from = %ticket.status,
                to = %updated.status,
                "Ticket status changed"
            );
            Ok(Json(updated))
        }
        StatusChange::Unchanged => Err(ApiError::BadRequest(format!(
            "Ticket is already {}",
            req.status.label()
        ))),
        StatusChange::NotFound => Err(ApiError::NotFound("Ticket not found".to_string())),
    }
}

pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<TicketComment>)> {
    let content = normalize_content(&req.content)
        .ok_or_else(|| ApiError::BadRequest("Comment cannot be empty".to_string()))?;

    let ticket = load_ticket(&state, id).await?;
    require_owner_or_role(&auth, ticket.requestor_id, UserRole::Technician)?;

    let comment = TicketComment::create(&state.db, id, auth.user_id, content).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn assign_ticket(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<AssignmentRecord>> {
    require_role(&auth, UserRole::Technician)?;

    let record = AssignmentTarget::Ticket
        .reassign(
            &state.db,
            id,
            NewAssignment {
                user_id: req.user_id,
                assigned_by: auth.user_id,
                notes: req.notes.filter(|n| !n.trim().is_empty()),
            },
        )
        .await?;

    tracing::info!(ticket_id = %id, assignee = %req.user_id, "Ticket assigned");

    Ok(Json(record))
}

pub async fn unassign_ticket(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&auth, UserRole::Technician)?;

    let was_assigned = AssignmentTarget::Ticket.unassign(&state.db, id).await?;
    tracing::info!(ticket_id = %id, was_assigned, "Ticket unassigned");

    Ok(StatusCode::NO_CONTENT)
}
